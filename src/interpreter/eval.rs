//==================================================
// File: interpreter/eval.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Expression evaluator
// Objective: Evaluate data as code: variable lookup, special forms, and
//            procedure application
//==================================================

use std::rc::Rc;

use super::errors::{EvalError, EvalResult};
use super::symbol::Symbol;
use super::value::{Env, Frame, Lambda, Procedure, Value};
use super::Interpreter;

//==================================================
// Section 1.0 - Dispatch
//==================================================

impl<C> Interpreter<C> {
    pub(crate) fn eval_in(&mut self, expr: &Value, env: &Env, ctx: &mut C) -> EvalResult {
        match expr {
            Value::Symbol(name) => self.lookup(name, env),
            Value::List(items) => {
                self.enter()?;
                let result = self.eval_list(items, env, ctx);
                self.leave();
                result
            }
            other => Ok(other.clone()),
        }
    }

    pub(crate) fn eval_body(&mut self, body: &[Value], env: &Env, ctx: &mut C) -> EvalResult {
        let mut result = Value::Unspecified;
        for form in body {
            result = self.eval_in(form, env, ctx)?;
        }
        Ok(result)
    }

    fn lookup(&self, name: &Symbol, env: &Env) -> EvalResult {
        if let Some(frame) = env {
            if let Some(value) = frame.lookup(name) {
                return Ok(value);
            }
        }
        self.globals
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| EvalError::Unbound(name.clone()))
    }

    fn eval_list(&mut self, items: &[Value], env: &Env, ctx: &mut C) -> EvalResult {
        let (head, args) = match items.split_first() {
            Some(split) => split,
            None => return Ok(Value::Null),
        };
        if let Value::Symbol(keyword) = head {
            match keyword.as_str() {
                "quote" => return expect_one("quote", args).cloned(),
                "if" => return self.eval_if(args, env, ctx),
                "define" => return self.eval_define(args, env, ctx),
                "set!" => return self.eval_set(args, env, ctx),
                "lambda" => return make_lambda(None, args, env),
                "let" => return self.eval_let(args, env, ctx, false),
                "let*" => return self.eval_let(args, env, ctx, true),
                "begin" => return self.eval_body(args, env, ctx),
                "and" => return self.eval_and(args, env, ctx),
                "or" => return self.eval_or(args, env, ctx),
                "when" => return self.eval_when(args, env, ctx, true),
                "unless" => return self.eval_when(args, env, ctx, false),
                "cond" => return self.eval_cond(args, env, ctx),
                _ => {}
            }
        }
        let procedure = self.eval_in(head, env, ctx)?;
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_in(arg, env, ctx)?);
        }
        self.apply(&procedure, values, ctx)
    }

    //==================================================
    // Section 2.0 - Special Forms
    //==================================================

    fn eval_if(&mut self, args: &[Value], env: &Env, ctx: &mut C) -> EvalResult {
        match args {
            [test, consequent] => {
                if self.eval_in(test, env, ctx)?.is_truthy() {
                    self.eval_in(consequent, env, ctx)
                } else {
                    Ok(Value::Unspecified)
                }
            }
            [test, consequent, alternative] => {
                if self.eval_in(test, env, ctx)?.is_truthy() {
                    self.eval_in(consequent, env, ctx)
                } else {
                    self.eval_in(alternative, env, ctx)
                }
            }
            _ => Err(malformed("if", args)),
        }
    }

    fn eval_define(&mut self, args: &[Value], env: &Env, ctx: &mut C) -> EvalResult {
        let (target, rest) = args
            .split_first()
            .ok_or_else(|| malformed("define", args))?;
        let (name, value) = match target {
            Value::Symbol(name) => {
                let value = match rest {
                    [] => Value::Unspecified,
                    [expr] => self.eval_in(expr, env, ctx)?,
                    _ => return Err(malformed("define", args)),
                };
                (name.clone(), value)
            }
            Value::List(signature) => {
                let Some(Value::Symbol(name)) = signature.first() else {
                    return Err(malformed("define", args));
                };
                let mut lambda_args = vec![Value::list(signature[1..].to_vec())];
                lambda_args.extend_from_slice(rest);
                let value = make_lambda(Some(name.clone()), &lambda_args, env)?;
                (name.clone(), value)
            }
            _ => return Err(malformed("define", args)),
        };
        match env {
            Some(frame) => frame.define(name.clone(), value),
            None => {
                self.globals.insert(name.clone(), value);
            }
        }
        Ok(Value::Symbol(name))
    }

    fn eval_set(&mut self, args: &[Value], env: &Env, ctx: &mut C) -> EvalResult {
        let [Value::Symbol(name), expr] = args else {
            return Err(malformed("set!", args));
        };
        let value = self.eval_in(expr, env, ctx)?;
        if let Some(frame) = env {
            if frame.assign(name, value.clone()) {
                return Ok(value);
            }
        }
        match self.globals.get_mut(name.as_str()) {
            Some(slot) => {
                *slot = value.clone();
                Ok(value)
            }
            None => Err(EvalError::Unbound(name.clone())),
        }
    }

    fn eval_let(&mut self, args: &[Value], env: &Env, ctx: &mut C, sequential: bool) -> EvalResult {
        let (bindings, body) = args.split_first().ok_or_else(|| malformed("let", args))?;
        let bindings = bindings.as_list().ok_or_else(|| malformed("let", args))?;
        let frame = Frame::new(env.clone());
        let inner: Env = Some(frame.clone());
        for binding in bindings {
            let Some([Value::Symbol(name), expr]) = binding.as_list() else {
                return Err(malformed("let", args));
            };
            let scope = if sequential { &inner } else { env };
            let value = self.eval_in(expr, scope, ctx)?;
            frame.define(name.clone(), value);
        }
        self.eval_body(body, &inner, ctx)
    }

    fn eval_and(&mut self, args: &[Value], env: &Env, ctx: &mut C) -> EvalResult {
        let mut result = Value::Boolean(true);
        for arg in args {
            result = self.eval_in(arg, env, ctx)?;
            if !result.is_truthy() {
                break;
            }
        }
        Ok(result)
    }

    fn eval_or(&mut self, args: &[Value], env: &Env, ctx: &mut C) -> EvalResult {
        for arg in args {
            let result = self.eval_in(arg, env, ctx)?;
            if result.is_truthy() {
                return Ok(result);
            }
        }
        Ok(Value::Boolean(false))
    }

    fn eval_when(&mut self, args: &[Value], env: &Env, ctx: &mut C, expect: bool) -> EvalResult {
        let (test, body) = args.split_first().ok_or_else(|| malformed("when", args))?;
        if self.eval_in(test, env, ctx)?.is_truthy() == expect {
            self.eval_body(body, env, ctx)
        } else {
            Ok(Value::Unspecified)
        }
    }

    fn eval_cond(&mut self, args: &[Value], env: &Env, ctx: &mut C) -> EvalResult {
        for clause in args {
            let Some((test, body)) = clause.as_list().and_then(|items| items.split_first()) else {
                return Err(malformed("cond", args));
            };
            let is_else = matches!(test, Value::Symbol(name) if name.as_str() == "else");
            let outcome = if is_else {
                Value::Boolean(true)
            } else {
                self.eval_in(test, env, ctx)?
            };
            if outcome.is_truthy() {
                if body.is_empty() {
                    return Ok(outcome);
                }
                return self.eval_body(body, env, ctx);
            }
        }
        Ok(Value::Unspecified)
    }
}

//==================================================
// Section 3.0 - Lambda construction
//==================================================

fn make_lambda(name: Option<Symbol>, args: &[Value], env: &Env) -> EvalResult {
    let (formals, body) = args.split_first().ok_or_else(|| malformed("lambda", args))?;
    if body.is_empty() {
        return Err(malformed("lambda", args));
    }
    let (params, rest) = parse_formals(formals).ok_or_else(|| malformed("lambda", args))?;
    Ok(Value::Procedure(Rc::new(Procedure::Lambda(Lambda {
        name,
        params,
        rest,
        body: Rc::from(body.to_vec()),
        env: env.clone(),
    }))))
}

/// `args`, `(a b)`, or `(a b . rest)`.
fn parse_formals(formals: &Value) -> Option<(Vec<Symbol>, Option<Symbol>)> {
    if let Value::Symbol(rest) = formals {
        return Some((Vec::new(), Some(rest.clone())));
    }
    let items = formals.as_list()?;
    let mut params = Vec::new();
    let mut iter = items.iter();
    while let Some(item) = iter.next() {
        let name = item.as_symbol()?;
        if name.as_str() == "." {
            let rest = iter.next()?.as_symbol()?.clone();
            if iter.next().is_some() {
                return None;
            }
            return Some((params, Some(rest)));
        }
        params.push(name.clone());
    }
    Some((params, None))
}

fn expect_one<'v>(form: &str, args: &'v [Value]) -> Result<&'v Value, EvalError> {
    match args {
        [only] => Ok(only),
        _ => Err(malformed(form, args)),
    }
}

fn malformed(form: &str, args: &[Value]) -> EvalError {
    let shown = Value::list(args.to_vec());
    EvalError::Syntax(format!("malformed {form}: {shown}"))
}


//==================================================
// End of file
//==================================================
