//==================================================
// File: interpreter/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Embedded Scheme interpreter
// Objective: Evaluate source text, call stored procedures, and host native
//            primitives that receive a caller-supplied context
//==================================================

mod builtins;
mod errors;
mod eval;
mod reader;
mod symbol;
mod value;

use std::collections::HashMap;
use std::rc::Rc;

pub use errors::{Arity, EvalError, EvalResult};
pub use reader::read_all;
pub use symbol::Symbol;
pub use value::{Env, Frame, Lambda, NativeId, Procedure, Value};

/// Deepest nesting of evaluations and calls before a script is stopped.
/// The reader and the printer stop at the same depth.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Signature of a native primitive. `C` is whatever the embedder threads
/// through evaluation; the bridge uses it for host access and the registry.
pub type NativeFn<C> = fn(&mut Interpreter<C>, &mut C, Vec<Value>) -> EvalResult;

struct Native<C> {
    name: Symbol,
    arity: Arity,
    func: NativeFn<C>,
}

//==================================================
// Section 1.0 - Interpreter
//==================================================

pub struct Interpreter<C> {
    globals: HashMap<Symbol, Value>,
    natives: Vec<Native<C>>,
    depth: usize,
}

impl<C> Default for Interpreter<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Interpreter<C> {
    /// An interpreter with the standard builtins installed.
    pub fn new() -> Self {
        let mut interpreter = Self {
            globals: HashMap::new(),
            natives: Vec::new(),
            depth: 0,
        };
        builtins::install(&mut interpreter);
        interpreter
    }

    /// Bind `name` in the global environment to a native primitive.
    pub fn register_native(&mut self, name: &str, arity: Arity, func: NativeFn<C>) {
        let id = self.natives.len();
        let name = Symbol::from(name);
        self.natives.push(Native {
            name: name.clone(),
            arity,
            func,
        });
        let procedure = Procedure::Native {
            id,
            name: name.clone(),
        };
        self.globals.insert(name, Value::Procedure(Rc::new(procedure)));
    }

    pub fn define_global(&mut self, name: &str, value: Value) {
        self.globals.insert(Symbol::from(name), value);
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    /// Read and evaluate every form in `source`, returning the last value.
    pub fn eval_source(&mut self, source: &str, ctx: &mut C) -> EvalResult {
        let forms = read_all(source)?;
        let mut result = Value::Unspecified;
        for form in &forms {
            result = self.eval(form, ctx)?;
        }
        Ok(result)
    }

    /// Evaluate one datum in the global environment.
    pub fn eval(&mut self, expr: &Value, ctx: &mut C) -> EvalResult {
        self.eval_in(expr, &None, ctx)
    }

    /// Call a procedure value with already-evaluated arguments.
    pub fn apply(&mut self, procedure: &Value, args: Vec<Value>, ctx: &mut C) -> EvalResult {
        self.enter()?;
        let result = self.apply_inner(procedure, args, ctx);
        self.leave();
        result
    }

    fn apply_inner(&mut self, procedure: &Value, args: Vec<Value>, ctx: &mut C) -> EvalResult {
        let Value::Procedure(procedure) = procedure else {
            return Err(EvalError::NotCallable(procedure.to_string()));
        };
        match procedure.as_ref() {
            Procedure::Native { id, .. } => {
                let (name, arity, func) = match self.natives.get(*id) {
                    Some(native) => (native.name.clone(), native.arity, native.func),
                    None => return Err(EvalError::NotCallable(procedure_label(procedure))),
                };
                if !arity.accepts(args.len()) {
                    return Err(EvalError::Arity {
                        name: name.into_string(),
                        expected: arity,
                        got: args.len(),
                    });
                }
                func(self, ctx, args)
            }
            Procedure::Lambda(lambda) => {
                let arity = match lambda.rest {
                    Some(_) => Arity::AtLeast(lambda.params.len()),
                    None => Arity::Exact(lambda.params.len()),
                };
                if !arity.accepts(args.len()) {
                    return Err(EvalError::Arity {
                        name: procedure_label(procedure),
                        expected: arity,
                        got: args.len(),
                    });
                }
                let frame = Frame::new(lambda.env.clone());
                let mut args = args.into_iter();
                for param in &lambda.params {
                    if let Some(arg) = args.next() {
                        frame.define(param.clone(), arg);
                    }
                }
                if let Some(rest) = &lambda.rest {
                    frame.define(rest.clone(), Value::list(args.collect()));
                }
                self.eval_body(&lambda.body, &Some(frame), ctx)
            }
        }
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        if self.depth >= DEFAULT_MAX_DEPTH {
            return Err(EvalError::StackOverflow(DEFAULT_MAX_DEPTH));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

fn procedure_label(procedure: &Procedure) -> String {
    procedure
        .name()
        .map(|name| name.to_string())
        .unwrap_or_else(|| "#<lambda>".to_string())
}


//==================================================
// End of file
//==================================================
