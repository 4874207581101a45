use std::cmp::Ordering;

use super::errors::{Arity, EvalError, EvalResult};
use super::symbol::Symbol;
use super::value::Value;
use super::Interpreter;

pub(super) fn install<C>(interp: &mut Interpreter<C>) {
    interp.register_native("+", Arity::AtLeast(0), builtin_add::<C>);
    interp.register_native("-", Arity::AtLeast(1), builtin_sub::<C>);
    interp.register_native("*", Arity::AtLeast(0), builtin_mul::<C>);
    interp.register_native("/", Arity::AtLeast(1), builtin_div::<C>);
    interp.register_native("modulo", Arity::Exact(2), builtin_modulo::<C>);
    interp.register_native("abs", Arity::Exact(1), builtin_abs::<C>);
    interp.register_native("min", Arity::AtLeast(1), builtin_min::<C>);
    interp.register_native("max", Arity::AtLeast(1), builtin_max::<C>);
    interp.register_native("floor", Arity::Exact(1), builtin_floor::<C>);
    interp.register_native("round", Arity::Exact(1), builtin_round::<C>);
    interp.register_native("=", Arity::AtLeast(1), builtin_num_eq::<C>);
    interp.register_native("<", Arity::AtLeast(1), builtin_lt::<C>);
    interp.register_native(">", Arity::AtLeast(1), builtin_gt::<C>);
    interp.register_native("<=", Arity::AtLeast(1), builtin_le::<C>);
    interp.register_native(">=", Arity::AtLeast(1), builtin_ge::<C>);
    interp.register_native("not", Arity::Exact(1), builtin_not::<C>);
    interp.register_native("eq?", Arity::Exact(2), builtin_eq::<C>);
    interp.register_native("equal?", Arity::Exact(2), builtin_equal::<C>);
    interp.register_native("list", Arity::AtLeast(0), builtin_list::<C>);
    interp.register_native("cons", Arity::Exact(2), builtin_cons::<C>);
    interp.register_native("car", Arity::Exact(1), builtin_car::<C>);
    interp.register_native("cdr", Arity::Exact(1), builtin_cdr::<C>);
    interp.register_native("length", Arity::Exact(1), builtin_length::<C>);
    interp.register_native("append", Arity::AtLeast(0), builtin_append::<C>);
    interp.register_native("reverse", Arity::Exact(1), builtin_reverse::<C>);
    interp.register_native("list-ref", Arity::Exact(2), builtin_list_ref::<C>);
    interp.register_native("null?", Arity::Exact(1), builtin_is_null::<C>);
    interp.register_native("list?", Arity::Exact(1), builtin_is_list::<C>);
    interp.register_native("pair?", Arity::Exact(1), builtin_is_pair::<C>);
    interp.register_native("number?", Arity::Exact(1), builtin_is_number::<C>);
    interp.register_native("integer?", Arity::Exact(1), builtin_is_integer::<C>);
    interp.register_native("string?", Arity::Exact(1), builtin_is_string::<C>);
    interp.register_native("symbol?", Arity::Exact(1), builtin_is_symbol::<C>);
    interp.register_native("boolean?", Arity::Exact(1), builtin_is_boolean::<C>);
    interp.register_native("procedure?", Arity::Exact(1), builtin_is_procedure::<C>);
    interp.register_native("string-append", Arity::AtLeast(0), builtin_string_append::<C>);
    interp.register_native("string-length", Arity::Exact(1), builtin_string_length::<C>);
    interp.register_native("number->string", Arity::Exact(1), builtin_number_to_string::<C>);
    interp.register_native("symbol->string", Arity::Exact(1), builtin_symbol_to_string::<C>);
    interp.register_native("string->symbol", Arity::Exact(1), builtin_string_to_symbol::<C>);
    interp.register_native("apply", Arity::AtLeast(2), builtin_apply::<C>);
    interp.register_native("map", Arity::AtLeast(2), builtin_map::<C>);
    interp.register_native("for-each", Arity::AtLeast(2), builtin_for_each::<C>);
    interp.register_native("error", Arity::AtLeast(1), builtin_error::<C>);
    interp.register_native("catch", Arity::Exact(3), builtin_catch::<C>);
}

//==================================================
// Section 1.0 - Numbers
//==================================================

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Real(f64),
}

impl Num {
    fn from_value(context: &str, value: &Value) -> Result<Num, EvalError> {
        match value {
            Value::Integer(n) => Ok(Num::Int(*n)),
            Value::Real(n) => Ok(Num::Real(*n)),
            other => Err(EvalError::wrong_type(context, "a number", other)),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Real(n) => n,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Num::Int(n) => Value::Integer(n),
            Num::Real(n) => Value::Real(n),
        }
    }

    fn compare(self, other: Num) -> Option<Ordering> {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

fn numbers(context: &str, args: &[Value]) -> Result<Vec<Num>, EvalError> {
    args.iter().map(|arg| Num::from_value(context, arg)).collect()
}

// Integer arithmetic falls back to reals on overflow.
fn combine(
    a: Num,
    b: Num,
    int_op: fn(i64, i64) -> Option<i64>,
    real_op: fn(f64, f64) -> f64,
) -> Num {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => match int_op(x, y) {
            Some(n) => Num::Int(n),
            None => Num::Real(real_op(x as f64, y as f64)),
        },
        (x, y) => Num::Real(real_op(x.as_f64(), y.as_f64())),
    }
}

fn divide(a: Num, b: Num) -> Result<Num, EvalError> {
    match (a, b) {
        (_, Num::Int(0)) => Err(EvalError::DivisionByZero),
        (_, Num::Real(y)) if y == 0.0 => Err(EvalError::DivisionByZero),
        (Num::Int(x), Num::Int(y)) if x.checked_rem(y) == Some(0) => Ok(Num::Int(x / y)),
        (x, y) => Ok(Num::Real(x.as_f64() / y.as_f64())),
    }
}

fn builtin_add<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    let sum = numbers("+", &args)?
        .into_iter()
        .fold(Num::Int(0), |acc, n| combine(acc, n, i64::checked_add, |a, b| a + b));
    Ok(sum.into_value())
}

fn builtin_sub<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    let nums = numbers("-", &args)?;
    let (first, rest) = match nums.split_first() {
        Some(split) => split,
        None => return Ok(Value::Integer(0)),
    };
    if rest.is_empty() {
        return Ok(combine(Num::Int(0), *first, i64::checked_sub, |a, b| a - b).into_value());
    }
    let difference = rest
        .iter()
        .fold(*first, |acc, n| combine(acc, *n, i64::checked_sub, |a, b| a - b));
    Ok(difference.into_value())
}

fn builtin_mul<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    let product = numbers("*", &args)?
        .into_iter()
        .fold(Num::Int(1), |acc, n| combine(acc, n, i64::checked_mul, |a, b| a * b));
    Ok(product.into_value())
}

fn builtin_div<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    let nums = numbers("/", &args)?;
    let (first, rest) = match nums.split_first() {
        Some(split) => split,
        None => return Ok(Value::Integer(1)),
    };
    if rest.is_empty() {
        return Ok(divide(Num::Int(1), *first)?.into_value());
    }
    let mut quotient = *first;
    for n in rest {
        quotient = divide(quotient, *n)?;
    }
    Ok(quotient.into_value())
}

fn builtin_modulo<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    let nums = numbers("modulo", &args)?;
    match (nums[0], nums[1]) {
        (_, Num::Int(0)) => Err(EvalError::DivisionByZero),
        (Num::Int(a), Num::Int(b)) => {
            let r = a.wrapping_rem(b);
            let r = if r != 0 && (r < 0) != (b < 0) { r + b } else { r };
            Ok(Value::Integer(r))
        }
        (a, b) => {
            let (a, b) = (a.as_f64(), b.as_f64());
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            let r = a % b;
            let r = if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r };
            Ok(Value::Real(r))
        }
    }
}

fn builtin_abs<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    match Num::from_value("abs", &args[0])? {
        Num::Int(n) => Ok(n
            .checked_abs()
            .map(Value::Integer)
            .unwrap_or(Value::Real((n as f64).abs()))),
        Num::Real(n) => Ok(Value::Real(n.abs())),
    }
}

fn extreme(context: &str, args: &[Value], wanted: Ordering) -> EvalResult {
    let nums = numbers(context, args)?;
    let mut best = nums[0];
    let mut inexact = matches!(best, Num::Real(_));
    for n in &nums[1..] {
        inexact |= matches!(n, Num::Real(_));
        if n.compare(best) == Some(wanted) {
            best = *n;
        }
    }
    if inexact {
        Ok(Value::Real(best.as_f64()))
    } else {
        Ok(best.into_value())
    }
}

fn builtin_min<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    extreme("min", &args, Ordering::Less)
}

fn builtin_max<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    extreme("max", &args, Ordering::Greater)
}

fn builtin_floor<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    match Num::from_value("floor", &args[0])? {
        Num::Int(n) => Ok(Value::Integer(n)),
        Num::Real(n) => Ok(Value::Real(n.floor())),
    }
}

fn builtin_round<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    match Num::from_value("round", &args[0])? {
        Num::Int(n) => Ok(Value::Integer(n)),
        Num::Real(n) => Ok(Value::Real(n.round_ties_even())),
    }
}

fn compare_chain(context: &str, args: &[Value], ok: fn(Ordering) -> bool) -> EvalResult {
    let nums = numbers(context, args)?;
    let holds = nums
        .windows(2)
        .all(|pair| pair[0].compare(pair[1]).is_some_and(ok));
    Ok(Value::Boolean(holds))
}

fn builtin_num_eq<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    compare_chain("=", &args, Ordering::is_eq)
}

fn builtin_lt<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    compare_chain("<", &args, Ordering::is_lt)
}

fn builtin_gt<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    compare_chain(">", &args, Ordering::is_gt)
}

fn builtin_le<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    compare_chain("<=", &args, Ordering::is_le)
}

fn builtin_ge<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    compare_chain(">=", &args, Ordering::is_ge)
}

//==================================================
// Section 2.0 - Equivalence and predicates
//==================================================

fn builtin_not<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    Ok(Value::Boolean(!args[0].is_truthy()))
}

fn builtin_eq<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    Ok(Value::Boolean(args[0].is_eq(&args[1])))
}

fn builtin_equal<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    Ok(Value::Boolean(args[0] == args[1]))
}

fn builtin_is_null<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    Ok(Value::Boolean(matches!(args[0], Value::Null)))
}

fn builtin_is_list<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    Ok(Value::Boolean(args[0].as_list().is_some()))
}

fn builtin_is_pair<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    Ok(Value::Boolean(matches!(args[0], Value::List(_))))
}

fn builtin_is_number<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    Ok(Value::Boolean(args[0].as_f64().is_some()))
}

fn builtin_is_integer<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    let integral = match args[0] {
        Value::Integer(_) => true,
        Value::Real(n) => n.is_finite() && n.fract() == 0.0,
        _ => false,
    };
    Ok(Value::Boolean(integral))
}

fn builtin_is_string<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    Ok(Value::Boolean(matches!(args[0], Value::Str(_))))
}

fn builtin_is_symbol<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    Ok(Value::Boolean(matches!(args[0], Value::Symbol(_))))
}

fn builtin_is_boolean<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    Ok(Value::Boolean(matches!(args[0], Value::Boolean(_))))
}

fn builtin_is_procedure<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    Ok(Value::Boolean(args[0].is_procedure()))
}

//==================================================
// Section 3.0 - Lists
//==================================================

fn list_arg<'v>(context: &str, value: &'v Value) -> Result<&'v [Value], EvalError> {
    value
        .as_list()
        .ok_or_else(|| EvalError::wrong_type(context, "a list", value))
}

fn builtin_list<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    Ok(Value::list(args))
}

fn builtin_cons<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    let tail = list_arg("cons", &args[1])?;
    let mut items = Vec::with_capacity(tail.len() + 1);
    items.push(args[0].clone());
    items.extend_from_slice(tail);
    Ok(Value::list(items))
}

fn builtin_car<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    match &args[0] {
        Value::List(items) => Ok(items[0].clone()),
        other => Err(EvalError::wrong_type("car", "a pair", other)),
    }
}

fn builtin_cdr<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    match &args[0] {
        Value::List(items) => Ok(Value::list(items[1..].to_vec())),
        other => Err(EvalError::wrong_type("cdr", "a pair", other)),
    }
}

fn builtin_length<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    Ok(Value::Integer(list_arg("length", &args[0])?.len() as i64))
}

fn builtin_append<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    let mut items = Vec::new();
    for arg in &args {
        items.extend_from_slice(list_arg("append", arg)?);
    }
    Ok(Value::list(items))
}

fn builtin_reverse<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    let mut items = list_arg("reverse", &args[0])?.to_vec();
    items.reverse();
    Ok(Value::list(items))
}

fn builtin_list_ref<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    let items = list_arg("list-ref", &args[0])?;
    let Value::Integer(index) = args[1] else {
        return Err(EvalError::wrong_type("list-ref", "an integer", &args[1]));
    };
    usize::try_from(index)
        .ok()
        .and_then(|index| items.get(index))
        .cloned()
        .ok_or_else(|| {
            EvalError::OutOfRange(format!(
                "list-ref: index {index} out of range for list of length {}",
                items.len()
            ))
        })
}

//==================================================
// Section 4.0 - Strings and symbols
//==================================================

fn builtin_string_append<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    let mut text = String::new();
    for arg in &args {
        match arg {
            Value::Str(part) => text.push_str(part),
            other => return Err(EvalError::wrong_type("string-append", "a string", other)),
        }
    }
    Ok(Value::string(&text))
}

fn builtin_string_length<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    match &args[0] {
        Value::Str(text) => Ok(Value::Integer(text.chars().count() as i64)),
        other => Err(EvalError::wrong_type("string-length", "a string", other)),
    }
}

fn builtin_number_to_string<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    let n = Num::from_value("number->string", &args[0])?;
    Ok(Value::string(&n.into_value().to_string()))
}

fn builtin_symbol_to_string<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    match &args[0] {
        Value::Symbol(symbol) => Ok(Value::string(symbol)),
        other => Err(EvalError::wrong_type("symbol->string", "a symbol", other)),
    }
}

fn builtin_string_to_symbol<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    match &args[0] {
        Value::Str(text) => Ok(Value::symbol(text)),
        other => Err(EvalError::wrong_type("string->symbol", "a string", other)),
    }
}

//==================================================
// Section 5.0 - Control
//==================================================

fn builtin_apply<C>(interp: &mut Interpreter<C>, ctx: &mut C, mut args: Vec<Value>) -> EvalResult {
    let procedure = args.remove(0);
    let last = args.pop().unwrap_or(Value::Null);
    args.extend_from_slice(list_arg("apply", &last)?);
    interp.apply(&procedure, args, ctx)
}

fn collect_columns(context: &str, lists: &[Value]) -> Result<Vec<Vec<Value>>, EvalError> {
    let lists = lists
        .iter()
        .map(|list| list_arg(context, list))
        .collect::<Result<Vec<_>, _>>()?;
    let shortest = lists.iter().map(|list| list.len()).min().unwrap_or(0);
    Ok((0..shortest)
        .map(|row| lists.iter().map(|list| list[row].clone()).collect())
        .collect())
}

fn builtin_map<C>(interp: &mut Interpreter<C>, ctx: &mut C, args: Vec<Value>) -> EvalResult {
    let mut results = Vec::new();
    for call_args in collect_columns("map", &args[1..])? {
        results.push(interp.apply(&args[0], call_args, ctx)?);
    }
    Ok(Value::list(results))
}

fn builtin_for_each<C>(interp: &mut Interpreter<C>, ctx: &mut C, args: Vec<Value>) -> EvalResult {
    for call_args in collect_columns("for-each", &args[1..])? {
        interp.apply(&args[0], call_args, ctx)?;
    }
    Ok(Value::Unspecified)
}

/// `(error 'tag "message" detail...)`. Without a leading symbol the tag is `error`.
fn builtin_error<C>(_: &mut Interpreter<C>, _: &mut C, args: Vec<Value>) -> EvalResult {
    let (tag, parts) = match args.split_first() {
        Some((Value::Symbol(tag), rest)) => (tag.clone(), rest),
        _ => (Symbol::from("error"), &args[..]),
    };
    let message = parts
        .iter()
        .map(Value::display_string)
        .collect::<Vec<_>>()
        .join(" ");
    Err(EvalError::Raised { tag, message })
}

/// `(catch tag thunk handler)`: `tag` of `#t` catches everything, otherwise
/// only errors whose tag is the same symbol. The handler receives the tag
/// and the message text.
fn builtin_catch<C>(interp: &mut Interpreter<C>, ctx: &mut C, args: Vec<Value>) -> EvalResult {
    let [tag, thunk, handler] = &args[..] else {
        return Err(EvalError::Arity {
            name: "catch".into(),
            expected: Arity::Exact(3),
            got: args.len(),
        });
    };
    match interp.apply(thunk, Vec::new(), ctx) {
        Ok(value) => Ok(value),
        Err(err) => {
            let err_tag = err.tag();
            let matches = match tag {
                Value::Boolean(true) => true,
                Value::Symbol(wanted) => *wanted == err_tag,
                _ => false,
            };
            if !matches {
                return Err(err);
            }
            let info = vec![Value::Symbol(err_tag), Value::string(&err.to_string())];
            interp.apply(handler, info, ctx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> EvalResult {
        let mut interpreter: Interpreter<()> = Interpreter::new();
        interpreter.eval_source(source, &mut ())
    }

    fn show(source: &str) -> String {
        run(source).expect("eval").to_string()
    }

    #[test]
    fn numeric_tower() {
        assert_eq!(show("(+ 1 2 3)"), "6");
        assert_eq!(show("(- 5)"), "-5");
        assert_eq!(show("(/ 6 3)"), "2");
        assert_eq!(show("(/ 1 2)"), "0.5");
        assert_eq!(show("(* 2 1.5)"), "3.0");
        assert_eq!(show("(modulo -7 2)"), "1");
        assert_eq!(show("(modulo 7 -2)"), "-1");
        assert_eq!(show("(max 1 2.5)"), "2.5");
        assert_eq!(show("(min 3 1 2)"), "1");
        assert_eq!(show("(round 2.5)"), "2.0");
    }

    #[test]
    fn division_by_zero_is_catchable() {
        assert!(matches!(run("(/ 1 0)"), Err(EvalError::DivisionByZero)));
        assert_eq!(
            show("(catch 'division-by-zero (lambda () (/ 1 0)) (lambda (tag msg) tag))"),
            "division-by-zero"
        );
    }

    #[test]
    fn comparisons_chain() {
        assert_eq!(show("(< 1 2 3)"), "#t");
        assert_eq!(show("(< 1 3 2)"), "#f");
        assert_eq!(show("(= 2 2.0)"), "#t");
    }

    #[test]
    fn list_operations() {
        assert_eq!(show("(cons 1 '(2 3))"), "(1 2 3)");
        assert_eq!(show("(cdr '(1))"), "()");
        assert_eq!(show("(append '(1) '() '(2 3))"), "(1 2 3)");
        assert_eq!(show("(reverse '(1 2 3))"), "(3 2 1)");
        assert_eq!(show("(list-ref '(a b c) 1)"), "b");
        assert_eq!(show("(map + '(1 2 3) '(10 20))"), "(11 22)");
        assert_eq!(show("(apply + 1 '(2 3))"), "6");
        assert!(matches!(run("(car '())"), Err(EvalError::WrongType(_))));
        assert!(matches!(run("(list-ref '(a) 3)"), Err(EvalError::OutOfRange(_))));
    }

    #[test]
    fn strings_and_symbols() {
        assert_eq!(show("(string-append \"a\" \"b\")"), "\"ab\"");
        assert_eq!(show("(symbol->string 'abc)"), "\"abc\"");
        assert_eq!(show("(string->symbol \"abc\")"), "abc");
        assert_eq!(show("(number->string 2.5)"), "\"2.5\"");
    }

    #[test]
    fn catch_filters_on_tag() {
        assert_eq!(
            show(
                "(catch #t (lambda () (error 'oops \"bad\" 1)) \
                 (lambda (tag msg) (list tag msg)))"
            ),
            "(oops \"bad 1\")"
        );
        let err = run("(catch 'other (lambda () (error 'oops \"bad\")) (lambda (t m) t))")
            .expect_err("uncaught");
        assert_eq!(err.tag().as_str(), "oops");
        assert_eq!(show("(catch #t (lambda () 42) (lambda (t m) 0))"), "42");
    }
}
