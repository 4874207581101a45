//==================================================
// File: interpreter/value.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Interpreter value model
// Objective: Closed tagged union of everything a script can hold, plus the
//            lexical frames closures capture
//==================================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::symbol::Symbol;

//==================================================
// Section 1.0 - Values
//==================================================

pub type NativeId = usize;

/// Lexical environment. `None` is the global environment, which lives in the
/// interpreter itself so top-level closures never form reference cycles.
pub type Env = Option<Rc<Frame>>;

#[derive(Clone)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Str(Rc<str>),
    Symbol(Symbol),
    Boolean(bool),
    /// The empty list.
    Null,
    Unspecified,
    /// A proper, non-empty list. Use [`Value::list`] to build one.
    List(Rc<[Value]>),
    Procedure(Rc<Procedure>),
}

pub enum Procedure {
    Lambda(Lambda),
    Native { id: NativeId, name: Symbol },
}

pub struct Lambda {
    pub name: Option<Symbol>,
    pub params: Vec<Symbol>,
    pub rest: Option<Symbol>,
    pub body: Rc<[Value]>,
    pub env: Env,
}

impl Value {
    pub fn list(items: Vec<Value>) -> Value {
        if items.is_empty() {
            Value::Null
        } else {
            Value::List(Rc::from(items))
        }
    }

    pub fn symbol(name: &str) -> Value {
        Value::Symbol(Symbol::from(name))
    }

    pub fn string(text: &str) -> Value {
        Value::Str(Rc::from(text))
    }

    /// `(quote name)`: a symbol that stays inert when evaluated.
    pub fn quoted(name: &str) -> Value {
        Value::list(vec![Value::symbol("quote"), Value::symbol(name)])
    }

    /// The symbol inside a `(quote name)` form, if this is one.
    pub fn as_quoted_symbol(&self) -> Option<&Symbol> {
        match self.as_list() {
            Some([Value::Symbol(head), Value::Symbol(name)]) if head.as_str() == "quote" => {
                Some(name)
            }
            _ => None,
        }
    }

    /// List elements; the empty list yields an empty slice.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            Value::Null => Some(&[]),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Value::Symbol(symbol) => Some(symbol),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(value) => Some(*value as f64),
            Value::Real(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false))
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self, Value::Procedure(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Str(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Boolean(_) => "boolean",
            Value::Null => "null",
            Value::Unspecified => "unspecified",
            Value::List(_) => "list",
            Value::Procedure(_) => "procedure",
        }
    }

    /// Human form used by `post`: strings without their quotes.
    pub fn display_string(&self) -> String {
        match self {
            Value::Str(text) => text.to_string(),
            other => other.to_string(),
        }
    }

    /// Identity comparison for `eq?`.
    pub fn is_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Procedure(a), Value::Procedure(b)) => Rc::ptr_eq(a, b),
            (a, b) => a == b,
        }
    }
}

impl PartialEq for Value {
    /// Structural equality. Nested lists are compared with an explicit
    /// worklist so arbitrarily deep data cannot exhaust the stack.
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            match (a, b) {
                (Value::List(a), Value::List(b)) => {
                    if a.len() != b.len() {
                        return false;
                    }
                    pending.extend(a.iter().zip(b.iter()));
                }
                (a, b) if !a.atom_eq(b) => return false,
                _ => {}
            }
        }
        true
    }
}

impl Value {
    fn atom_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Unspecified, Value::Unspecified) => true,
            (Value::Procedure(a), Value::Procedure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Values own their list children and closure frames, so a naive drop
/// recurses once per nesting level. Uniquely owned children are moved onto
/// a worklist instead and released one at a time.
impl Drop for Value {
    fn drop(&mut self) {
        if !matches!(self, Value::List(_) | Value::Procedure(_)) {
            return;
        }
        let mut pending = Vec::new();
        detach_children(self, &mut pending);
        while let Some(mut value) = pending.pop() {
            detach_children(&mut value, &mut pending);
        }
    }
}

fn detach_children(value: &mut Value, pending: &mut Vec<Value>) {
    match value {
        Value::List(items) => {
            if let Some(items) = Rc::get_mut(items) {
                pending.extend(items.iter_mut().map(|item| std::mem::replace(item, Value::Null)));
            }
        }
        Value::Procedure(procedure) => {
            if let Some(Procedure::Lambda(lambda)) = Rc::get_mut(procedure) {
                let mut frame = lambda.env.take();
                while let Some(shared) = frame {
                    let Ok(owned) = Rc::try_unwrap(shared) else {
                        break;
                    };
                    pending.extend(owned.vars.into_inner().into_values());
                    frame = owned.parent;
                }
            }
        }
        _ => {}
    }
}

impl Procedure {
    pub fn name(&self) -> Option<&Symbol> {
        match self {
            Procedure::Lambda(lambda) => lambda.name.as_ref(),
            Procedure::Native { name, .. } => Some(name),
        }
    }
}

//==================================================
// Section 2.0 - Printing
//==================================================

/// Lists nested deeper than this print as `...`.
const PRINT_DEPTH: usize = super::DEFAULT_MAX_DEPTH;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self, 0)
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value, depth: usize) -> fmt::Result {
    match value {
        Value::Integer(value) => write!(f, "{value}"),
        Value::Real(value) => {
            if value.is_finite() && value.fract() == 0.0 {
                write!(f, "{value:.1}")
            } else {
                write!(f, "{value}")
            }
        }
        Value::Str(text) => write_escaped(f, text),
        Value::Symbol(symbol) => write!(f, "{symbol}"),
        Value::Boolean(true) => f.write_str("#t"),
        Value::Boolean(false) => f.write_str("#f"),
        Value::Null => f.write_str("()"),
        Value::Unspecified => f.write_str("#<unspecified>"),
        Value::List(items) => {
            if let Some(name) = value.as_quoted_symbol() {
                return write!(f, "'{name}");
            }
            if depth >= PRINT_DEPTH {
                return f.write_str("...");
            }
            f.write_str("(")?;
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    f.write_str(" ")?;
                }
                write_value(f, item, depth + 1)?;
            }
            f.write_str(")")
        }
        Value::Procedure(procedure) => match procedure.as_ref() {
            Procedure::Lambda(lambda) => match &lambda.name {
                Some(name) => write!(f, "#<lambda {name}>"),
                None => f.write_str("#<lambda>"),
            },
            Procedure::Native { name, .. } => write!(f, "#<primitive {name}>"),
        },
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in text.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            other => write!(f, "{other}")?,
        }
    }
    f.write_str("\"")
}

//==================================================
// Section 3.0 - Frames
//==================================================

#[derive(Default)]
pub struct Frame {
    vars: RefCell<HashMap<Symbol, Value>>,
    parent: Env,
}

impl Frame {
    pub fn new(parent: Env) -> Rc<Frame> {
        Rc::new(Frame {
            vars: RefCell::new(HashMap::new()),
            parent,
        })
    }

    pub fn define(&self, name: Symbol, value: Value) {
        self.vars.borrow_mut().insert(name, value);
    }

    /// Walk this frame and its parents. `None` means the name is not bound
    /// lexically and the caller should consult the globals.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.vars.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.lookup(name))
    }

    /// Assign to the innermost lexical binding. Returns false when no frame
    /// binds the name.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.vars.borrow_mut().get_mut(name) {
            *slot = value;
            return true;
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_scheme_syntax() {
        let value = Value::list(vec![
            Value::symbol("a"),
            Value::Integer(1),
            Value::Real(2.0),
            Value::string("x \"y\""),
            Value::quoted("b"),
            Value::Boolean(false),
            Value::Null,
        ]);
        assert_eq!(value.to_string(), "(a 1 2.0 \"x \\\"y\\\"\" 'b #f ())");
    }

    #[test]
    fn empty_list_is_null() {
        assert_eq!(Value::list(Vec::new()), Value::Null);
        assert_eq!(Value::Null.as_list(), Some(&[][..]));
    }

    #[test]
    fn frames_shadow_and_assign() {
        let outer = Frame::new(None);
        outer.define(Symbol::from("x"), Value::Integer(1));
        let inner = Frame::new(Some(outer.clone()));
        assert_eq!(inner.lookup("x"), Some(Value::Integer(1)));
        assert!(inner.assign("x", Value::Integer(2)));
        assert_eq!(outer.lookup("x"), Some(Value::Integer(2)));
        assert!(!inner.assign("missing", Value::Null));
    }

    fn nested(depth: usize) -> Value {
        let mut value = Value::Integer(0);
        for _ in 0..depth {
            value = Value::list(vec![value]);
        }
        value
    }

    #[test]
    fn deeply_nested_lists_compare_print_and_drop() {
        let a = nested(200_000);
        let b = nested(200_000);
        assert_eq!(a, b);
        assert_ne!(a, nested(199_999));
        let printed = a.to_string();
        assert!(printed.starts_with("(((("));
        assert!(printed.contains("..."));
        drop(a);
        drop(b);
    }

    #[test]
    fn long_closure_chains_drop() {
        let mut value = Value::Null;
        for _ in 0..200_000 {
            let frame = Frame::new(None);
            frame.define(Symbol::from("next"), value);
            value = Value::Procedure(Rc::new(Procedure::Lambda(Lambda {
                name: None,
                params: Vec::new(),
                rest: None,
                body: Rc::from(Vec::new()),
                env: Some(frame),
            })));
        }
        drop(value);
    }
}

//==================================================
// End of file
//==================================================
