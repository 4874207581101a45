use std::fmt;

use thiserror::Error;

use super::symbol::Symbol;
use crate::errors::BridgeError;

pub type EvalResult = Result<crate::interpreter::Value, EvalError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Range(usize, usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Range(lo, hi) => count >= lo && count <= hi,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Range(lo, hi) => write!(f, "{lo} to {hi}"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("unbound variable {0}")]
    Unbound(Symbol),
    #[error("{0}")]
    WrongType(String),
    #[error("{name}: expected {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: Arity,
        got: usize,
    },
    #[error("attempt to apply non-procedure {0}")]
    NotCallable(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("{0}")]
    OutOfRange(String),
    #[error("stack depth exceeded {0} frames")]
    StackOverflow(usize),
    #[error("{message}")]
    Raised { tag: Symbol, message: String },
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl EvalError {
    pub fn wrong_type(context: &str, expected: &str, found: &crate::interpreter::Value) -> Self {
        EvalError::WrongType(format!(
            "{context}: expected {expected}, got {found} ({})",
            found.type_name()
        ))
    }

    /// Tag a `catch` handler is matched against.
    pub fn tag(&self) -> Symbol {
        match self {
            EvalError::Syntax(_) => Symbol::from("syntax-error"),
            EvalError::Unbound(_) => Symbol::from("unbound-variable"),
            EvalError::WrongType(_) => Symbol::from("wrong-type-arg"),
            EvalError::Arity { .. } => Symbol::from("wrong-number-of-args"),
            EvalError::NotCallable(_) => Symbol::from("wrong-type-arg"),
            EvalError::DivisionByZero => Symbol::from("division-by-zero"),
            EvalError::OutOfRange(_) => Symbol::from("out-of-range"),
            EvalError::StackOverflow(_) => Symbol::from("stack-overflow"),
            EvalError::Raised { tag, .. } => tag.clone(),
            EvalError::Bridge(err) => Symbol::from(err.tag()),
        }
    }
}
