//==================================================
// File: codec/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Atom <-> interpreter value conversion
// Objective: Total conversion from host atoms into values, fallible conversion
//            back, and reassembly of atoms into source text
//==================================================

pub mod quoting;

use crate::atom::Atom;
use crate::errors::ConversionError;
use crate::interpreter::Value;

pub use quoting::{in_quotes, is_quoted_symbol, trim_quotes, trim_symbol_quote};

// Largest magnitude below which every integral f32 also fits an i64 exactly.
const EXACT_INTEGER_LIMIT: f32 = 9.0e15;

//==================================================
// Section 1.0 - Atom to Value
//==================================================

/// Every atom has a value: integral floats become integers, `"text"` a
/// string, `'name` an inert quoted symbol, and any other text a symbol.
pub fn atom_to_value(atom: &Atom) -> Value {
    match atom {
        Atom::Float(value) => float_to_value(*value),
        Atom::Symbol(text) => text_to_value(text),
    }
}

pub fn float_to_value(value: f32) -> Value {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < EXACT_INTEGER_LIMIT {
        Value::Integer(value as i64)
    } else {
        Value::Real(f64::from(value))
    }
}

fn text_to_value(text: &str) -> Value {
    if in_quotes(text) {
        Value::string(trim_quotes(text))
    } else if is_quoted_symbol(text) {
        Value::quoted(trim_symbol_quote(text))
    } else {
        Value::symbol(text)
    }
}

pub fn atoms_to_values(atoms: &[Atom]) -> Vec<Value> {
    atoms.iter().map(atom_to_value).collect()
}

//==================================================
// Section 2.0 - Value to Atom
//==================================================

/// Convert one value back into an atom. Booleans become 1/0 since the host
/// has no boolean type. Lists, procedures, `()` and unspecified have no atom
/// form; the caller decides whether that is an error.
pub fn value_to_atom(value: &Value) -> Result<Atom, ConversionError> {
    match value {
        Value::Integer(n) => Ok(Atom::Float(*n as f32)),
        Value::Real(n) => Ok(Atom::Float(*n as f32)),
        Value::Str(text) => Ok(Atom::Symbol(format!("\"{text}\""))),
        Value::Symbol(symbol) => Ok(Atom::Symbol(symbol.to_string())),
        Value::Boolean(flag) => Ok(Atom::Float(if *flag { 1.0 } else { 0.0 })),
        Value::List(_) => match value.as_quoted_symbol() {
            Some(name) => Ok(Atom::Symbol(format!("'{name}"))),
            None => Err(ConversionError::Unsupported(value.to_string())),
        },
        Value::Null | Value::Unspecified | Value::Procedure(_) => {
            Err(ConversionError::Unsupported(value.to_string()))
        }
    }
}

/// Convert a message payload. A single list value spreads into its elements
/// so `(output! 0 '(1 2 3))` sends a three-atom list; any element without an
/// atom form fails the whole conversion.
pub fn values_to_atoms(values: &[Value]) -> Result<Vec<Atom>, ConversionError> {
    let spread = match values {
        [single @ Value::List(_)] if single.as_quoted_symbol().is_none() => {
            single.as_list().unwrap_or(&[])
        }
        _ => values,
    };
    spread.iter().map(value_to_atom).collect()
}

//==================================================
// Section 3.0 - Source reassembly
//==================================================

/// Space-join atoms into source text. Strings are re-escaped and quoted
/// symbols keep their prefix, so `foo "a b" 'c` reads back as the same data.
pub fn atoms_to_source(atoms: &[Atom]) -> String {
    atoms
        .iter()
        .map(|atom| atom_to_value(atom).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}


//==================================================
// End of file
//==================================================
