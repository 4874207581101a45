//==================================================
// File: atom/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Host message atoms
// Objective: Model the indivisible number/symbol elements of a Pd message and
//            split raw message text into atoms the way the host does
//==================================================

use std::fmt;

//==================================================
// Section 1.0 - Atom
//==================================================

/// One element of a host message. Pd only knows single precision floats and
/// symbols, so neither integers nor strings have their own variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Float(f32),
    Symbol(String),
}

impl Atom {
    pub fn float(value: f32) -> Self {
        Atom::Float(value)
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Atom::Symbol(name.into())
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Atom::Float(value) => Some(*value),
            Atom::Symbol(_) => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Atom::Symbol(name) => Some(name),
            Atom::Float(_) => None,
        }
    }

    /// Classify a single whitespace-free token. Anything that reads as a
    /// decimal number becomes a float, everything else a symbol.
    pub fn parse(token: &str) -> Self {
        if looks_numeric(token) {
            if let Ok(value) = token.parse::<f32>() {
                return Atom::Float(value);
            }
        }
        Atom::Symbol(token.to_string())
    }

    /// Split message text on whitespace, as the host does for message boxes.
    pub fn parse_line(line: &str) -> Vec<Atom> {
        line.split_whitespace().map(Atom::parse).collect()
    }
}

impl From<f32> for Atom {
    fn from(value: f32) -> Self {
        Atom::Float(value)
    }
}

impl From<&str> for Atom {
    fn from(value: &str) -> Self {
        Atom::Symbol(value.to_string())
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Float(value) => f.write_str(&format_float(*value)),
            Atom::Symbol(name) => f.write_str(name),
        }
    }
}

//==================================================
// Section 2.0 - Formatting helpers
//==================================================

/// Render a float the way the Pd console does: integral values without a
/// fractional part.
pub fn format_float(value: f32) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Space-join a slice of atoms.
pub fn join(atoms: &[Atom]) -> String {
    atoms
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

// Rust's float parser also accepts "inf" and "NaN"; the host treats those as symbols.
fn looks_numeric(token: &str) -> bool {
    let mut chars = token.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    (first.is_ascii_digit() || matches!(first, '-' | '+' | '.'))
        && token.chars().any(|c| c.is_ascii_digit())
}


//==================================================
// End of file
//==================================================
