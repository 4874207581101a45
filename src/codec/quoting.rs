//==================================================
// File: codec/quoting.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Symbol quoting helpers
// Objective: Pure predicates and trims over atom text; results borrow the input
//==================================================

/// True when `text` begins and ends with a double quote.
pub fn in_quotes(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('"') && text.ends_with('"')
}

/// `"abc"` -> `abc`. Text that is not in quotes comes back unchanged.
pub fn trim_quotes(text: &str) -> &str {
    if in_quotes(text) {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

/// True when `text` starts with exactly one single quote and has a name after it.
pub fn is_quoted_symbol(text: &str) -> bool {
    match text.strip_prefix('\'') {
        Some(rest) => !rest.is_empty() && !rest.starts_with('\''),
        None => false,
    }
}

/// `'abc` -> `abc`. Text that is not a quoted symbol comes back unchanged.
pub fn trim_symbol_quote(text: &str) -> &str {
    if is_quoted_symbol(text) {
        &text[1..]
    } else {
        text
    }
}


//==================================================
// End of file
//==================================================
