//==================================================
// File: interpreter/symbol.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Interpreter symbol type
// Objective: Interned, cheaply clonable symbol names shared by the reader,
//            the environments and the host atom codec
//==================================================

use std::borrow::Borrow;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

//==================================================
// Section 1.0 - Interning
//==================================================

thread_local! {
    /// Every symbol name seen on this thread. Like the host's own symbol
    /// table, entries live for the rest of the thread.
    static NAMES: RefCell<HashSet<Rc<str>>> = RefCell::new(HashSet::new());
}

fn intern(name: &str) -> Rc<str> {
    NAMES.with(|names| {
        let mut names = names.borrow_mut();
        if let Some(existing) = names.get(name) {
            return existing.clone();
        }
        let fresh: Rc<str> = Rc::from(name);
        names.insert(fresh.clone());
        fresh
    })
}

//==================================================
// Section 2.0 - Symbol
//==================================================

/// A symbol name. Equal names built on the same thread share one
/// allocation, so comparison is usually a pointer check.
#[derive(Clone, Debug, PartialOrd, Ord)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0.to_string()
    }

    /// True when both symbols point at the same interned name.
    pub fn ptr_eq(&self, other: &Symbol) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl Eq for Symbol {}

// Hashes the text so `HashMap<Symbol, _>` can be queried with `&str`.
impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Symbol(intern(&value))
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Symbol(intern(value))
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.into_string()
    }
}

impl Deref for Symbol {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}


//==================================================
// End of file
//==================================================
