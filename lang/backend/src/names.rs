//! Emitted names.
//!
//! Symbols keep their source name in the output as long as it is free;
//! a second distinct symbol with the same name gets the symbol id as a
//! suffix. The same table also hands out machine-made names (for
//! continuations and reified values), so those can never collide with
//! source names either. Cloning shares the underlying table, which is
//! what lets CPS closures capture it.

use std::cell::RefCell;
use std::rc::Rc;

use ast::{HashMap, HashSet, Symbol, SymbolId};

#[derive(Clone, Default)]
pub struct Names {
    inner: Rc<RefCell<Inner>>,
}

#[derive(Default)]
struct Inner {
    assigned: HashMap<SymbolId, String>,
    used: HashSet<String>,
    counter: usize,
}

impl Names {
    pub fn new() -> Names {
        Names::default()
    }

    /// The output name of a symbol. Stable across calls.
    pub fn name_of(&self, symbol: &Symbol) -> String {
        let mut inner = self.inner.borrow_mut();
        if let Some(name) = inner.assigned.get(&symbol.id) {
            return name.clone();
        }
        let candidate = sanitize(&symbol.name.id);
        let name = if inner.used.contains(&candidate) {
            format!("{}_{}", candidate, symbol.id)
        } else {
            candidate
        };
        inner.used.insert(name.clone());
        inner.assigned.insert(symbol.id, name.clone());
        name
    }

    /// A fresh machine-made name with the given prefix.
    pub fn fresh(&self, hint: &str) -> String {
        let mut inner = self.inner.borrow_mut();
        loop {
            let name = format!("{}{}", hint, inner.counter);
            inner.counter += 1;
            if !inner.used.contains(&name) {
                inner.used.insert(name.clone());
                return name;
            }
        }
    }
}

/// SML identifiers are alphanumeric; anything else becomes an underscore.
fn sanitize(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.chars().next().is_none_or(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
