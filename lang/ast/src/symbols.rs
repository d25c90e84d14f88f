use std::cmp::Ordering;
use std::fmt;

use derivative::Derivative;
use printer::{Alloc, Builder, Print, PrintCfg};

use crate::ident::Ident;

/// Globally unique identity of a name, assigned during name resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Bound by `val`, `var` and value parameters
    Value,
    /// Functions, block parameters, handler operations, continuations
    Block,
    /// Type constructors, type parameters, interfaces, aliases
    Type,
    /// Capture parameters
    Capture,
}

/// A resolved name.
///
/// Symbols are created exactly once, by name resolution (or by the typer
/// for existentials at handler sites). Equality and hashing go by `id`
/// alone; the name and kind are payload carried along for diagnostics.
/// Types attached to a symbol live in the typing context, not here.
#[derive(Debug, Clone, Derivative)]
#[derivative(PartialEq, Eq, Hash)]
pub struct Symbol {
    pub id: SymbolId,
    #[derivative(PartialEq = "ignore", Hash = "ignore")]
    pub name: Ident,
    #[derivative(PartialEq = "ignore", Hash = "ignore")]
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn new(id: u32, name: &str, kind: SymbolKind) -> Symbol {
        Symbol { id: SymbolId(id), name: Ident::from_string(name), kind }
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name.id)
    }
}

impl Print for Symbol {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        self.name.print(cfg, alloc)
    }
}

/// Source of fresh symbols.
///
/// Name resolution hands over its high-water mark together with the
/// resolved tree; the typer draws existentials from above that mark so
/// that resolver-made and typer-made symbols never collide.
#[derive(Debug, Clone)]
pub struct SymbolSource {
    next: u32,
}

impl SymbolSource {
    pub fn starting_at(next: u32) -> SymbolSource {
        SymbolSource { next }
    }

    pub fn fresh(&mut self, name: &str, kind: SymbolKind) -> Symbol {
        let id = self.next;
        self.next += 1;
        Symbol::new(id, name, kind)
    }
}
