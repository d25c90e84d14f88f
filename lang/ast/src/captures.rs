use std::collections::BTreeSet;

use pretty::DocAllocator;
use printer::tokens::*;
use printer::{Alloc, Builder, Print, PrintCfg};

use crate::symbols::{Symbol, SymbolId};
use crate::types::CaptureVar;

/// One atom of a capture set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Capture {
    /// The capture of a concrete block (tracked by its symbol)
    Block(SymbolId),
    /// A capture parameter of an enclosing function
    Param(SymbolId),
    /// A flexible capture owned by the unification engine
    Unification(CaptureVar),
}

/// A set of captures. Ordered so that iteration (and thus printing and
/// hashing of diagnostics) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    set: BTreeSet<Capture>,
}

impl Captures {
    pub fn empty() -> Captures {
        Captures::default()
    }

    pub fn singleton(capture: Capture) -> Captures {
        let mut set = BTreeSet::new();
        set.insert(capture);
        Captures { set }
    }

    pub fn of_block(symbol: &Symbol) -> Captures {
        Captures::singleton(Capture::Block(symbol.id))
    }

    pub fn insert(&mut self, capture: Capture) {
        self.set.insert(capture);
    }

    pub fn union(&self, other: &Captures) -> Captures {
        Captures { set: self.set.union(&other.set).cloned().collect() }
    }

    pub fn contains(&self, capture: &Capture) -> bool {
        self.set.contains(capture)
    }

    pub fn is_subset(&self, other: &Captures) -> bool {
        self.set.is_subset(&other.set)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capture> {
        self.set.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn is_concrete(&self) -> bool {
        !self.set.iter().any(|c| matches!(c, Capture::Unification(_)))
    }

    /// The unification variables occurring in this set.
    pub fn unification_vars(&self) -> impl Iterator<Item = &CaptureVar> {
        self.set.iter().filter_map(|c| match c {
            Capture::Unification(v) => Some(v),
            _ => None,
        })
    }
}

impl FromIterator<Capture> for Captures {
    fn from_iter<I: IntoIterator<Item = Capture>>(iter: I) -> Captures {
        Captures { set: iter.into_iter().collect() }
    }
}

impl Print for Capture {
    fn print<'a>(&'a self, _cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        match self {
            Capture::Block(id) => alloc.text(format!("cap@{id}")),
            Capture::Param(id) => alloc.text(format!("param@{id}")),
            Capture::Unification(var) => alloc.text(format!("?c{}", var.id)),
        }
    }
}

impl Print for Captures {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        let sep = alloc.text(COMMA).append(alloc.space());
        alloc.intersperse(self.set.iter().map(|c| c.print(cfg, alloc)), sep).braces()
    }
}
