use std::fmt;

use pretty::DocAllocator;
use printer::{Alloc, Builder, Print, PrintCfg};

/// A plain identifier as written in the source program.
///
/// Identifiers are not unique; the same name can be bound many times in
/// different scopes. Identity is tracked by [`crate::Symbol`], identifiers
/// only matter for diagnostics and emitted code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident {
    pub id: String,
}

impl Ident {
    pub fn from_string(id: &str) -> Ident {
        Ident { id: id.to_owned() }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl Print for Ident {
    fn print<'a>(&'a self, _cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        alloc.text(&self.id)
    }
}
