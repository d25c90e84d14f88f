use miette_util::Span;

use crate::symbols::Symbol;

use super::Lit;

/// Patterns of a `match` clause.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// `_`
    Ignore(IgnorePattern),
    /// A binder
    Any(AnyPattern),
    Literal(LiteralPattern),
    /// A constructor applied to nested patterns
    Tag(TagPattern),
}

impl Pattern {
    pub fn span(&self) -> Option<Span> {
        match self {
            Pattern::Ignore(p) => p.span,
            Pattern::Any(p) => p.span,
            Pattern::Literal(p) => p.span,
            Pattern::Tag(p) => p.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IgnorePattern {
    pub span: Option<Span>,
}

#[derive(Debug, Clone)]
pub struct AnyPattern {
    pub span: Option<Span>,
    pub symbol: Symbol,
}

#[derive(Debug, Clone)]
pub struct LiteralPattern {
    pub span: Option<Span>,
    pub lit: Lit,
}

#[derive(Debug, Clone)]
pub struct TagPattern {
    pub span: Option<Span>,
    pub ctor: Symbol,
    pub patterns: Vec<Pattern>,
}
