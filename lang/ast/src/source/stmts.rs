use miette_util::Span;

use crate::effects::Effects;
use crate::symbols::Symbol;
use crate::types::ValueType;

use super::Expr;

/// Statements. A statement list is a cons-list of binders and expression
/// statements ending in `Return`; this shape makes the bidirectional
/// rules and the later CPS lowering line up.
#[derive(Debug, Clone)]
pub enum Stmt {
    Return(ReturnStmt),
    Val(ValStmt),
    Var(VarStmt),
    Expr(ExprStmt),
}

impl Stmt {
    pub fn span(&self) -> Option<Span> {
        match self {
            Stmt::Return(s) => s.span,
            Stmt::Val(s) => s.span,
            Stmt::Var(s) => s.span,
            Stmt::Expr(s) => s.span,
        }
    }

    pub fn inferred_type(&self) -> Option<&ValueType> {
        match self {
            Stmt::Return(s) => s.inferred_type.as_ref(),
            Stmt::Val(s) => s.inferred_type.as_ref(),
            Stmt::Var(s) => s.inferred_type.as_ref(),
            Stmt::Expr(s) => s.inferred_type.as_ref(),
        }
    }

    pub fn inferred_effects(&self) -> Option<&Effects> {
        match self {
            Stmt::Return(s) => s.inferred_effects.as_ref(),
            Stmt::Val(s) => s.inferred_effects.as_ref(),
            Stmt::Var(s) => s.inferred_effects.as_ref(),
            Stmt::Expr(s) => s.inferred_effects.as_ref(),
        }
    }
}

macro_rules! into_stmt {
    ($variant:ident, $node:ty) => {
        impl From<$node> for Stmt {
            fn from(node: $node) -> Stmt {
                Stmt::$variant(node)
            }
        }
    };
}

into_stmt!(Return, ReturnStmt);
into_stmt!(Val, ValStmt);
into_stmt!(Var, VarStmt);
into_stmt!(Expr, ExprStmt);

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub span: Option<Span>,
    pub expr: Expr,
    pub inferred_type: Option<ValueType>,
    pub inferred_effects: Option<Effects>,
}

/// `val x = e; rest`
#[derive(Debug, Clone)]
pub struct ValStmt {
    pub span: Option<Span>,
    pub symbol: Symbol,
    pub annot: Option<ValueType>,
    pub binding: Expr,
    pub rest: Box<Stmt>,
    pub inferred_type: Option<ValueType>,
    pub inferred_effects: Option<Effects>,
}

/// `var x = e; rest`, a mutable cell in the given region (the enclosing
/// function's implicit region when `None`).
#[derive(Debug, Clone)]
pub struct VarStmt {
    pub span: Option<Span>,
    pub symbol: Symbol,
    pub annot: Option<ValueType>,
    pub binding: Expr,
    pub region: Option<Symbol>,
    pub rest: Box<Stmt>,
    pub inferred_type: Option<ValueType>,
    pub inferred_effects: Option<Effects>,
}

/// An expression in statement position; its value is discarded.
#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub span: Option<Span>,
    pub expr: Expr,
    pub rest: Box<Stmt>,
    pub inferred_type: Option<ValueType>,
    pub inferred_effects: Option<Effects>,
}
