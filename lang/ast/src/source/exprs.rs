use miette_util::Span;
use ordered_float::OrderedFloat;

use crate::effects::Effects;
use crate::ident::Ident;
use crate::symbols::Symbol;
use crate::types::{BlockType, ValueType};

use super::{BlockParam, Pattern, Stmt, ValueParam};

/// Expressions of the source language.
#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    Var(VarRef),
    Assign(Assign),
    If(IfExpr),
    Match(MatchExpr),
    Call(CallExpr),
    Box(BoxExpr),
    TryHandle(TryHandle),
    Region(RegionExpr),
}

impl Expr {
    pub fn span(&self) -> Option<Span> {
        match self {
            Expr::Literal(e) => e.span,
            Expr::Var(e) => e.span,
            Expr::Assign(e) => e.span,
            Expr::If(e) => e.span,
            Expr::Match(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Box(e) => e.span,
            Expr::TryHandle(e) => e.span,
            Expr::Region(e) => e.span,
        }
    }

    /// The type recorded by the typer. `None` before checking.
    pub fn inferred_type(&self) -> Option<&ValueType> {
        match self {
            Expr::Literal(e) => e.inferred_type.as_ref(),
            Expr::Var(e) => e.inferred_type.as_ref(),
            Expr::Assign(e) => e.inferred_type.as_ref(),
            Expr::If(e) => e.inferred_type.as_ref(),
            Expr::Match(e) => e.inferred_type.as_ref(),
            Expr::Call(e) => e.inferred_type.as_ref(),
            Expr::Box(e) => e.inferred_type.as_ref(),
            Expr::TryHandle(e) => e.inferred_type.as_ref(),
            Expr::Region(e) => e.inferred_type.as_ref(),
        }
    }

    /// The effects recorded by the typer. Nodes that are pure by
    /// construction report the empty row.
    pub fn inferred_effects(&self) -> Option<Effects> {
        match self {
            Expr::Literal(_) | Expr::Var(_) | Expr::Box(_) => Some(Effects::empty()),
            Expr::Assign(e) => e.inferred_effects.clone(),
            Expr::If(e) => e.inferred_effects.clone(),
            Expr::Match(e) => e.inferred_effects.clone(),
            Expr::Call(e) => e.inferred_effects.clone(),
            Expr::TryHandle(e) => e.inferred_effects.clone(),
            Expr::Region(e) => e.inferred_effects.clone(),
        }
    }
}

macro_rules! into_expr {
    ($variant:ident, $node:ty) => {
        impl From<$node> for Expr {
            fn from(node: $node) -> Expr {
                Expr::$variant(node)
            }
        }
    };
}

into_expr!(Literal, Literal);
into_expr!(Var, VarRef);
into_expr!(Assign, Assign);
into_expr!(If, IfExpr);
into_expr!(Match, MatchExpr);
into_expr!(Call, CallExpr);
into_expr!(Box, BoxExpr);
into_expr!(TryHandle, TryHandle);
into_expr!(Region, RegionExpr);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lit {
    Int(i64),
    Bool(bool),
    Unit,
    Double(OrderedFloat<f64>),
    String(String),
}

#[derive(Debug, Clone)]
pub struct Literal {
    pub span: Option<Span>,
    pub lit: Lit,
    pub inferred_type: Option<ValueType>,
}

/// A variable occurrence. Referring to a *block* symbol in expression
/// position is a type error ("blocks are not first-class"); the resolver
/// cannot rule it out, so the node carries whatever symbol was found.
#[derive(Debug, Clone)]
pub struct VarRef {
    pub span: Option<Span>,
    pub symbol: Symbol,
    pub inferred_type: Option<ValueType>,
}

/// Assignment to a `var` binder.
#[derive(Debug, Clone)]
pub struct Assign {
    pub span: Option<Span>,
    pub symbol: Symbol,
    pub value: Box<Expr>,
    pub inferred_type: Option<ValueType>,
    pub inferred_effects: Option<Effects>,
}

#[derive(Debug, Clone)]
pub struct IfExpr {
    pub span: Option<Span>,
    pub cond: Box<Expr>,
    pub then_branch: Box<Stmt>,
    pub else_branch: Box<Stmt>,
    pub inferred_type: Option<ValueType>,
    pub inferred_effects: Option<Effects>,
}

#[derive(Debug, Clone)]
pub struct MatchExpr {
    pub span: Option<Span>,
    pub scrutinee: Box<Expr>,
    pub clauses: Vec<MatchClause>,
    pub default: Option<Box<Stmt>>,
    pub inferred_type: Option<ValueType>,
    pub inferred_effects: Option<Effects>,
}

#[derive(Debug, Clone)]
pub struct MatchClause {
    pub span: Option<Span>,
    pub pattern: Pattern,
    pub body: Stmt,
}

/// A call. The target is either a (possibly overloaded) identifier or an
/// expression of boxed function type.
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub span: Option<Span>,
    pub target: CallTarget,
    pub targs: Vec<ValueType>,
    pub vargs: Vec<Expr>,
    pub bargs: Vec<BlockArg>,
    /// Type arguments as solved by the typer; always the full list, also
    /// when the programmer wrote none.
    pub inferred_targs: Option<Vec<ValueType>>,
    pub inferred_type: Option<ValueType>,
    pub inferred_effects: Option<Effects>,
}

#[derive(Debug, Clone)]
pub enum CallTarget {
    Id(IdTarget),
    Expr(Box<Expr>),
}

/// An identifier call target before and after overload resolution.
///
/// `layers` are the scope layers the resolver found candidates in,
/// innermost first; outer layers are only consulted when all inner
/// candidates fail to check.
#[derive(Debug, Clone)]
pub struct IdTarget {
    pub name: Ident,
    pub layers: Vec<Vec<Symbol>>,
    /// Filled in by overload resolution
    pub resolved: Option<Symbol>,
}

/// Boxing turns a block into a first-class value.
#[derive(Debug, Clone)]
pub struct BoxExpr {
    pub span: Option<Span>,
    pub block: BlockArg,
    pub inferred_type: Option<ValueType>,
}

#[derive(Debug, Clone)]
pub struct TryHandle {
    pub span: Option<Span>,
    pub body: Box<Stmt>,
    pub handlers: Vec<Handler>,
    pub inferred_type: Option<ValueType>,
    pub inferred_effects: Option<Effects>,
}

/// One handler of a `try`. Handles the instantiated interface
/// `iface[targs]`; every operation of the interface must be implemented
/// exactly once.
#[derive(Debug, Clone)]
pub struct Handler {
    pub span: Option<Span>,
    pub iface: Symbol,
    pub targs: Vec<ValueType>,
    pub clauses: Vec<OpClause>,
}

#[derive(Debug, Clone)]
pub struct OpClause {
    pub span: Option<Span>,
    pub op: Symbol,
    pub params: Vec<ValueParam>,
    /// The continuation binder
    pub resume: Symbol,
    pub body: Stmt,
}

#[derive(Debug, Clone)]
pub struct RegionExpr {
    pub span: Option<Span>,
    pub symbol: Symbol,
    pub body: Box<Stmt>,
    pub inferred_type: Option<ValueType>,
    pub inferred_effects: Option<Effects>,
}

/// Arguments in block position.
#[derive(Debug, Clone)]
pub enum BlockArg {
    Var(BlockVarRef),
    Lit(FunLit),
    Unbox(UnboxArg),
}

impl BlockArg {
    pub fn span(&self) -> Option<Span> {
        match self {
            BlockArg::Var(b) => b.span,
            BlockArg::Lit(b) => b.span,
            BlockArg::Unbox(b) => b.span,
        }
    }

    pub fn inferred_type(&self) -> Option<&BlockType> {
        match self {
            BlockArg::Var(b) => b.inferred_type.as_ref(),
            BlockArg::Lit(b) => b.inferred_type.as_ref(),
            BlockArg::Unbox(b) => b.inferred_type.as_ref(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlockVarRef {
    pub span: Option<Span>,
    pub symbol: Symbol,
    pub inferred_type: Option<BlockType>,
}

/// An anonymous function literal.
#[derive(Debug, Clone)]
pub struct FunLit {
    pub span: Option<Span>,
    pub tparams: Vec<Symbol>,
    pub vparams: Vec<ValueParam>,
    pub bparams: Vec<BlockParam>,
    pub body: Box<Stmt>,
    pub inferred_type: Option<BlockType>,
}

/// Unboxing turns a first-class function value back into a block.
#[derive(Debug, Clone)]
pub struct UnboxArg {
    pub span: Option<Span>,
    pub expr: Box<Expr>,
    pub inferred_type: Option<BlockType>,
}
