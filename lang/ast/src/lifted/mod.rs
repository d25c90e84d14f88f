//! The lifted intermediate representation.
//!
//! Produced by the (external) lifter after type checking: effect handling
//! has been made explicit, every effect operation call is threaded with
//! the [`Evidence`] describing where its handler lives, and all typing
//! questions are settled. The back end consumes this passively.

mod decls;
mod evidence;

pub use decls::*;
pub use evidence::*;

use crate::source::Lit;
use crate::symbols::Symbol;
use crate::types::ValueType;

/// A lifted module.
#[derive(Debug, Clone)]
pub struct Module {
    /// Module path, mapped to the output file name by the emitter
    pub path: String,
    pub decls: Vec<Declaration>,
    pub externs: Vec<Extern>,
    pub definitions: Vec<Definition>,
}

/// Statement-level terms. These are the nodes the CPS lowering walks.
#[derive(Debug, Clone)]
pub enum Term {
    Return(Return),
    App(App),
    If(If),
    Val(Val),
    Match(Match),
    Hole,
    Scope(Scope),
    State(State),
    Try(Try),
    Shift(Shift),
    Region(RegionTerm),
}

#[derive(Debug, Clone)]
pub struct Return {
    pub expr: Expr,
}

/// Application of a block. Arguments are positional and may be pure
/// expressions, blocks, or evidence.
#[derive(Debug, Clone)]
pub struct App {
    pub block: Block,
    pub targs: Vec<ValueType>,
    pub args: Vec<Argument>,
}

#[derive(Debug, Clone)]
pub struct If {
    pub cond: Expr,
    pub then_term: Box<Term>,
    pub else_term: Box<Term>,
}

/// Monadic bind: run `binding`, name its result `id`, continue with
/// `body`.
#[derive(Debug, Clone)]
pub struct Val {
    pub id: Symbol,
    pub binding: Box<Term>,
    pub body: Box<Term>,
}

#[derive(Debug, Clone)]
pub struct Match {
    pub scrutinee: Expr,
    pub clauses: Vec<Clause>,
    pub default: Option<Box<Term>>,
}

/// One clause of a match. The body is a block literal binding the
/// constructor's fields.
#[derive(Debug, Clone)]
pub struct Clause {
    pub ctor: Symbol,
    pub body: BlockLit,
}

/// Local definitions in front of a term.
#[derive(Debug, Clone)]
pub struct Scope {
    pub definitions: Vec<Definition>,
    pub body: Box<Term>,
}

/// A mutable state cell scoped to `body`.
#[derive(Debug, Clone)]
pub struct State {
    pub id: Symbol,
    pub init: Expr,
    pub region: StateRegion,
    pub evidence: Evidence,
    pub body: Box<Term>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateRegion {
    Global,
    Local(Symbol),
}

/// Install a handler: `body` is a block taking the evidence parameter
/// followed by one capability per handler.
#[derive(Debug, Clone)]
pub struct Try {
    pub body: Block,
    pub handlers: Vec<Implementation>,
}

/// Capture the continuation up to the prompt selected by `evidence`.
/// The body takes exactly one block parameter: the continuation.
#[derive(Debug, Clone)]
pub struct Shift {
    pub evidence: Evidence,
    pub body: BlockLit,
}

#[derive(Debug, Clone)]
pub struct RegionTerm {
    pub body: Block,
}

/// Pure expressions.
#[derive(Debug, Clone)]
pub enum Expr {
    ValueVar(Symbol),
    Literal(Lit),
    /// Application of a pure block (constructor or pure function)
    PureApp(PureApp),
    /// Field selection on a record
    Select(Select),
    /// Boxing a block; the identity at the target level
    Box(BoxExpr),
    /// Run a pure statement for its result
    Run(Run),
}

#[derive(Debug, Clone)]
pub struct PureApp {
    pub block: Block,
    pub targs: Vec<ValueType>,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct Select {
    pub receiver: Box<Expr>,
    pub field: Symbol,
}

#[derive(Debug, Clone)]
pub struct BoxExpr {
    pub block: Box<Block>,
}

#[derive(Debug, Clone)]
pub struct Run {
    pub term: Box<Term>,
}

/// Blocks.
#[derive(Debug, Clone)]
pub enum Block {
    BlockVar(Symbol),
    BlockLit(BlockLit),
    /// Selection of an operation from a capability
    Member(Member),
    /// Unboxing a value back into a block; the identity at the target level
    Unbox(Box<Expr>),
    /// An anonymous capability
    New(Implementation),
}

#[derive(Debug, Clone)]
pub struct BlockLit {
    pub tparams: Vec<Symbol>,
    pub params: Vec<Param>,
    pub body: Box<Term>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub id: Symbol,
}

#[derive(Debug, Clone)]
pub struct Member {
    pub receiver: Box<Block>,
    pub op: Symbol,
}

/// An implementation of an interface: one block per operation, in
/// declaration order.
#[derive(Debug, Clone)]
pub struct Implementation {
    pub interface: Symbol,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub name: Symbol,
    pub implementation: Block,
}

/// Arguments of an [`App`].
#[derive(Debug, Clone)]
pub enum Argument {
    Expr(Expr),
    Block(Block),
    Evidence(Evidence),
}

/// Definitions inside a [`Scope`] or at the toplevel.
///
/// `Def`s form a DAG under value dependency and may be reordered; `Let`s
/// observe source order because their right-hand sides may have effects.
#[derive(Debug, Clone)]
pub enum Definition {
    Def(Def),
    Let(Let),
}

#[derive(Debug, Clone)]
pub struct Def {
    pub id: Symbol,
    pub block: Block,
}

#[derive(Debug, Clone)]
pub struct Let {
    pub id: Binder,
    pub expr: Expr,
}

#[derive(Debug, Clone)]
pub enum Binder {
    Id(Symbol),
    Wildcard,
}
