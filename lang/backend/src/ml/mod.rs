//! The Target-ML AST.
//!
//! A small algebraic model of the SML subset the transformer emits.
//! Nodes are produced by the transformer, rewritten by nobody, and
//! consumed by the printer; they carry no spans or types.

mod print;

/// Expressions. Application and lambdas are curried when printed, which
/// is what allows the staged applications the handler lowering emits.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Variable(String),
    Lambda { params: Vec<Param>, body: Box<Expr> },
    Call { fun: Box<Expr>, args: Vec<Expr> },
    If { cond: Box<Expr>, then_branch: Box<Expr>, else_branch: Box<Expr> },
    Let { bindings: Vec<Binding>, body: Box<Expr> },
    Tuple(Vec<Expr>),
    /// Constructor application; multi-field payloads are tupled
    Make { ctor: String, payload: Option<Box<Expr>> },
    Match { scrutinee: Box<Expr>, clauses: Vec<MatchClause>, default: Option<Box<Expr>> },
    Ref(Box<Expr>),
    Deref(Box<Expr>),
    Assign { cell: Box<Expr>, value: Box<Expr> },
    /// Verbatim target code, parenthesized when printed
    RawExpr(String),
    /// A verbatim token (numerals, raw identifiers)
    RawValue(String),
    MLString(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchClause {
    pub pattern: Pattern,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Var(String),
    Wildcard,
    Ctor { name: String, args: Vec<Pattern> },
    Tuple(Vec<Pattern>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Named(String),
    Patterned(Pattern),
}

/// Toplevel bindings. This is the closed variant set of the downstream
/// contract with the emitter.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    ValBind { name: String, expr: Expr },
    AnonBind { expr: Expr },
    FunBind { name: String, params: Vec<Param>, body: Expr },
    DataBind { name: String, tvars: Vec<String>, ctors: Vec<(String, Option<Type>)> },
    /// Verbatim target code (externs)
    RawBind { text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Var(String),
    Tuple(Vec<Type>),
    Fun(Box<Type>, Box<Type>),
    Data { name: String, args: Vec<Type> },
    Integer,
    Bool,
    Unit,
    Real,
    Str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toplevel {
    pub bindings: Vec<Binding>,
    pub main_call: Option<Expr>,
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Expr {
        Expr::Variable(name.into())
    }

    pub fn call(fun: Expr, args: Vec<Expr>) -> Expr {
        Expr::Call { fun: Box::new(fun), args }
    }

    pub fn lambda(params: Vec<Param>, body: Expr) -> Expr {
        Expr::Lambda { params, body: Box::new(body) }
    }

    pub fn let_in(bindings: Vec<Binding>, body: Expr) -> Expr {
        Expr::Let { bindings, body: Box::new(body) }
    }

    pub fn if_else(cond: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
        Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }
}
