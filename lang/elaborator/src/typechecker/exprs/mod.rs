pub mod assign;
pub mod box_expr;
pub mod call;
pub mod if_else;
pub mod literal;
pub mod local_match;
pub mod region;
pub mod try_handle;
pub mod variable;

use log::trace;

use ast::source::*;
use ast::*;
use printer::Print;

use super::ctx::Ctx;
use crate::result::{TcResult, TypeError, at_span};

/// The CheckInfer trait for bidirectional type-and-effect inference.
/// Nodes which implement this trait provide both a `check` function
/// to typecheck the node against an expected type and an `infer` function
/// to synthesize a type for it. Both return the node rewritten with its
/// inferred type and effects stored for later substitution.
pub trait CheckInfer: Sized {
    /// Checks the node against the expected type:
    /// ```text
    ///            Γ ⊢ e ⇐ τ | ε
    /// ```
    fn check(&self, ctx: &mut Ctx, expected: &ValueType) -> TcResult<Self>;
    /// Synthesizes a type for the node:
    /// ```text
    ///            Γ ⊢ e ⇒ τ | ε
    /// ```
    fn infer(&self, ctx: &mut Ctx) -> TcResult<Self>;
}

impl<T: CheckInfer> CheckInfer for Box<T> {
    fn check(&self, ctx: &mut Ctx, expected: &ValueType) -> TcResult<Self> {
        Ok(Box::new((**self).check(ctx, expected)?))
    }
    fn infer(&self, ctx: &mut Ctx) -> TcResult<Self> {
        Ok(Box::new((**self).infer(ctx)?))
    }
}

/// Read back annotations the typer has stored on a node. Failing here is
/// a typer bug, not a user error.
pub trait ExpectTyped {
    fn expect_typ(&self) -> TcResult<ValueType>;
    fn expect_effects(&self) -> TcResult<Effects>;
}

impl ExpectTyped for Expr {
    fn expect_typ(&self) -> TcResult<ValueType> {
        self.inferred_type().cloned().ok_or_else(|| {
            Box::new(TypeError::Impossible {
                message: "Expected inferred type".to_owned(),
                span: None,
            })
        })
    }

    fn expect_effects(&self) -> TcResult<Effects> {
        self.inferred_effects().ok_or_else(|| {
            Box::new(TypeError::Impossible {
                message: "Expected inferred effects".to_owned(),
                span: None,
            })
        })
    }
}

impl ExpectTyped for Stmt {
    fn expect_typ(&self) -> TcResult<ValueType> {
        self.inferred_type().cloned().ok_or_else(|| {
            Box::new(TypeError::Impossible {
                message: "Expected inferred type".to_owned(),
                span: None,
            })
        })
    }

    fn expect_effects(&self) -> TcResult<Effects> {
        self.inferred_effects().cloned().ok_or_else(|| {
            Box::new(TypeError::Impossible {
                message: "Expected inferred effects".to_owned(),
                span: None,
            })
        })
    }
}

impl CheckInfer for Expr {
    fn check(&self, ctx: &mut Ctx, expected: &ValueType) -> TcResult<Self> {
        trace!("|- {:?} <= {}", std::mem::discriminant(self), expected.print_trace());
        match self {
            Expr::Literal(e) => Ok(e.check(ctx, expected)?.into()),
            Expr::Var(e) => Ok(e.check(ctx, expected)?.into()),
            Expr::Assign(e) => Ok(e.check(ctx, expected)?.into()),
            Expr::If(e) => Ok(e.check(ctx, expected)?.into()),
            Expr::Match(e) => Ok(e.check(ctx, expected)?.into()),
            Expr::Call(e) => Ok(e.check(ctx, expected)?.into()),
            Expr::Box(e) => Ok(e.check(ctx, expected)?.into()),
            Expr::TryHandle(e) => Ok(e.check(ctx, expected)?.into()),
            Expr::Region(e) => Ok(e.check(ctx, expected)?.into()),
        }
    }

    fn infer(&self, ctx: &mut Ctx) -> TcResult<Self> {
        let res: TcResult<Expr> = match self {
            Expr::Literal(e) => Ok(e.infer(ctx)?.into()),
            Expr::Var(e) => Ok(e.infer(ctx)?.into()),
            Expr::Assign(e) => Ok(e.infer(ctx)?.into()),
            Expr::If(e) => Ok(e.infer(ctx)?.into()),
            Expr::Match(e) => Ok(e.infer(ctx)?.into()),
            Expr::Call(e) => Ok(e.infer(ctx)?.into()),
            Expr::Box(e) => Ok(e.infer(ctx)?.into()),
            Expr::TryHandle(e) => Ok(e.infer(ctx)?.into()),
            Expr::Region(e) => Ok(e.infer(ctx)?.into()),
        };
        if let Ok(out) = &res {
            trace!(
                "|- inferred {}",
                out.inferred_type().map(|t| t.print_trace()).unwrap_or_default()
            );
        }
        res
    }
}

/// The default checking rule: synthesize, then require the synthesized
/// type to be a subtype of the expectation.
pub(crate) fn check_by_inference(
    ctx: &mut Ctx,
    inferred: &ValueType,
    expected: &ValueType,
    span: Option<miette_util::Span>,
) -> TcResult {
    at_span(ctx.unifier.require_subtype(inferred, expected), span)
}

