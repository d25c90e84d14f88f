use ast::source::*;
use ast::*;

use super::super::ctx::Ctx;
use super::{CheckInfer, ExpectTyped};
use crate::result::{TcResult, at_span};

impl CheckInfer for IfExpr {
    fn check(&self, ctx: &mut Ctx, expected: &ValueType) -> TcResult<Self> {
        let cond = self.cond.check(ctx, &ValueType::bool())?;
        let then_branch = self.then_branch.check(ctx, expected)?;
        let else_branch = self.else_branch.check(ctx, expected)?;

        let effects = cond
            .expect_effects()?
            .union(&then_branch.expect_effects()?)
            .union(&else_branch.expect_effects()?);
        Ok(IfExpr {
            span: self.span,
            cond,
            then_branch,
            else_branch,
            inferred_type: Some(ctx.unifier.substitute(expected)),
            inferred_effects: Some(effects),
        })
    }

    fn infer(&self, ctx: &mut Ctx) -> TcResult<Self> {
        let cond = self.cond.check(ctx, &ValueType::bool())?;
        let then_branch = self.then_branch.infer(ctx)?;
        let else_branch = self.else_branch.infer(ctx)?;

        // Both branches must agree; the result is their join.
        let joined = at_span(
            ctx.unifier.join(&[then_branch.expect_typ()?, else_branch.expect_typ()?]),
            self.span,
        )?;
        let effects = cond
            .expect_effects()?
            .union(&then_branch.expect_effects()?)
            .union(&else_branch.expect_effects()?);
        Ok(IfExpr {
            span: self.span,
            cond,
            then_branch,
            else_branch,
            inferred_type: Some(joined),
            inferred_effects: Some(effects),
        })
    }
}
