use ast::source::*;
use ast::*;

use super::super::ctx::Ctx;
use super::{CheckInfer, ExpectTyped};
use crate::result::TcResult;

impl CheckInfer for RegionExpr {
    fn check(&self, ctx: &mut Ctx, expected: &ValueType) -> TcResult<Self> {
        elaborate(self, ctx, Some(expected))
    }

    fn infer(&self, ctx: &mut Ctx) -> TcResult<Self> {
        elaborate(self, ctx, None)
    }
}

/// `region r { body }` scopes mutable cells allocated into `r` to the
/// body. The region symbol itself is tracked as a capture.
fn elaborate(this: &RegionExpr, ctx: &mut Ctx, expected: Option<&ValueType>) -> TcResult<RegionExpr> {
    ctx.bind_captures(&this.symbol, Captures::singleton(Capture::Param(this.symbol.id)));
    let body = match expected {
        Some(tpe) => this.body.check(ctx, tpe)?,
        None => this.body.infer(ctx)?,
    };
    let tpe = body.expect_typ()?;
    let effects = body.expect_effects()?;
    Ok(RegionExpr {
        span: this.span,
        symbol: this.symbol.clone(),
        body,
        inferred_type: Some(tpe),
        inferred_effects: Some(effects),
    })
}
