use miette_util::ToMiette;

use ast::source::*;
use ast::*;

use super::super::ctx::Ctx;
use super::{CheckInfer, ExpectTyped, check_by_inference};
use crate::result::{TcResult, TypeError};

impl CheckInfer for Assign {
    fn check(&self, ctx: &mut Ctx, expected: &ValueType) -> TcResult<Self> {
        let inferred = self.infer(ctx)?;
        check_by_inference(ctx, &ValueType::unit(), expected, self.span)?;
        Ok(inferred)
    }

    fn infer(&self, ctx: &mut Ctx) -> TcResult<Self> {
        if !ctx.is_mutable(&self.symbol) {
            return Err(Box::new(TypeError::AssignToImmutable {
                name: self.symbol.name.id.clone(),
                span: self.span.to_miette(),
            }));
        }
        let cell_type = ctx.lookup_value(&self.symbol, self.span)?;
        let value = self.value.check(ctx, &cell_type)?;
        let effects = value.expect_effects()?;
        Ok(Assign {
            span: self.span,
            symbol: self.symbol.clone(),
            value,
            inferred_type: Some(ValueType::unit()),
            inferred_effects: Some(effects),
        })
    }
}
