use miette_util::ToMiette;

use ast::source::*;
use ast::*;
use printer::Print;

use super::super::blocks::{captures_of, check_block_argument, infer_block_argument};
use super::super::ctx::Ctx;
use super::CheckInfer;
use crate::result::{TcResult, TypeError, at_span};

impl CheckInfer for BoxExpr {
    /// With an expectation of shape `S at C`, the expected block type `S`
    /// is propagated into the block argument.
    fn check(&self, ctx: &mut Ctx, expected: &ValueType) -> TcResult<Self> {
        let expected = ctx.unifier.substitute(expected).dealias();
        let ValueType::Boxed(boxed) = &expected else {
            return Err(Box::new(TypeError::ExpectedBoxed {
                got: expected.print_trace(),
                span: self.span.to_miette(),
            }));
        };
        let block = check_block_argument(ctx, &self.block, &boxed.block)?;
        let captures = captures_of(ctx, &block);
        at_span(ctx.unifier.require_subregion(&captures, &boxed.captures), self.span)?;
        let tpe = ValueType::Boxed(BoxedType {
            block: Box::new(ctx.unifier.substitute_block(&boxed.block)),
            captures,
        });
        Ok(BoxExpr { span: self.span, block, inferred_type: Some(tpe) })
    }

    fn infer(&self, ctx: &mut Ctx) -> TcResult<Self> {
        let block = infer_block_argument(ctx, &self.block)?;
        let block_type = block.inferred_type().cloned().ok_or_else(|| {
            Box::new(TypeError::Impossible {
                message: "Expected inferred block type".to_owned(),
                span: self.span.to_miette(),
            })
        })?;
        let captures = captures_of(ctx, &block);
        let tpe = ValueType::Boxed(BoxedType { block: Box::new(block_type), captures });
        Ok(BoxExpr { span: self.span, block, inferred_type: Some(tpe) })
    }
}
