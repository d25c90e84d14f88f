use miette_util::ToMiette;

use ast::source::*;
use ast::*;

use super::super::ctx::Ctx;
use super::{CheckInfer, check_by_inference};
use crate::result::{TcResult, TypeError};

impl CheckInfer for VarRef {
    fn check(&self, ctx: &mut Ctx, expected: &ValueType) -> TcResult<Self> {
        let inferred = self.infer(ctx)?;
        if let Some(tpe) = &inferred.inferred_type {
            check_by_inference(ctx, tpe, expected, self.span)?;
        }
        Ok(inferred)
    }

    fn infer(&self, ctx: &mut Ctx) -> TcResult<Self> {
        // Blocks are second class. A block symbol in expression position
        // must be boxed explicitly.
        if self.symbol.kind == SymbolKind::Block {
            return Err(Box::new(TypeError::NotFirstClass {
                name: self.symbol.name.id.clone(),
                span: self.span.to_miette(),
            }));
        }
        let tpe = ctx.lookup_value(&self.symbol, self.span)?;
        Ok(VarRef { span: self.span, symbol: self.symbol.clone(), inferred_type: Some(tpe) })
    }
}
