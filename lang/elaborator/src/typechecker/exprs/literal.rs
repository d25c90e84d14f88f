use ast::source::*;
use ast::*;

use super::super::ctx::Ctx;
use super::{CheckInfer, check_by_inference};
use crate::result::TcResult;

pub fn type_of_lit(lit: &Lit) -> ValueType {
    match lit {
        Lit::Int(_) => ValueType::Builtin(Builtin::Int),
        Lit::Bool(_) => ValueType::Builtin(Builtin::Bool),
        Lit::Unit => ValueType::Builtin(Builtin::Unit),
        Lit::Double(_) => ValueType::Builtin(Builtin::Double),
        Lit::String(_) => ValueType::Builtin(Builtin::String),
    }
}

impl CheckInfer for Literal {
    fn check(&self, ctx: &mut Ctx, expected: &ValueType) -> TcResult<Self> {
        let inferred = self.infer(ctx)?;
        check_by_inference(ctx, &type_of_lit(&self.lit), expected, self.span)?;
        Ok(inferred)
    }

    fn infer(&self, _ctx: &mut Ctx) -> TcResult<Self> {
        Ok(Literal {
            span: self.span,
            lit: self.lit.clone(),
            inferred_type: Some(type_of_lit(&self.lit)),
        })
    }
}
