//! Call checking.
//!
//! Identifier targets go through overload resolution; expression targets
//! must evaluate to a boxed function. Both paths end up in
//! [`check_call_shape`], which instantiates the callee's function type,
//! unifies the expected return type, checks the arguments against the
//! partly solved parameter types, and accumulates effects.

use miette_util::ToMiette;

use ast::source::*;
use ast::*;
use printer::Print;

use super::super::blocks::check_block_argument;
use super::super::ctx::Ctx;
use super::super::overload;
use super::{CheckInfer, ExpectTyped};
use crate::result::{TcResult, TypeError, at_span};

impl CheckInfer for CallExpr {
    fn check(&self, ctx: &mut Ctx, expected: &ValueType) -> TcResult<Self> {
        elaborate(self, ctx, Some(expected))
    }

    fn infer(&self, ctx: &mut Ctx) -> TcResult<Self> {
        elaborate(self, ctx, None)
    }
}

fn elaborate(this: &CallExpr, ctx: &mut Ctx, expected: Option<&ValueType>) -> TcResult<CallExpr> {
    match &this.target {
        CallTarget::Id(target) => overload::resolve(ctx, this, target, expected),
        CallTarget::Expr(callee) => {
            let callee = callee.infer(ctx)?;
            let callee_type = ctx.unifier.substitute(&callee.expect_typ()?).dealias();
            let ValueType::Boxed(boxed) = &callee_type else {
                return Err(Box::new(TypeError::ExpectedBoxed {
                    got: callee_type.print_trace(),
                    span: this.span.to_miette(),
                }));
            };
            let BlockType::Function(ft) = &*boxed.block else {
                return Err(Box::new(TypeError::ExpectedFunctionBlock {
                    got: boxed.block.print_trace(),
                    span: this.span.to_miette(),
                }));
            };
            let callee_effects = callee.expect_effects()?;
            let ft = (**ft).clone();
            let target = CallTarget::Expr(callee);
            let call = check_call_shape(ctx, this, "boxed function", ft, expected, target)?;
            let effects = call
                .inferred_effects
                .clone()
                .unwrap_or_default()
                .union(&callee_effects);
            Ok(CallExpr { inferred_effects: Some(effects), ..call })
        }
    }
}

/// Try to check a call against one concrete candidate symbol. Used by
/// overload resolution for each trial.
pub fn check_call_to(
    ctx: &mut Ctx,
    call: &CallExpr,
    callee: &Symbol,
    expected: Option<&ValueType>,
) -> TcResult<CallExpr> {
    let ft = ctx.lookup_function_type(callee, call.span)?;
    let target = CallTarget::Id(IdTarget {
        name: callee.name.clone(),
        layers: Vec::new(),
        resolved: Some(callee.clone()),
    });
    check_call_shape(ctx, call, &callee.name.id, ft, expected, target)
}

fn check_call_shape(
    ctx: &mut Ctx,
    call: &CallExpr,
    name: &str,
    ft: FunctionType,
    expected: Option<&ValueType>,
    target: CallTarget,
) -> TcResult<CallExpr> {
    let targs = if call.targs.is_empty() { None } else { Some(call.targs.as_slice()) };
    let (targs, _cargs, instantiated) =
        at_span(ctx.unifier.instantiate(&ft, targs), call.span)?;

    if let Some(expected) = expected {
        at_span(ctx.unifier.require_subtype(&instantiated.result, expected), call.span)?;
    }

    if call.vargs.len() != instantiated.vparams.len() {
        return Err(Box::new(TypeError::Arity {
            name: name.to_owned(),
            expected: instantiated.vparams.len(),
            actual: call.vargs.len(),
            span: call.span.to_miette(),
        }));
    }
    if call.bargs.len() != instantiated.bparams.len() {
        return Err(Box::new(TypeError::Arity {
            name: name.to_owned(),
            expected: instantiated.bparams.len(),
            actual: call.bargs.len(),
            span: call.span.to_miette(),
        }));
    }

    let mut effects = Effects::empty();
    let mut vargs_out = Vec::with_capacity(call.vargs.len());
    for (arg, param) in call.vargs.iter().zip(&instantiated.vparams) {
        let param = ctx.unifier.substitute(param);
        let arg_out = arg.check(ctx, &param)?;
        effects = effects.union(&arg_out.expect_effects()?);
        vargs_out.push(arg_out);
    }

    let mut bargs_out = Vec::with_capacity(call.bargs.len());
    for (arg, param) in call.bargs.iter().zip(&instantiated.bparams) {
        let param = ctx.unifier.substitute_block(param);
        bargs_out.push(check_block_argument(ctx, arg, &param)?);
    }

    // Finally, the callee's own effects.
    effects = effects.union(&ctx.unifier.substitute_effects(&instantiated.effects));

    let inferred_targs: Vec<ValueType> =
        targs.iter().map(|t| ctx.unifier.substitute(t)).collect();
    let result = ctx.unifier.substitute(&instantiated.result);

    Ok(CallExpr {
        span: call.span,
        target,
        targs: call.targs.clone(),
        vargs: vargs_out,
        bargs: bargs_out,
        inferred_targs: Some(inferred_targs),
        inferred_type: Some(result),
        inferred_effects: Some(effects),
    })
}
