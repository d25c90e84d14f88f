//! Checking of arguments in block position.

use miette_util::ToMiette;

use ast::source::*;
use ast::*;
use printer::Print;

use super::ctx::Ctx;
use super::exprs::{CheckInfer, ExpectTyped};
use crate::result::{TcResult, TypeError, at_span};
use crate::unifier::UnifyError;

/// Check a block argument against the expected block type.
pub fn check_block_argument(
    ctx: &mut Ctx,
    arg: &BlockArg,
    expected: &BlockType,
) -> TcResult<BlockArg> {
    match arg {
        BlockArg::Var(var) => {
            let got = ctx.lookup_block(&var.symbol, var.span)?;
            at_span(ctx.unifier.require_subtype_block(&got, expected), var.span)?;
            Ok(BlockArg::Var(BlockVarRef {
                span: var.span,
                symbol: var.symbol.clone(),
                inferred_type: Some(ctx.unifier.substitute_block(&got)),
            }))
        }
        BlockArg::Lit(lit) => {
            let expected = ctx.unifier.substitute_block(expected).dealias();
            let BlockType::Function(ft) = &expected else {
                return Err(Box::new(TypeError::ExpectedFunctionBlock {
                    got: expected.print_trace(),
                    span: lit.span.to_miette(),
                }));
            };
            Ok(BlockArg::Lit(check_fun_lit(ctx, lit, ft)?))
        }
        BlockArg::Unbox(unbox) => {
            // Propagate the expectation under a box.
            let boxed = ValueType::Boxed(BoxedType {
                block: Box::new(expected.clone()),
                captures: ctx.unifier.fresh_capture_set(),
            });
            let expr = unbox.expr.check(ctx, &boxed)?;
            Ok(BlockArg::Unbox(UnboxArg {
                span: unbox.span,
                expr,
                inferred_type: Some(ctx.unifier.substitute_block(expected)),
            }))
        }
    }
}

/// Synthesize a block type for an argument; only possible when all value
/// parameters of a literal are annotated.
pub fn infer_block_argument(ctx: &mut Ctx, arg: &BlockArg) -> TcResult<BlockArg> {
    match arg {
        BlockArg::Var(var) => {
            let got = ctx.lookup_block(&var.symbol, var.span)?;
            Ok(BlockArg::Var(BlockVarRef {
                span: var.span,
                symbol: var.symbol.clone(),
                inferred_type: Some(got),
            }))
        }
        BlockArg::Lit(lit) => Ok(BlockArg::Lit(infer_fun_lit(ctx, lit)?)),
        BlockArg::Unbox(unbox) => {
            let expr = unbox.expr.infer(ctx)?;
            let tpe = ctx.unifier.substitute(&expr.expect_typ()?).dealias();
            let ValueType::Boxed(boxed) = &tpe else {
                return Err(Box::new(TypeError::ExpectedBoxed {
                    got: tpe.print_trace(),
                    span: unbox.span.to_miette(),
                }));
            };
            Ok(BlockArg::Unbox(UnboxArg {
                span: unbox.span,
                expr,
                inferred_type: Some((*boxed.block).clone()),
            }))
        }
    }
}

/// The captures of a block argument: what boxing it would close over.
pub fn captures_of(ctx: &Ctx, arg: &BlockArg) -> Captures {
    match arg {
        BlockArg::Var(var) => ctx.lookup_captures(&var.symbol),
        // A literal captures nothing beyond its own parameters.
        BlockArg::Lit(_) => Captures::empty(),
        BlockArg::Unbox(unbox) => match unbox.expr.inferred_type() {
            Some(ValueType::Boxed(boxed)) => boxed.captures.clone(),
            _ => Captures::empty(),
        },
    }
}

fn check_fun_lit(ctx: &mut Ctx, lit: &FunLit, expected: &FunctionType) -> TcResult<FunLit> {
    if lit.tparams.len() != expected.tparams.len() {
        return Err(fun_lit_arity(expected.tparams.len(), lit.tparams.len(), lit));
    }

    // Rename the expectation's type parameters to the literal's, then
    // check parameters and body against the renamed signature.
    let renaming = TypeSubst::assigning(
        &expected.tparams,
        &lit.tparams.iter().map(|p| ValueType::Var(p.clone())).collect::<Vec<_>>(),
    );
    let expected = expected.subst(&renaming);

    if lit.vparams.len() != expected.vparams.len() {
        return Err(fun_lit_arity(expected.vparams.len(), lit.vparams.len(), lit));
    }
    if lit.bparams.len() != expected.bparams.len() {
        return Err(fun_lit_arity(expected.bparams.len(), lit.bparams.len(), lit));
    }

    let mut vparams_out = Vec::with_capacity(lit.vparams.len());
    for (param, tpe) in lit.vparams.iter().zip(&expected.vparams) {
        let tpe = ctx.unifier.substitute(tpe);
        if let Some(annot) = &param.annot {
            at_span(ctx.unifier.require_equal(annot, &tpe), param.span)?;
        }
        ctx.bind_value(&param.symbol, tpe.clone());
        vparams_out.push(ValueParam {
            span: param.span,
            symbol: param.symbol.clone(),
            annot: Some(tpe),
        });
    }
    for (param, tpe) in lit.bparams.iter().zip(&expected.bparams) {
        at_span(ctx.unifier.require_equal_block(&param.annot, tpe), param.span)?;
        ctx.bind_block(&param.symbol, param.annot.clone());
    }

    let body = lit.body.check(ctx, &expected.result)?;

    // The body must stay within the declared effect row.
    let body_effects = ctx.concrete_effects(&body.expect_effects()?, lit.span)?;
    let declared = ctx.concrete_effects(&expected.effects, lit.span)?;
    for eff in body_effects.iter() {
        if !declared.contains(eff) {
            return Err(TypeError::lifted(
                UnifyError::EffectsMismatch {
                    left: body_effects.print_trace(),
                    right: declared.print_trace(),
                },
                lit.span,
            ));
        }
    }

    let tpe = FunctionType {
        tparams: lit.tparams.clone(),
        cparams: Vec::new(),
        vparams: vparams_out.iter().filter_map(|p| p.annot.clone()).collect(),
        bparams: lit.bparams.iter().map(|p| p.annot.clone()).collect(),
        result: ctx.unifier.substitute(&expected.result),
        effects: declared.into_effects(),
    };

    Ok(FunLit {
        span: lit.span,
        tparams: lit.tparams.clone(),
        vparams: vparams_out,
        bparams: lit.bparams.clone(),
        body,
        inferred_type: Some(BlockType::Function(Box::new(tpe))),
    })
}

fn infer_fun_lit(ctx: &mut Ctx, lit: &FunLit) -> TcResult<FunLit> {
    let mut vparams_out = Vec::with_capacity(lit.vparams.len());
    for param in &lit.vparams {
        let Some(annot) = &param.annot else {
            return Err(Box::new(TypeError::CannotInferParam {
                name: param.symbol.name.id.clone(),
                span: param.span.to_miette(),
            }));
        };
        ctx.bind_value(&param.symbol, annot.clone());
        vparams_out.push(param.clone());
    }
    for param in &lit.bparams {
        ctx.bind_block(&param.symbol, param.annot.clone());
    }

    let body = lit.body.infer(ctx)?;
    let result = ctx.unifier.substitute(&body.expect_typ()?);
    let effects = ctx.concrete_effects(&body.expect_effects()?, lit.span)?;

    let tpe = FunctionType {
        tparams: lit.tparams.clone(),
        cparams: Vec::new(),
        vparams: vparams_out.iter().filter_map(|p| p.annot.clone()).collect(),
        bparams: lit.bparams.iter().map(|p| p.annot.clone()).collect(),
        result,
        effects: effects.into_effects(),
    };

    Ok(FunLit {
        span: lit.span,
        tparams: lit.tparams.clone(),
        vparams: vparams_out,
        bparams: lit.bparams.clone(),
        body,
        inferred_type: Some(BlockType::Function(Box::new(tpe))),
    })
}

fn fun_lit_arity(expected: usize, actual: usize, lit: &FunLit) -> Box<TypeError> {
    Box::new(TypeError::Arity {
        name: "function literal".to_owned(),
        expected,
        actual,
        span: lit.span.to_miette(),
    })
}
