//! Pattern checking.
//!
//! `check_pattern` returns the bindings a pattern introduces. Arity
//! mismatches are buffered (the overlapping prefix is still checked);
//! everything else fails the clause.

use ast::source::*;
use ast::*;

use super::ctx::Ctx;
use super::exprs::literal::type_of_lit;
use crate::result::{TcResult, TypeError, at_span};

pub fn check_pattern(
    ctx: &mut Ctx,
    scrutinee: &ValueType,
    pattern: &Pattern,
) -> TcResult<Vec<(Symbol, ValueType)>> {
    match pattern {
        Pattern::Ignore(_) => Ok(Vec::new()),
        Pattern::Any(any) => Ok(vec![(any.symbol.clone(), scrutinee.clone())]),
        Pattern::Literal(lit) => {
            if ctx.unifier.require_equal(scrutinee, &type_of_lit(&lit.lit)).is_err() {
                use miette_util::ToMiette;
                use printer::Print;
                return Err(Box::new(TypeError::PatternTypeMismatch {
                    expected: ctx.unifier.substitute(scrutinee).print_trace(),
                    span: lit.span.to_miette(),
                }));
            }
            Ok(Vec::new())
        }
        Pattern::Tag(tag) => check_tag_pattern(ctx, scrutinee, tag),
    }
}

fn check_tag_pattern(
    ctx: &mut Ctx,
    scrutinee: &ValueType,
    tag: &TagPattern,
) -> TcResult<Vec<(Symbol, ValueType)>> {
    let meta = ctx.lookup_ctor(&tag.ctor, tag.span)?;
    let (_targs, _cargs, instantiated) =
        at_span(ctx.unifier.instantiate(&meta.function_type(), None), tag.span)?;

    // Matching refines the instantiation: the scrutinee type determines
    // the constructor's type arguments.
    at_span(ctx.unifier.require_subtype(scrutinee, &instantiated.result), tag.span)?;

    if tag.patterns.len() != instantiated.vparams.len() {
        // Report, but keep checking the overlapping prefix.
        ctx.report(TypeError::arity(
            &tag.ctor,
            instantiated.vparams.len(),
            tag.patterns.len(),
            tag.span,
        ));
    }

    let mut bindings = Vec::new();
    for (nested, field) in tag.patterns.iter().zip(&instantiated.vparams) {
        let field = ctx.unifier.substitute(field);
        bindings.extend(check_pattern(ctx, &field, nested)?);
    }
    Ok(bindings)
}
