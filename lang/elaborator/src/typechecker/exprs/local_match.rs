use ast::source::*;
use ast::*;

use super::super::ctx::Ctx;
use super::super::exhaustiveness;
use super::super::patterns::check_pattern;
use super::{CheckInfer, ExpectTyped};
use crate::result::{TcResult, at_span};

impl CheckInfer for MatchExpr {
    fn check(&self, ctx: &mut Ctx, expected: &ValueType) -> TcResult<Self> {
        elaborate(self, ctx, Some(expected))
    }

    fn infer(&self, ctx: &mut Ctx) -> TcResult<Self> {
        elaborate(self, ctx, None)
    }
}

fn elaborate(this: &MatchExpr, ctx: &mut Ctx, expected: Option<&ValueType>) -> TcResult<MatchExpr> {
    let scrutinee = this.scrutinee.infer(ctx)?;
    let scrutinee_type = ctx.unifier.substitute(&scrutinee.expect_typ()?);

    let mut effects = scrutinee.expect_effects()?;
    let mut branch_types = Vec::new();
    let mut clauses_out = Vec::new();

    for clause in &this.clauses {
        let bindings = check_pattern(ctx, &scrutinee_type, &clause.pattern)?;
        for (symbol, tpe) in bindings {
            ctx.bind_value(&symbol, tpe);
        }
        let body = match expected {
            Some(tpe) => clause.body.check(ctx, tpe)?,
            None => clause.body.infer(ctx)?,
        };
        effects = effects.union(&body.expect_effects()?);
        branch_types.push(body.expect_typ()?);
        clauses_out.push(MatchClause {
            span: clause.span,
            pattern: clause.pattern.clone(),
            body,
        });
    }

    // A default arm is type-checked against the result type like any
    // other branch.
    let default = match &this.default {
        Some(body) => {
            let body = match expected {
                Some(tpe) => body.check(ctx, tpe)?,
                None => body.infer(ctx)?,
            };
            effects = effects.union(&body.expect_effects()?);
            branch_types.push(body.expect_typ()?);
            Some(body)
        }
        None => None,
    };

    exhaustiveness::check_match(ctx, &scrutinee_type, &clauses_out, default.as_deref(), this.span);

    let result = match expected {
        Some(tpe) => ctx.unifier.substitute(tpe),
        None => at_span(ctx.unifier.join(&branch_types), this.span)?,
    };

    Ok(MatchExpr {
        span: this.span,
        scrutinee,
        clauses: clauses_out,
        default,
        inferred_type: Some(result),
        inferred_effects: Some(effects),
    })
}
