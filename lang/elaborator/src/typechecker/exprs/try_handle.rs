//! Handler elaboration.
//!
//! For every handler of a `try`, each declared operation of the handled
//! interface must be implemented exactly once. Operation-level type
//! parameters become existentials: fresh rigid type variables that must
//! not leak into the effects of the clause body. The continuation binder
//! `resume` is typed according to whether the operation is bidirectional.

use miette_util::ToMiette;

use ast::source::*;
use ast::*;
use printer::Print;

use super::super::ctx::Ctx;
use super::{CheckInfer, ExpectTyped};
use crate::result::{TcResult, TypeError, TypeWarning, at_span};

/// The effect-row element a handler discharges.
fn interface_effect(symbol: &Symbol, targs: &[ValueType]) -> Effect {
    if targs.is_empty() {
        Effect::Interface(symbol.clone())
    } else {
        Effect::Apply(InterfaceType { symbol: symbol.clone(), args: targs.to_vec() })
    }
}

impl CheckInfer for TryHandle {
    fn check(&self, ctx: &mut Ctx, expected: &ValueType) -> TcResult<Self> {
        elaborate(self, ctx, Some(expected))
    }

    fn infer(&self, ctx: &mut Ctx) -> TcResult<Self> {
        elaborate(self, ctx, None)
    }
}

fn elaborate(this: &TryHandle, ctx: &mut Ctx, expected: Option<&ValueType>) -> TcResult<TryHandle> {
    let ret = match expected {
        Some(tpe) => tpe.clone(),
        None => ctx.unifier.fresh_value_var(),
    };

    // The handled effects are lexically in scope inside the body.
    let in_scope: Vec<Effect> = this
        .handlers
        .iter()
        .map(|handler| interface_effect(&handler.iface, &handler.targs))
        .collect();
    let mark = ctx.push_lexical_effects(in_scope);
    let body = this.body.check(ctx, &ret)?;
    ctx.truncate_lexical_effects(mark);

    let body_effects = ctx.concrete_effects(&body.expect_effects()?, this.span)?;

    let mut handled = ConcreteEffects::empty();
    let mut handler_effects = ConcreteEffects::empty();
    let mut handlers_out = Vec::with_capacity(this.handlers.len());
    for handler in &this.handlers {
        let (handler_out, discharged, clause_effects) =
            check_handler(ctx, handler, &ret, &body_effects)?;
        handled = handled.union(&discharged);
        handler_effects = handler_effects.union(&clause_effects);
        handlers_out.push(handler_out);
    }

    let effects_out = body_effects.minus(&handled).union(&handler_effects);

    Ok(TryHandle {
        span: this.span,
        body,
        handlers: handlers_out,
        inferred_type: Some(ctx.unifier.substitute(&ret)),
        inferred_effects: Some(effects_out.into_effects()),
    })
}

fn check_handler(
    ctx: &mut Ctx,
    handler: &Handler,
    ret: &ValueType,
    body_effects: &ConcreteEffects,
) -> TcResult<(Handler, ConcreteEffects, ConcreteEffects)> {
    let iface = ctx.lookup_interface(&handler.iface, handler.span)?;

    if handler.targs.len() != iface.tparams.len() {
        return Err(TypeError::arity(
            &handler.iface,
            iface.tparams.len(),
            handler.targs.len(),
            handler.span,
        ));
    }

    // Operation coverage: every declared operation exactly once. All
    // violations are collected before giving up on the handler.
    let mut seen: HashMap<SymbolId, usize> = HashMap::default();
    for clause in &handler.clauses {
        *seen.entry(clause.op.id).or_insert(0) += 1;
    }
    for clause in &handler.clauses {
        if seen[&clause.op.id] > 1 {
            ctx.report(Box::new(TypeError::DuplicateOperation {
                iface: handler.iface.name.id.clone(),
                op: clause.op.name.id.clone(),
                span: clause.span.to_miette(),
            }));
        }
        if !iface.ops.iter().any(|op| op.symbol == clause.op) {
            ctx.report(TypeError::resolution(&clause.op, clause.span));
        }
    }
    let missing: Vec<&Symbol> = iface
        .ops
        .iter()
        .map(|op| &op.symbol)
        .filter(|op| !seen.contains_key(&op.id))
        .collect();
    if !missing.is_empty() {
        ctx.report(TypeError::missing_operations(&handler.iface, &missing, handler.span));
    }

    let mut clause_effects = ConcreteEffects::empty();
    let mut clauses_out = Vec::with_capacity(handler.clauses.len());
    for clause in &handler.clauses {
        let Some(op) = iface.ops.iter().find(|op| op.symbol == clause.op) else {
            clauses_out.push(clause.clone());
            continue;
        };
        let (clause_out, effects) = check_op_clause(ctx, handler, op.clone(), clause, ret)?;
        clause_effects = clause_effects.union(&effects);
        clauses_out.push(clause_out);
    }

    let discharged = interface_effect(
        &handler.iface,
        &handler.targs.iter().map(|t| ctx.unifier.substitute(t)).collect::<Vec<_>>(),
    );
    let discharged = ctx.concrete_effects(
        &Effects::from_effects(vec![discharged]),
        handler.span,
    )?;

    // Handling an effect the body cannot perform is suspicious but not
    // wrong.
    if !discharged.iter().all(|eff| body_effects.contains(eff)) {
        ctx.warn(TypeWarning::UnusedHandler {
            iface: handler.iface.name.id.clone(),
            span: handler.span.to_miette(),
        });
    }

    let handler_out = Handler {
        span: handler.span,
        iface: handler.iface.clone(),
        targs: handler.targs.clone(),
        clauses: clauses_out,
    };
    Ok((handler_out, discharged, clause_effects))
}

fn check_op_clause(
    ctx: &mut Ctx,
    handler: &Handler,
    op: OpDecl,
    clause: &OpClause,
    ret: &ValueType,
) -> TcResult<(OpClause, ConcreteEffects)> {
    let iface = ctx.lookup_interface(&handler.iface, handler.span)?;

    // Fresh rigid type variables for the operation's own type
    // parameters: the handler must treat them as unknowns.
    let existentials: Vec<Symbol> =
        op.tparams.iter().map(|p| ctx.fresh.fresh(&p.name.id, SymbolKind::Type)).collect();

    let op_ft = FunctionType {
        tparams: iface.tparams.iter().chain(&op.tparams).cloned().collect(),
        cparams: Vec::new(),
        vparams: op.vparams.clone(),
        bparams: Vec::new(),
        result: op.result.clone(),
        effects: op.effects.clone(),
    };
    let full_targs: Vec<ValueType> = handler
        .targs
        .iter()
        .cloned()
        .chain(existentials.iter().map(|e| ValueType::Var(e.clone())))
        .collect();
    let (_targs, _cargs, instantiated) =
        at_span(ctx.unifier.instantiate(&op_ft, Some(&full_targs)), clause.span)?;

    if clause.params.len() != instantiated.vparams.len() {
        ctx.report(TypeError::arity(
            &clause.op,
            instantiated.vparams.len(),
            clause.params.len(),
            clause.span,
        ));
    }
    for (param, tpe) in clause.params.iter().zip(&instantiated.vparams) {
        ctx.bind_value(&param.symbol, tpe.clone());
    }

    // The continuation: bidirectional operations resume with a block
    // computing the operation's result under its remaining effects;
    // ordinary operations resume with the result value directly.
    let resume_type = if op.is_bidirectional() {
        FunctionType {
            tparams: Vec::new(),
            cparams: Vec::new(),
            vparams: Vec::new(),
            bparams: vec![BlockType::Function(Box::new(FunctionType {
                tparams: Vec::new(),
                cparams: Vec::new(),
                vparams: Vec::new(),
                bparams: Vec::new(),
                result: instantiated.result.clone(),
                effects: instantiated.effects.clone(),
            }))],
            result: ret.clone(),
            effects: Effects::empty(),
        }
    } else {
        FunctionType {
            tparams: Vec::new(),
            cparams: Vec::new(),
            vparams: vec![instantiated.result.clone()],
            bparams: Vec::new(),
            result: ret.clone(),
            effects: Effects::empty(),
        }
    };
    ctx.bind_block(&clause.resume, BlockType::Function(Box::new(resume_type)));

    let body = clause.body.check(ctx, ret)?;
    let effects = ctx.concrete_effects(&body.expect_effects()?, clause.span)?;

    // Existentials must not leak through the clause's effects.
    for existential in &existentials {
        if effects.effects().mentions_var(existential) {
            ctx.report(Box::new(TypeError::EscapingEffect {
                var: existential.print_trace(),
                span: clause.span.to_miette(),
            }));
        }
    }

    let clause_out = OpClause {
        span: clause.span,
        op: clause.op.clone(),
        params: clause.params.clone(),
        resume: clause.resume.clone(),
        body,
    };
    Ok((clause_out, effects))
}
