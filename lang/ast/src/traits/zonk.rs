//! Application of the unifier's solved substitution to stored
//! annotations.
//!
//! While a definition is being checked, annotations written by the typer
//! may still contain unification variables. Once checking ends, the typer
//! zonks the definition: every solved variable is replaced by its
//! solution, so that no `Effects` or `ValueType` stored on a tree
//! mentions a unification variable anymore.

use crate::captures::{Capture, Captures};
use crate::effects::{Effect, EffectAliasApp, Effects};
use crate::source::*;
use crate::subst::UnifierSubst;
use crate::types::*;

pub trait Zonk {
    fn zonk(&mut self, subst: &UnifierSubst);
}

impl<T: Zonk> Zonk for Box<T> {
    fn zonk(&mut self, subst: &UnifierSubst) {
        (**self).zonk(subst)
    }
}

impl<T: Zonk> Zonk for Option<T> {
    fn zonk(&mut self, subst: &UnifierSubst) {
        if let Some(inner) = self {
            inner.zonk(subst)
        }
    }
}

impl<T: Zonk> Zonk for Vec<T> {
    fn zonk(&mut self, subst: &UnifierSubst) {
        for item in self {
            item.zonk(subst)
        }
    }
}

// Types
//
//

impl Zonk for ValueType {
    fn zonk(&mut self, subst: &UnifierSubst) {
        match self {
            ValueType::Unification(var) => {
                if let Some(solution) = subst.solution(var.id) {
                    // The occurs check guarantees solutions are acyclic,
                    // so recursing on the solution terminates.
                    let mut solution = solution.clone();
                    solution.zonk(subst);
                    *self = solution;
                }
            }
            ValueType::Var(_) | ValueType::Builtin(_) | ValueType::Bottom => {}
            ValueType::Constructor(TypeApp { args, .. }) => args.zonk(subst),
            ValueType::Boxed(BoxedType { block, captures }) => {
                block.zonk(subst);
                captures.zonk(subst);
            }
            ValueType::Alias(TypeAliasApp { args, .. }) => args.zonk(subst),
        }
    }
}

impl Zonk for BlockType {
    fn zonk(&mut self, subst: &UnifierSubst) {
        match self {
            BlockType::Function(ft) => ft.zonk(subst),
            BlockType::Interface(iface) => iface.zonk(subst),
        }
    }
}

impl Zonk for FunctionType {
    fn zonk(&mut self, subst: &UnifierSubst) {
        let FunctionType { tparams: _, cparams: _, vparams, bparams, result, effects } = self;
        vparams.zonk(subst);
        bparams.zonk(subst);
        result.zonk(subst);
        effects.zonk(subst);
    }
}

impl Zonk for InterfaceType {
    fn zonk(&mut self, subst: &UnifierSubst) {
        self.args.zonk(subst)
    }
}

impl Zonk for Effects {
    fn zonk(&mut self, subst: &UnifierSubst) {
        // Zonking can make previously distinct elements equal; rebuild to
        // restore deduplication.
        let mut zonked: Vec<Effect> = self.iter().cloned().collect();
        zonked.zonk(subst);
        *self = Effects::from_effects(zonked);
    }
}

impl Zonk for Effect {
    fn zonk(&mut self, subst: &UnifierSubst) {
        match self {
            Effect::Interface(_) | Effect::Builtin(_) => {}
            Effect::Apply(iface) => iface.zonk(subst),
            Effect::Alias(EffectAliasApp { args, .. }) => args.zonk(subst),
        }
    }
}

impl Zonk for Captures {
    fn zonk(&mut self, subst: &UnifierSubst) {
        let mut out = Captures::empty();
        for capture in self.iter() {
            match capture {
                Capture::Unification(var) => match subst.capture_solution(var.id) {
                    Some(solution) => {
                        let mut solution = solution.clone();
                        solution.zonk(subst);
                        out = out.union(&solution);
                    }
                    None => out.insert(capture.clone()),
                },
                other => out.insert(other.clone()),
            }
        }
        *self = out;
    }
}

// Source tree
//
//

impl Zonk for FunDef {
    fn zonk(&mut self, subst: &UnifierSubst) {
        let FunDef { vparams, bparams, ret, body, .. } = self;
        vparams.zonk(subst);
        bparams.zonk(subst);
        if let Some((tpe, effs)) = ret {
            tpe.zonk(subst);
            effs.zonk(subst);
        }
        body.zonk(subst);
    }
}

impl Zonk for ValueParam {
    fn zonk(&mut self, subst: &UnifierSubst) {
        self.annot.zonk(subst)
    }
}

impl Zonk for BlockParam {
    fn zonk(&mut self, subst: &UnifierSubst) {
        self.annot.zonk(subst)
    }
}

impl Zonk for Stmt {
    fn zonk(&mut self, subst: &UnifierSubst) {
        match self {
            Stmt::Return(ReturnStmt { expr, inferred_type, inferred_effects, .. }) => {
                expr.zonk(subst);
                inferred_type.zonk(subst);
                inferred_effects.zonk(subst);
            }
            Stmt::Val(ValStmt {
                annot, binding, rest, inferred_type, inferred_effects, ..
            }) => {
                annot.zonk(subst);
                binding.zonk(subst);
                rest.zonk(subst);
                inferred_type.zonk(subst);
                inferred_effects.zonk(subst);
            }
            Stmt::Var(VarStmt {
                annot, binding, rest, inferred_type, inferred_effects, ..
            }) => {
                annot.zonk(subst);
                binding.zonk(subst);
                rest.zonk(subst);
                inferred_type.zonk(subst);
                inferred_effects.zonk(subst);
            }
            Stmt::Expr(ExprStmt { expr, rest, inferred_type, inferred_effects, .. }) => {
                expr.zonk(subst);
                rest.zonk(subst);
                inferred_type.zonk(subst);
                inferred_effects.zonk(subst);
            }
        }
    }
}

impl Zonk for Expr {
    fn zonk(&mut self, subst: &UnifierSubst) {
        match self {
            Expr::Literal(Literal { inferred_type, .. }) => inferred_type.zonk(subst),
            Expr::Var(VarRef { inferred_type, .. }) => inferred_type.zonk(subst),
            Expr::Assign(Assign { value, inferred_type, inferred_effects, .. }) => {
                value.zonk(subst);
                inferred_type.zonk(subst);
                inferred_effects.zonk(subst);
            }
            Expr::If(IfExpr {
                cond, then_branch, else_branch, inferred_type, inferred_effects, ..
            }) => {
                cond.zonk(subst);
                then_branch.zonk(subst);
                else_branch.zonk(subst);
                inferred_type.zonk(subst);
                inferred_effects.zonk(subst);
            }
            Expr::Match(MatchExpr {
                scrutinee, clauses, default, inferred_type, inferred_effects, ..
            }) => {
                scrutinee.zonk(subst);
                for clause in clauses {
                    clause.body.zonk(subst);
                }
                default.zonk(subst);
                inferred_type.zonk(subst);
                inferred_effects.zonk(subst);
            }
            Expr::Call(CallExpr {
                target,
                targs,
                vargs,
                bargs,
                inferred_targs,
                inferred_type,
                inferred_effects,
                ..
            }) => {
                if let CallTarget::Expr(expr) = target {
                    expr.zonk(subst);
                }
                targs.zonk(subst);
                vargs.zonk(subst);
                bargs.zonk(subst);
                inferred_targs.zonk(subst);
                inferred_type.zonk(subst);
                inferred_effects.zonk(subst);
            }
            Expr::Box(BoxExpr { block, inferred_type, .. }) => {
                block.zonk(subst);
                inferred_type.zonk(subst);
            }
            Expr::TryHandle(TryHandle {
                body, handlers, inferred_type, inferred_effects, ..
            }) => {
                body.zonk(subst);
                for handler in handlers {
                    handler.targs.zonk(subst);
                    for clause in &mut handler.clauses {
                        clause.params.zonk(subst);
                        clause.body.zonk(subst);
                    }
                }
                inferred_type.zonk(subst);
                inferred_effects.zonk(subst);
            }
            Expr::Region(RegionExpr { body, inferred_type, inferred_effects, .. }) => {
                body.zonk(subst);
                inferred_type.zonk(subst);
                inferred_effects.zonk(subst);
            }
        }
    }
}

impl Zonk for BlockArg {
    fn zonk(&mut self, subst: &UnifierSubst) {
        match self {
            BlockArg::Var(BlockVarRef { inferred_type, .. }) => inferred_type.zonk(subst),
            BlockArg::Lit(FunLit { vparams, bparams, body, inferred_type, .. }) => {
                vparams.zonk(subst);
                bparams.zonk(subst);
                body.zonk(subst);
                inferred_type.zonk(subst);
            }
            BlockArg::Unbox(UnboxArg { expr, inferred_type, .. }) => {
                expr.zonk(subst);
                inferred_type.zonk(subst);
            }
        }
    }
}
