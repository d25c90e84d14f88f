//! Lowering of evidence.
//!
//! Evidence appears in two positions. Passed as an *argument*, it is
//! lowered to a composition of runtime lift functions under `nested`,
//! with `here` as the empty path. Wrapped around a `shift` (or any other
//! computation), it is interleaved *statically* with the continuation
//! plumbing so that each `try` prompt captures exactly its delimited
//! slice. The runtime primitives are external and never inlined.

use std::rc::Rc;

use ast::lifted::Lift;

use crate::cps::Cps;
use crate::ml::{self, Param};
use crate::runtime;

use super::Transformer;

impl Transformer {
    /// Evidence in argument position:
    /// `[]` is `here`, `[e]` is `e`, and longer paths compose under
    /// `nested`, left-associated.
    pub(crate) fn evidence_expr(&mut self, evidence: &ast::lifted::Evidence) -> ml::Expr {
        match evidence.lifts.as_slice() {
            [] => ml::Expr::var(runtime::HERE),
            [lift] => self.lift_expr(lift),
            [first, rest @ ..] => {
                let rest = self.evidence_expr(&ast::lifted::Evidence { lifts: rest.to_vec() });
                ml::Expr::call(
                    ml::Expr::var(runtime::NESTED),
                    vec![self.lift_expr(first), rest],
                )
            }
        }
    }

    fn lift_expr(&mut self, lift: &Lift) -> ml::Expr {
        match lift {
            Lift::Try => ml::Expr::var(runtime::LIFT),
            // Regions are currently approximated by an ordinary lift.
            Lift::Reg => ml::Expr::var(runtime::LIFT),
            Lift::Var(sym) => ml::Expr::Variable(self.names.name_of(sym)),
        }
    }

    /// Thread a computation through a list of lifts, outermost first.
    pub(crate) fn lift(&mut self, lifts: &[Lift], m: Cps) -> Cps {
        let mut out = m;
        for lift in lifts.iter().rev() {
            out = self.lift_one(lift, out);
        }
        out
    }

    fn lift_one(&mut self, lift: &Lift, m: Cps) -> Cps {
        match lift {
            // `λk₁. λk₂. m(a ↦ k₁(a)(k₂))`: the lifted computation takes
            // one continuation per crossed prompt.
            Lift::Try | Lift::Reg => {
                let names = self.names.clone();
                Cps::inline(move |k1| {
                    let k2 = names.fresh("k");
                    let k1_reified = k1.reify(&names);
                    let m_applied = m.apply(crate::cps::Continuation::Static(Rc::new({
                        let k2 = k2.clone();
                        move |a| {
                            ml::Expr::call(
                                k1_reified.clone(),
                                vec![a, ml::Expr::var(k2.clone())],
                            )
                        }
                    })));
                    ml::Expr::lambda(vec![Param::Named(k2)], m_applied)
                })
            }
            // An evidence parameter is a runtime lift function: apply it
            // to the reified computation.
            Lift::Var(sym) => {
                let names = self.names.clone();
                let var = ml::Expr::Variable(self.names.name_of(sym));
                Cps::inline(move |k| {
                    ml::Expr::call(
                        ml::Expr::call(var.clone(), vec![m.reify(&names)]),
                        vec![k.reify(&names)],
                    )
                })
            }
        }
    }
}
