//! CPS lowering of statement-level terms.

use ast::lifted::*;

use crate::cps::{self, Cps};
use crate::ml::{self, Param};
use crate::result::BackendResult;
use crate::runtime;

use super::Transformer;

impl Transformer {
    pub(crate) fn transform_term(&mut self, term: &Term) -> BackendResult<Cps> {
        match term {
            Term::Return(Return { expr }) => Ok(Cps::pure(self.transform_expr(expr)?)),

            Term::App(app) => {
                if let Some(access) = self.try_state_access(app)? {
                    return Ok(access);
                }
                let fun = self.transform_block(&app.block)?;
                let args = app
                    .args
                    .iter()
                    .map(|arg| self.transform_argument(arg))
                    .collect::<BackendResult<Vec<_>>>()?;
                let names = self.names.clone();
                Ok(Cps::inline(move |k| {
                    let mut args = args.clone();
                    args.push(k.reify(&names));
                    ml::Expr::call(fun.clone(), args)
                }))
            }

            Term::If(If { cond, then_term, else_term }) => {
                let cond = self.transform_expr(cond)?;
                let then_cps = self.transform_term(then_term)?;
                let else_cps = self.transform_term(else_term)?;
                Ok(Cps::join(&self.names, move |k| {
                    ml::Expr::if_else(
                        cond.clone(),
                        then_cps.apply(k.clone()),
                        else_cps.apply(k),
                    )
                }))
            }

            Term::Val(Val { id, binding, body }) => {
                let binding = self.transform_term(binding)?;
                let body = self.transform_term(body)?;
                let name = self.names.name_of(id);
                Ok(binding.flat_map(move |value| {
                    let body = body.clone();
                    let name = name.clone();
                    Cps::inline(move |k| {
                        ml::Expr::let_in(
                            vec![ml::Binding::ValBind { name: name.clone(), expr: value.clone() }],
                            body.apply(k),
                        )
                    })
                }))
            }

            Term::Match(Match { scrutinee, clauses, default }) => {
                let scrutinee = self.transform_expr(scrutinee)?;
                let mut lowered = Vec::with_capacity(clauses.len());
                for clause in clauses {
                    let pattern = ml::Pattern::Ctor {
                        name: self.names.name_of(&clause.ctor),
                        args: clause
                            .body
                            .params
                            .iter()
                            .map(|p| ml::Pattern::Var(self.names.name_of(&p.id)))
                            .collect(),
                    };
                    let body = self.transform_term(&clause.body.body)?;
                    lowered.push((pattern, body));
                }
                let default = match default {
                    Some(term) => Some(self.transform_term(term)?),
                    None => None,
                };
                Ok(Cps::join(&self.names, move |k| ml::Expr::Match {
                    scrutinee: Box::new(scrutinee.clone()),
                    clauses: lowered
                        .iter()
                        .map(|(pattern, body)| ml::MatchClause {
                            pattern: pattern.clone(),
                            body: body.apply(k.clone()),
                        })
                        .collect(),
                    default: default.as_ref().map(|cps| Box::new(cps.apply(k.clone()))),
                }))
            }

            Term::Hole => Ok(Cps::inline(|_k| ml::Expr::RawExpr("raise Hole".to_owned()))),

            Term::Scope(Scope { definitions, body }) => {
                let bindings = self.transform_definitions(definitions)?;
                let body = self.transform_term(body)?;
                Ok(Cps::inline(move |k| {
                    ml::Expr::let_in(bindings.clone(), body.apply(k))
                }))
            }

            Term::State(state) => self.transform_state(state),

            Term::Try(Try { body, handlers }) => {
                let body = self.transform_block(body)?;
                let handlers = handlers
                    .iter()
                    .map(|handler| self.transform_implementation(handler))
                    .collect::<BackendResult<Vec<_>>>()?;
                let names = self.names.clone();
                Ok(Cps::inline(move |k| {
                    let mut args = vec![ml::Expr::var(runtime::LIFT)];
                    args.extend(handlers.clone());
                    let installed = ml::Expr::call(body.clone(), args);
                    ml::Expr::call(cps::reset(&names, installed), vec![k.reify(&names)])
                }))
            }

            Term::Shift(shift) => self.transform_shift(shift),

            Term::Region(RegionTerm { body }) => {
                let body = self.transform_block(body)?;
                let names = self.names.clone();
                Ok(Cps::inline(move |k| {
                    ml::Expr::call(
                        ml::Expr::call(ml::Expr::var(runtime::WITH_REGION), vec![body.clone()]),
                        vec![k.reify(&names)],
                    )
                }))
            }
        }
    }

    /// `get`/`put` on a state cell in scope bypass the evidence entirely:
    /// the cell is directly accessible as a target-level ref.
    fn try_state_access(&mut self, app: &App) -> BackendResult<Option<Cps>> {
        let Block::Member(Member { receiver, op }) = &app.block else {
            return Ok(None);
        };
        let Block::BlockVar(cell) = &**receiver else {
            return Ok(None);
        };
        if !self.state_cells.contains(&cell.id) {
            return Ok(None);
        }
        let cell_var = ml::Expr::Variable(self.names.name_of(cell));
        match (op.name.id.as_str(), app.args.as_slice()) {
            ("get", [Argument::Evidence(_)]) => {
                Ok(Some(Cps::pure(ml::Expr::Deref(Box::new(cell_var)))))
            }
            ("put", [Argument::Evidence(_), Argument::Expr(value)]) => {
                let value = self.transform_expr(value)?;
                Ok(Some(Cps::pure(ml::Expr::Assign {
                    cell: Box::new(cell_var),
                    value: Box::new(value),
                })))
            }
            _ => Ok(None),
        }
    }

    fn transform_state(&mut self, state: &State) -> BackendResult<Cps> {
        let State { id, init, region, evidence: _, body } = state;
        let init = self.transform_expr(init)?;
        self.state_cells.insert(id.id);
        let body = self.transform_term(body);
        self.state_cells.remove(&id.id);
        let body = body?;
        let name = self.names.name_of(id);

        let cell = match region {
            // Cells in the global region are plain refs.
            StateRegion::Global => ml::Expr::Ref(Box::new(init)),
            // Cells in a local region are allocated into it.
            StateRegion::Local(region) => ml::Expr::call(
                ml::Expr::var(runtime::FRESH),
                vec![ml::Expr::Variable(self.names.name_of(region)), init],
            ),
        };
        Ok(Cps::inline(move |k| {
            ml::Expr::let_in(
                vec![ml::Binding::ValBind { name: name.clone(), expr: cell.clone() }],
                body.apply(k),
            )
        }))
    }

    /// `shift` captures the continuation up to the prompt selected by the
    /// evidence. The continuation handed to the body takes an evidence
    /// argument of its own, so handlers can resume below further lifts.
    fn transform_shift(&mut self, shift: &Shift) -> BackendResult<Cps> {
        let Shift { evidence, body } = shift;
        let [kparam] = body.params.as_slice() else {
            // Malformed IR; this is a compiler bug, not a user error.
            panic!("shift must bind exactly one block parameter, the continuation");
        };
        let kname = self.names.name_of(&kparam.id);
        let inner = self.transform_term(&body.body)?;
        let names = self.names.clone();

        let m = Cps::inline(move |k1| {
            let ev = names.fresh("ev");
            let a = names.fresh("a");
            let k1_reified = k1.reify(&names);
            let continuation = ml::Expr::lambda(
                vec![Param::Named(ev.clone()), Param::Named(a.clone())],
                ml::Expr::call(
                    ml::Expr::var(ev),
                    vec![ml::Expr::call(k1_reified, vec![ml::Expr::var(a)])],
                ),
            );
            ml::Expr::let_in(
                vec![ml::Binding::ValBind { name: kname.clone(), expr: continuation }],
                inner.reify(&names),
            )
        });
        Ok(self.lift(&evidence.lifts, m))
    }

    pub(crate) fn transform_argument(&mut self, arg: &Argument) -> BackendResult<ml::Expr> {
        match arg {
            Argument::Expr(expr) => self.transform_expr(expr),
            Argument::Block(block) => self.transform_block(block),
            Argument::Evidence(evidence) => Ok(self.evidence_expr(evidence)),
        }
    }
}
