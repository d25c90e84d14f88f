//! Lowering of pure expressions, blocks and implementations.

use ast::lifted::*;
use ast::source::Lit;

use crate::cps::Continuation;
use crate::ml::{self, Param};
use crate::result::BackendResult;
use crate::runtime;

use super::Transformer;

impl Transformer {
    pub(crate) fn transform_expr(&mut self, expr: &Expr) -> BackendResult<ml::Expr> {
        match expr {
            Expr::ValueVar(sym) => Ok(ml::Expr::Variable(self.names.name_of(sym))),
            Expr::Literal(lit) => Ok(lit_to_ml(lit)),
            Expr::PureApp(PureApp { block, targs: _, args }) => {
                // Constructor applications become `Make`; data and record
                // constructors take the same path.
                if let Block::BlockVar(sym) = block {
                    if let Some(info) = self.ctors.get(&sym.id).cloned() {
                        debug_assert_eq!(info.fields, args.len());
                        let name = self.names.name_of(sym);
                        let payload = self.tuple_if_multiple(args)?;
                        return Ok(ml::Expr::Make {
                            ctor: name,
                            payload: payload.map(Box::new),
                        });
                    }
                }
                let fun = self.transform_block(block)?;
                let args = args
                    .iter()
                    .map(|arg| self.transform_expr(arg))
                    .collect::<BackendResult<Vec<_>>>()?;
                Ok(ml::Expr::call(fun, args))
            }
            Expr::Select(Select { receiver, field }) => {
                let accessor = self.names.name_of(field);
                let receiver = self.transform_expr(receiver)?;
                Ok(ml::Expr::call(ml::Expr::var(accessor), vec![receiver]))
            }
            // Boxing is the identity at the target level. This is not
            // sound against a nominal target; see the design notes.
            Expr::Box(BoxExpr { block }) => self.transform_block(block),
            Expr::Run(Run { term }) => Ok(self.transform_term(term)?.run()),
        }
    }

    pub(crate) fn transform_block(&mut self, block: &Block) -> BackendResult<ml::Expr> {
        match block {
            Block::BlockVar(sym) => Ok(ml::Expr::Variable(self.names.name_of(sym))),
            Block::BlockLit(lit) => self.transform_block_lit(lit),
            Block::Member(Member { receiver, op }) => {
                let accessor = self.member_accessor(op)?;
                let receiver = self.transform_block(receiver)?;
                Ok(ml::Expr::call(ml::Expr::var(accessor), vec![receiver]))
            }
            // Unboxing is the identity, like boxing.
            Block::Unbox(expr) => self.transform_expr(expr),
            Block::New(implementation) => self.transform_implementation(implementation),
        }
    }

    /// `λ(p₁, …, pₙ, k). body(k)` — the continuation is the trailing
    /// parameter.
    pub(crate) fn transform_block_lit(&mut self, lit: &BlockLit) -> BackendResult<ml::Expr> {
        let mut params: Vec<Param> =
            lit.params.iter().map(|p| Param::Named(self.names.name_of(&p.id))).collect();
        let k = self.names.fresh("k");
        params.push(Param::Named(k.clone()));
        let body =
            self.transform_term(&lit.body)?.apply(Continuation::Dynamic(ml::Expr::var(k)));
        Ok(ml::Expr::lambda(params, body))
    }

    /// A capability is an object: the tuple of its operations, wrapped in
    /// the arity-shared constructor.
    pub(crate) fn transform_implementation(
        &mut self,
        implementation: &Implementation,
    ) -> BackendResult<ml::Expr> {
        let arity = implementation.operations.len();
        let info = self.object_info(arity);
        let ops = implementation
            .operations
            .iter()
            .map(|op| self.transform_block(&op.implementation))
            .collect::<BackendResult<Vec<_>>>()?;
        let payload = match ops.len() {
            0 => None,
            1 => Some(Box::new(ops.into_iter().next().expect("one operation"))),
            _ => Some(Box::new(ml::Expr::Tuple(ops))),
        };
        Ok(ml::Expr::Make { ctor: info.type_name, payload })
    }

    fn tuple_if_multiple(&mut self, args: &[Expr]) -> BackendResult<Option<ml::Expr>> {
        let mut parts = args
            .iter()
            .map(|arg| self.transform_expr(arg))
            .collect::<BackendResult<Vec<_>>>()?;
        Ok(match parts.len() {
            0 => None,
            1 => Some(parts.remove(0)),
            _ => Some(ml::Expr::Tuple(parts)),
        })
    }
}

/// Literals. Negative numerals use the target's unary minus.
pub(crate) fn lit_to_ml(lit: &Lit) -> ml::Expr {
    match lit {
        Lit::Int(value) if *value < 0 => {
            ml::Expr::RawValue(format!("~{}", value.unsigned_abs()))
        }
        Lit::Int(value) => ml::Expr::RawValue(value.to_string()),
        Lit::Bool(true) => ml::Expr::var(runtime::TRUE_VAL),
        Lit::Bool(false) => ml::Expr::var(runtime::FALSE_VAL),
        Lit::Unit => ml::Expr::var(runtime::UNIT_VAL),
        Lit::Double(value) if value.into_inner() < 0.0 => {
            ml::Expr::RawValue(format!("~{}", -value.into_inner()))
        }
        Lit::Double(value) => ml::Expr::RawValue(value.to_string()),
        Lit::String(value) => ml::Expr::MLString(value.clone()),
    }
}
