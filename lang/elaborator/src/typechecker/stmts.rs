//! Bidirectional checking of statements.
//!
//! Statement lists are cons-shaped: every binder carries the rest of the
//! list, and the expected type of the whole list is the expected type of
//! its final `Return`.

use ast::source::*;
use ast::*;

use super::ctx::Ctx;
use super::exprs::{CheckInfer, ExpectTyped};
use crate::result::TcResult;

impl CheckInfer for Stmt {
    fn check(&self, ctx: &mut Ctx, expected: &ValueType) -> TcResult<Self> {
        match self {
            Stmt::Return(s) => Ok(s.check(ctx, expected)?.into()),
            Stmt::Val(s) => Ok(s.check(ctx, expected)?.into()),
            Stmt::Var(s) => Ok(s.check(ctx, expected)?.into()),
            Stmt::Expr(s) => Ok(s.check(ctx, expected)?.into()),
        }
    }

    fn infer(&self, ctx: &mut Ctx) -> TcResult<Self> {
        match self {
            Stmt::Return(s) => Ok(s.infer(ctx)?.into()),
            Stmt::Val(s) => Ok(s.infer(ctx)?.into()),
            Stmt::Var(s) => Ok(s.infer(ctx)?.into()),
            Stmt::Expr(s) => Ok(s.infer(ctx)?.into()),
        }
    }
}

impl CheckInfer for ReturnStmt {
    fn check(&self, ctx: &mut Ctx, expected: &ValueType) -> TcResult<Self> {
        let expr = self.expr.check(ctx, expected)?;
        annotated_return(self, ctx, expr)
    }

    fn infer(&self, ctx: &mut Ctx) -> TcResult<Self> {
        let expr = self.expr.infer(ctx)?;
        annotated_return(self, ctx, expr)
    }
}

fn annotated_return(stmt: &ReturnStmt, _ctx: &mut Ctx, expr: Expr) -> TcResult<ReturnStmt> {
    let tpe = expr.expect_typ()?;
    let effects = expr.expect_effects()?;
    Ok(ReturnStmt {
        span: stmt.span,
        expr,
        inferred_type: Some(tpe),
        inferred_effects: Some(effects),
    })
}

impl CheckInfer for ValStmt {
    fn check(&self, ctx: &mut Ctx, expected: &ValueType) -> TcResult<Self> {
        elaborate_val(self, ctx, Some(expected))
    }

    fn infer(&self, ctx: &mut Ctx) -> TcResult<Self> {
        elaborate_val(self, ctx, None)
    }
}

fn elaborate_val(this: &ValStmt, ctx: &mut Ctx, expected: Option<&ValueType>) -> TcResult<ValStmt> {
    let binding = match &this.annot {
        Some(annot) => this.binding.check(ctx, &annot.dealias())?,
        None => this.binding.infer(ctx)?,
    };
    let bound_type = ctx.unifier.substitute(&binding.expect_typ()?);
    ctx.bind_value(&this.symbol, bound_type);

    let rest = match expected {
        Some(tpe) => this.rest.check(ctx, tpe)?,
        None => this.rest.infer(ctx)?,
    };
    let tpe = rest.expect_typ()?;
    let effects = binding.expect_effects()?.union(&rest.expect_effects()?);
    Ok(ValStmt {
        span: this.span,
        symbol: this.symbol.clone(),
        annot: this.annot.clone(),
        binding,
        rest,
        inferred_type: Some(tpe),
        inferred_effects: Some(effects),
    })
}

impl CheckInfer for VarStmt {
    fn check(&self, ctx: &mut Ctx, expected: &ValueType) -> TcResult<Self> {
        elaborate_var(self, ctx, Some(expected))
    }

    fn infer(&self, ctx: &mut Ctx) -> TcResult<Self> {
        elaborate_var(self, ctx, None)
    }
}

fn elaborate_var(this: &VarStmt, ctx: &mut Ctx, expected: Option<&ValueType>) -> TcResult<VarStmt> {
    let binding = match &this.annot {
        Some(annot) => this.binding.check(ctx, &annot.dealias())?,
        None => this.binding.infer(ctx)?,
    };
    let cell_type = ctx.unifier.substitute(&binding.expect_typ()?);
    ctx.bind_value(&this.symbol, cell_type);
    ctx.mark_mutable(&this.symbol);

    let rest = match expected {
        Some(tpe) => this.rest.check(ctx, tpe)?,
        None => this.rest.infer(ctx)?,
    };
    let tpe = rest.expect_typ()?;
    let effects = binding.expect_effects()?.union(&rest.expect_effects()?);
    Ok(VarStmt {
        span: this.span,
        symbol: this.symbol.clone(),
        annot: this.annot.clone(),
        binding,
        region: this.region.clone(),
        rest,
        inferred_type: Some(tpe),
        inferred_effects: Some(effects),
    })
}

impl CheckInfer for ExprStmt {
    fn check(&self, ctx: &mut Ctx, expected: &ValueType) -> TcResult<Self> {
        elaborate_expr_stmt(self, ctx, Some(expected))
    }

    fn infer(&self, ctx: &mut Ctx) -> TcResult<Self> {
        elaborate_expr_stmt(self, ctx, None)
    }
}

fn elaborate_expr_stmt(this: &ExprStmt, ctx: &mut Ctx, expected: Option<&ValueType>) -> TcResult<ExprStmt> {
    // The value is discarded; only the effects matter.
    let expr = this.expr.infer(ctx)?;
    let rest = match expected {
        Some(tpe) => this.rest.check(ctx, tpe)?,
        None => this.rest.infer(ctx)?,
    };
    let tpe = rest.expect_typ()?;
    let effects = expr.expect_effects()?.union(&rest.expect_effects()?);
    Ok(ExprStmt {
        span: this.span,
        expr,
        rest,
        inferred_type: Some(tpe),
        inferred_effects: Some(effects),
    })
}
