//! Free symbol occurrences of lifted-IR fragments.
//!
//! Symbols are globally unique, so there is no shadowing: the free
//! symbols of a fragment are simply all symbols it mentions. The back end
//! intersects them with the ids of a definition group to compute the
//! dependency graph for topological emission.

use crate::lifted::*;
use crate::symbols::SymbolId;
use crate::HashSet;

pub trait FreeVars {
    fn free_vars(&self, acc: &mut HashSet<SymbolId>);

    fn free_var_set(&self) -> HashSet<SymbolId> {
        let mut acc = HashSet::default();
        self.free_vars(&mut acc);
        acc
    }
}

impl<T: FreeVars> FreeVars for Box<T> {
    fn free_vars(&self, acc: &mut HashSet<SymbolId>) {
        (**self).free_vars(acc)
    }
}

impl<T: FreeVars> FreeVars for Option<T> {
    fn free_vars(&self, acc: &mut HashSet<SymbolId>) {
        if let Some(inner) = self {
            inner.free_vars(acc)
        }
    }
}

impl<T: FreeVars> FreeVars for Vec<T> {
    fn free_vars(&self, acc: &mut HashSet<SymbolId>) {
        for item in self {
            item.free_vars(acc)
        }
    }
}

impl FreeVars for Term {
    fn free_vars(&self, acc: &mut HashSet<SymbolId>) {
        match self {
            Term::Return(Return { expr }) => expr.free_vars(acc),
            Term::App(App { block, targs: _, args }) => {
                block.free_vars(acc);
                args.free_vars(acc);
            }
            Term::If(If { cond, then_term, else_term }) => {
                cond.free_vars(acc);
                then_term.free_vars(acc);
                else_term.free_vars(acc);
            }
            Term::Val(Val { id: _, binding, body }) => {
                binding.free_vars(acc);
                body.free_vars(acc);
            }
            Term::Match(Match { scrutinee, clauses, default }) => {
                scrutinee.free_vars(acc);
                clauses.free_vars(acc);
                default.free_vars(acc);
            }
            Term::Hole => {}
            Term::Scope(Scope { definitions, body }) => {
                definitions.free_vars(acc);
                body.free_vars(acc);
            }
            Term::State(State { id: _, init, region: _, evidence, body }) => {
                init.free_vars(acc);
                evidence.free_vars(acc);
                body.free_vars(acc);
            }
            Term::Try(Try { body, handlers }) => {
                body.free_vars(acc);
                handlers.free_vars(acc);
            }
            Term::Shift(Shift { evidence, body }) => {
                evidence.free_vars(acc);
                body.free_vars(acc);
            }
            Term::Region(RegionTerm { body }) => body.free_vars(acc),
        }
    }
}

impl FreeVars for Expr {
    fn free_vars(&self, acc: &mut HashSet<SymbolId>) {
        match self {
            Expr::ValueVar(sym) => {
                acc.insert(sym.id);
            }
            Expr::Literal(_) => {}
            Expr::PureApp(PureApp { block, targs: _, args }) => {
                block.free_vars(acc);
                args.free_vars(acc);
            }
            Expr::Select(Select { receiver, field: _ }) => receiver.free_vars(acc),
            Expr::Box(BoxExpr { block }) => block.free_vars(acc),
            Expr::Run(Run { term }) => term.free_vars(acc),
        }
    }
}

impl FreeVars for Block {
    fn free_vars(&self, acc: &mut HashSet<SymbolId>) {
        match self {
            Block::BlockVar(sym) => {
                acc.insert(sym.id);
            }
            Block::BlockLit(lit) => lit.free_vars(acc),
            Block::Member(Member { receiver, op: _ }) => receiver.free_vars(acc),
            Block::Unbox(expr) => expr.free_vars(acc),
            Block::New(implementation) => implementation.free_vars(acc),
        }
    }
}

impl FreeVars for BlockLit {
    fn free_vars(&self, acc: &mut HashSet<SymbolId>) {
        self.body.free_vars(acc)
    }
}

impl FreeVars for Clause {
    fn free_vars(&self, acc: &mut HashSet<SymbolId>) {
        self.body.free_vars(acc)
    }
}

impl FreeVars for Argument {
    fn free_vars(&self, acc: &mut HashSet<SymbolId>) {
        match self {
            Argument::Expr(expr) => expr.free_vars(acc),
            Argument::Block(block) => block.free_vars(acc),
            Argument::Evidence(evidence) => evidence.free_vars(acc),
        }
    }
}

impl FreeVars for Evidence {
    fn free_vars(&self, acc: &mut HashSet<SymbolId>) {
        for lift in &self.lifts {
            if let Lift::Var(sym) = lift {
                acc.insert(sym.id);
            }
        }
    }
}

impl FreeVars for Implementation {
    fn free_vars(&self, acc: &mut HashSet<SymbolId>) {
        for op in &self.operations {
            op.implementation.free_vars(acc);
        }
    }
}

impl FreeVars for Definition {
    fn free_vars(&self, acc: &mut HashSet<SymbolId>) {
        match self {
            Definition::Def(Def { id: _, block }) => block.free_vars(acc),
            Definition::Let(Let { id: _, expr }) => expr.free_vars(acc),
        }
    }
}
