//! The core solving logic.
//!
//! Obligations are discharged eagerly. Both sides are first resolved
//! against the current substitution and dealiased, then compared
//! structurally: rigid heads by symbol identity, arguments invariantly,
//! effect rows by set equality (unifying the arguments of matching
//! heads). `Bottom` is a subtype of everything; apart from that,
//! subtyping only differs from equality in the variance of function
//! parameters and results.

use ast::*;
use printer::Print;

use super::{UnifyError, Unifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variance {
    /// Left must be a subtype of right
    Covariant,
    /// Both sides must be equal
    Invariant,
}

impl Variance {
    fn failure(self, left: &ValueType, right: &ValueType) -> UnifyError {
        match self {
            Variance::Covariant => UnifyError::NotSubtype {
                left: left.print_trace(),
                right: right.print_trace(),
            },
            Variance::Invariant => UnifyError::NotEqual {
                left: left.print_trace(),
                right: right.print_trace(),
            },
        }
    }
}

impl Unifier {
    /// Record the obligation that `sub` is usable where `sup` is
    /// expected.
    pub fn require_subtype(&mut self, sub: &ValueType, sup: &ValueType) -> Result<(), UnifyError> {
        self.unify_value(sub, sup, Variance::Covariant)
    }

    pub fn require_equal(&mut self, lhs: &ValueType, rhs: &ValueType) -> Result<(), UnifyError> {
        self.unify_value(lhs, rhs, Variance::Invariant)
    }

    pub fn require_subtype_block(
        &mut self,
        sub: &BlockType,
        sup: &BlockType,
    ) -> Result<(), UnifyError> {
        self.unify_block(sub, sup, Variance::Covariant)
    }

    pub fn require_equal_block(
        &mut self,
        lhs: &BlockType,
        rhs: &BlockType,
    ) -> Result<(), UnifyError> {
        self.unify_block(lhs, rhs, Variance::Invariant)
    }

    fn unify_value(
        &mut self,
        sub: &ValueType,
        sup: &ValueType,
        variance: Variance,
    ) -> Result<(), UnifyError> {
        let sub = self.resolve(sub);
        let sup = self.resolve(sup);

        match (&sub, &sup) {
            (ValueType::Unification(a), ValueType::Unification(b)) if a == b => Ok(()),
            (ValueType::Unification(a), _) => self.solve_value(*a, &sup),
            (_, ValueType::Unification(b)) => self.solve_value(*b, &sub),
            (ValueType::Bottom, _) if variance == Variance::Covariant => Ok(()),
            (ValueType::Bottom, ValueType::Bottom) => Ok(()),
            (ValueType::Builtin(a), ValueType::Builtin(b)) if a == b => Ok(()),
            (ValueType::Var(a), ValueType::Var(b)) if a == b => Ok(()),
            (ValueType::Constructor(a), ValueType::Constructor(b)) if a.symbol == b.symbol => {
                if a.args.len() != b.args.len() {
                    return Err(variance.failure(&sub, &sup));
                }
                // Constructors are invariant in their arguments.
                for (arg_a, arg_b) in a.args.iter().zip(&b.args) {
                    self.unify_value(arg_a, arg_b, Variance::Invariant)?;
                }
                Ok(())
            }
            (ValueType::Boxed(a), ValueType::Boxed(b)) => {
                self.unify_block(&a.block, &b.block, variance)?;
                match variance {
                    Variance::Covariant => self.require_subregion(&a.captures, &b.captures),
                    Variance::Invariant => self.require_captures_equal(&a.captures, &b.captures),
                }
            }
            _ => Err(variance.failure(&sub, &sup)),
        }
    }

    fn unify_block(
        &mut self,
        sub: &BlockType,
        sup: &BlockType,
        variance: Variance,
    ) -> Result<(), UnifyError> {
        match (sub, sup) {
            (BlockType::Function(f_sub), BlockType::Function(f_sup)) => {
                self.unify_function(f_sub, f_sup, variance)
            }
            (BlockType::Interface(i_sub), BlockType::Interface(i_sup))
                if i_sub.symbol == i_sup.symbol && i_sub.args.len() == i_sup.args.len() =>
            {
                for (arg_a, arg_b) in i_sub.args.iter().zip(&i_sup.args) {
                    self.unify_value(arg_a, arg_b, Variance::Invariant)?;
                }
                Ok(())
            }
            _ => Err(UnifyError::NotSubtype {
                left: sub.print_trace(),
                right: sup.print_trace(),
            }),
        }
    }

    fn unify_function(
        &mut self,
        sub: &FunctionType,
        sup: &FunctionType,
        variance: Variance,
    ) -> Result<(), UnifyError> {
        let mismatch = || UnifyError::NotSubtype {
            left: sub.print_trace(),
            right: sup.print_trace(),
        };
        if sub.tparams.len() != sup.tparams.len()
            || sub.cparams.len() != sup.cparams.len()
            || sub.vparams.len() != sup.vparams.len()
            || sub.bparams.len() != sup.bparams.len()
        {
            return Err(mismatch());
        }

        // Alpha-rename the subtype's parameters to the supertype's, then
        // compare componentwise. Symbols are globally unique, so the
        // renaming cannot capture.
        let mut renaming = TypeSubst::assigning(
            &sub.tparams,
            &sup.tparams.iter().map(|p| ValueType::Var(p.clone())).collect::<Vec<_>>(),
        );
        for (c_sub, c_sup) in sub.cparams.iter().zip(&sup.cparams) {
            renaming.add_capture(c_sub, Captures::singleton(Capture::Param(c_sup.id)));
        }
        let sub = sub.subst(&renaming);

        for (p_sub, p_sup) in sub.vparams.iter().zip(&sup.vparams) {
            // Parameters are contravariant: the sides swap.
            self.unify_value(p_sup, p_sub, variance)?;
        }
        for (p_sub, p_sup) in sub.bparams.iter().zip(&sup.bparams) {
            self.unify_block(p_sup, p_sub, variance)?;
        }
        self.unify_value(&sub.result, &sup.result, variance)?;
        self.require_effects_equal(&sub.effects, &sup.effects)
    }

    /// Effect constructors are invariant: rows must agree as sets. Rows
    /// are matched by head symbol; the arguments of matching heads are
    /// unified pairwise.
    pub fn require_effects_equal(
        &mut self,
        lhs: &Effects,
        rhs: &Effects,
    ) -> Result<(), UnifyError> {
        let lhs = self.substitute_effects(lhs).dealias();
        let rhs = self.substitute_effects(rhs).dealias();
        let mismatch = || UnifyError::EffectsMismatch {
            left: lhs.print_trace(),
            right: rhs.print_trace(),
        };

        if lhs.len() != rhs.len() {
            return Err(mismatch());
        }
        let mut remaining: Vec<&Effect> = rhs.iter().collect();
        for eff in lhs.iter() {
            let position = remaining
                .iter()
                .position(|candidate| match (eff, candidate) {
                    (Effect::Builtin(a), Effect::Builtin(b)) => a == b,
                    _ => match (eff.head(), candidate.head()) {
                        (Some(a), Some(b)) => a == b,
                        _ => false,
                    },
                })
                .ok_or_else(mismatch)?;
            let matched = remaining.remove(position);
            if let (Effect::Apply(a), Effect::Apply(b)) = (eff, matched) {
                if a.args.len() != b.args.len() {
                    return Err(mismatch());
                }
                for (arg_a, arg_b) in a.args.iter().zip(&b.args) {
                    self.unify_value(arg_a, arg_b, Variance::Invariant)?;
                }
            }
        }
        Ok(())
    }

    /// Capture sets: `sub` must be contained in `sup`. A side consisting
    /// of a single unification variable is solved against the other.
    pub fn require_subregion(&mut self, sub: &Captures, sup: &Captures) -> Result<(), UnifyError> {
        let sub = self.substitute_captures(sub);
        let sup = self.substitute_captures(sup);
        if let Some(var) = single_capture_var(&sup) {
            self.solutions_mut().captures.insert(var.id, sub);
            return Ok(());
        }
        if let Some(var) = single_capture_var(&sub) {
            self.solutions_mut().captures.insert(var.id, sup);
            return Ok(());
        }
        if sub.is_subset(&sup) {
            Ok(())
        } else {
            Err(UnifyError::NotSubcapture {
                left: sub.print_trace(),
                right: sup.print_trace(),
            })
        }
    }

    pub fn require_captures_equal(
        &mut self,
        lhs: &Captures,
        rhs: &Captures,
    ) -> Result<(), UnifyError> {
        let lhs = self.substitute_captures(lhs);
        let rhs = self.substitute_captures(rhs);
        if lhs == rhs {
            return Ok(());
        }
        if let Some(var) = single_capture_var(&rhs) {
            self.solutions_mut().captures.insert(var.id, lhs);
            return Ok(());
        }
        if let Some(var) = single_capture_var(&lhs) {
            self.solutions_mut().captures.insert(var.id, rhs);
            return Ok(());
        }
        Err(UnifyError::NotSubcapture { left: lhs.print_trace(), right: rhs.print_trace() })
    }

    /// Follow the substitution at the root and expand aliases, so that
    /// pattern matching sees the actual head.
    fn resolve(&self, tpe: &ValueType) -> ValueType {
        let mut current = tpe.clone();
        loop {
            current = match current {
                ValueType::Unification(var) => match self.subst().solution(var.id) {
                    Some(solution) => solution.clone(),
                    None => return ValueType::Unification(var),
                },
                ValueType::Alias(app) => app.expand(),
                other => return other,
            };
        }
    }

    fn solve_value(&mut self, var: UniVar, tpe: &ValueType) -> Result<(), UnifyError> {
        let tpe = self.substitute(tpe);
        if let ValueType::Unification(other) = &tpe {
            if *other == var {
                return Ok(());
            }
            // Solve the deeper-scoped variable in terms of the shallower
            // one, so that solutions never dangle into closed scopes.
            if other.scope > var.scope {
                self.solutions_mut().values.insert(other.id, ValueType::Unification(var));
                return Ok(());
            }
        }
        if occurs(var.id, &tpe) {
            return Err(UnifyError::OccursCheck { var: var.id, tpe: tpe.print_trace() });
        }
        self.solutions_mut().values.insert(var.id, tpe);
        Ok(())
    }
}

/// Does the unification variable with the given id occur in `tpe`?
/// Assumes `tpe` has been substituted.
pub(crate) fn occurs(var_id: u64, tpe: &ValueType) -> bool {
    match tpe {
        ValueType::Unification(v) => v.id == var_id,
        ValueType::Var(_) | ValueType::Builtin(_) | ValueType::Bottom => false,
        ValueType::Constructor(app) => app.args.iter().any(|arg| occurs(var_id, arg)),
        ValueType::Boxed(boxed) => occurs_block(var_id, &boxed.block),
        ValueType::Alias(app) => occurs(var_id, &app.expand()),
    }
}

fn occurs_block(var_id: u64, tpe: &BlockType) -> bool {
    match tpe {
        BlockType::Function(ft) => {
            ft.vparams.iter().any(|p| occurs(var_id, p))
                || ft.bparams.iter().any(|p| occurs_block(var_id, p))
                || occurs(var_id, &ft.result)
                || ft.effects.iter().any(|eff| match eff {
                    Effect::Apply(iface) => iface.args.iter().any(|arg| occurs(var_id, arg)),
                    Effect::Alias(app) => app.args.iter().any(|arg| occurs(var_id, arg)),
                    Effect::Interface(_) | Effect::Builtin(_) => false,
                })
        }
        BlockType::Interface(iface) => iface.args.iter().any(|arg| occurs(var_id, arg)),
    }
}

fn single_capture_var(captures: &Captures) -> Option<CaptureVar> {
    let mut iter = captures.iter();
    match (iter.next(), iter.next()) {
        (Some(Capture::Unification(var)), None) => Some(*var),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tycon(id: u32, name: &str) -> Symbol {
        Symbol::new(id, name, SymbolKind::Type)
    }

    fn list_of(elem: ValueType) -> ValueType {
        ValueType::Constructor(TypeApp { symbol: tycon(100, "List"), args: vec![elem] })
    }

    fn int() -> ValueType {
        ValueType::Builtin(Builtin::Int)
    }

    fn bool_type() -> ValueType {
        ValueType::Builtin(Builtin::Bool)
    }

    fn fun(vparams: Vec<ValueType>, result: ValueType, effects: Effects) -> FunctionType {
        FunctionType {
            tparams: vec![],
            cparams: vec![],
            vparams,
            bparams: vec![],
            result,
            effects,
        }
    }

    #[test]
    fn test_solve_simple() {
        let mut unifier = Unifier::new();
        unifier.enter_scope();
        let var = unifier.fresh_value_var();
        unifier.require_equal(&var, &int()).unwrap();
        assert_eq!(unifier.substitute(&var), int());
    }

    #[test]
    fn test_solve_under_constructor() {
        let mut unifier = Unifier::new();
        unifier.enter_scope();
        let var = unifier.fresh_value_var();
        unifier.require_subtype(&list_of(var.clone()), &list_of(int())).unwrap();
        assert_eq!(unifier.substitute(&var), int());
    }

    #[test]
    fn test_deeper_solved_into_shallower() {
        let mut unifier = Unifier::new();
        unifier.enter_scope();
        let outer = unifier.fresh_value_var();
        unifier.enter_scope();
        let inner = unifier.fresh_value_var();
        unifier.require_equal(&inner, &outer).unwrap();

        let ValueType::Unification(outer_var) = outer else { unreachable!() };
        let ValueType::Unification(inner_var) = inner else { unreachable!() };
        assert!(unifier.subst().solution(outer_var.id).is_none());
        assert_eq!(
            unifier.subst().solution(inner_var.id),
            Some(&ValueType::Unification(outer_var))
        );
    }

    #[test]
    fn test_occurs_check() {
        let mut unifier = Unifier::new();
        unifier.enter_scope();
        let var = unifier.fresh_value_var();
        let err = unifier.require_equal(&var, &list_of(var.clone())).unwrap_err();
        assert!(matches!(err, UnifyError::OccursCheck { .. }));
    }

    #[test]
    fn test_escaping_skolem() {
        let mut unifier = Unifier::new();
        unifier.enter_scope();
        let var = unifier.fresh_value_var();
        let escaping = list_of(var);
        let err = unifier.leave_scope(&[&escaping]).unwrap_err();
        assert!(matches!(err, UnifyError::EscapingSkolem { .. }));
    }

    #[test]
    fn test_leave_scope_solved_is_fine() {
        let mut unifier = Unifier::new();
        unifier.enter_scope();
        let var = unifier.fresh_value_var();
        unifier.require_equal(&var, &int()).unwrap();
        let escaping = list_of(var);
        unifier.leave_scope(&[&escaping]).unwrap();
    }

    #[test]
    fn test_bottom_is_subtype() {
        let mut unifier = Unifier::new();
        unifier.require_subtype(&ValueType::Bottom, &list_of(int())).unwrap();
        let err = unifier.require_equal(&ValueType::Bottom, &int()).unwrap_err();
        assert!(matches!(err, UnifyError::NotEqual { .. }));
    }

    #[test]
    fn test_join() {
        let mut unifier = Unifier::new();
        assert_eq!(unifier.join(&[ValueType::Bottom, int()]).unwrap(), int());
        assert_eq!(unifier.join(&[int(), ValueType::Bottom, int()]).unwrap(), int());
        assert!(unifier.join(&[int(), bool_type()]).is_err());
    }

    #[test]
    fn test_instantiate_arity() {
        let mut unifier = Unifier::new();
        unifier.enter_scope();
        let param = tycon(1, "A");
        let ft = FunctionType {
            tparams: vec![param.clone()],
            cparams: vec![],
            vparams: vec![ValueType::Var(param.clone())],
            bparams: vec![],
            result: ValueType::Var(param),
            effects: Effects::empty(),
        };
        let (targs, cargs, inst) = unifier.instantiate(&ft, None).unwrap();
        assert_eq!(targs.len(), 1);
        assert!(cargs.is_empty());
        assert!(inst.tparams.is_empty());
        assert_eq!(inst.vparams[0], targs[0]);
        assert_eq!(inst.result, targs[0]);

        let err = unifier.instantiate(&ft, Some(&[int(), int()])).unwrap_err();
        assert!(matches!(err, UnifyError::TypeArgsArity { expected: 1, actual: 2 }));
    }

    #[test]
    fn test_function_subtyping_variance() {
        let mut unifier = Unifier::new();
        // (Int) => Nothing <: (Int) => Int, by covariance of the result.
        let sub = fun(vec![int()], ValueType::Bottom, Effects::empty());
        let sup = fun(vec![int()], int(), Effects::empty());
        unifier
            .require_subtype_block(
                &BlockType::Function(Box::new(sub)),
                &BlockType::Function(Box::new(sup)),
            )
            .unwrap();
    }

    #[test]
    fn test_effect_rows_match_as_sets() {
        let mut unifier = Unifier::new();
        unifier.enter_scope();
        let exc = tycon(7, "Exc");
        let state = tycon(8, "State");
        let var = unifier.fresh_value_var();

        let lhs = Effects::from_effects(vec![
            Effect::Interface(exc.clone()),
            Effect::Apply(InterfaceType { symbol: state.clone(), args: vec![var.clone()] }),
        ]);
        let rhs = Effects::from_effects(vec![
            Effect::Apply(InterfaceType { symbol: state, args: vec![int()] }),
            Effect::Interface(exc),
        ]);
        unifier.require_effects_equal(&lhs, &rhs).unwrap();
        assert_eq!(unifier.substitute(&var), int());
    }

    #[test]
    fn test_aliases_are_expanded_before_comparison() {
        let mut unifier = Unifier::new();
        let alias = TypeAlias {
            name: tycon(9, "Id"),
            params: vec![tycon(10, "A")],
            rhs: ValueType::Var(tycon(10, "A")),
        };
        let applied = ValueType::Alias(TypeAliasApp { alias: Box::new(alias), args: vec![int()] });
        unifier.require_equal(&applied, &int()).unwrap();
    }

    #[test]
    fn test_effect_rows_length_mismatch() {
        let mut unifier = Unifier::new();
        let exc = tycon(7, "Exc");
        let lhs = Effects::from_effects(vec![Effect::Interface(exc)]);
        let err = unifier.require_effects_equal(&lhs, &Effects::empty()).unwrap_err();
        assert!(matches!(err, UnifyError::EffectsMismatch { .. }));
    }
}
