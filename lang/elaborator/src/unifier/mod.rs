//! The scoped constraint solver over value types, block types, effect
//! rows and capture sets.
//!
//! The solver is eager: every `require_*` obligation is discharged (or
//! fails) immediately, extending the solved substitution. Scopes bracket
//! unification regions; a variable is stamped with the scope depth it was
//! created at, and when two variables meet, the deeper one is solved in
//! terms of the shallower. When a scope closes, unsolved variables of
//! that scope which would escape through a surviving type are an error.

mod unify;

use thiserror::Error;

use ast::*;
use printer::Print;

/// A span-free unification failure. The typer lifts these into a
/// [`crate::result::TypeError`] at its current focus.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnifyError {
    #[error("The following types are incompatible:\n  1: {left}\n  2: {right}")]
    NotSubtype { left: String, right: String },
    #[error("The following types are not equal:\n  1: {left}\n  2: {right}")]
    NotEqual { left: String, right: String },
    #[error("The effect rows {left} and {right} do not agree")]
    EffectsMismatch { left: String, right: String },
    #[error("The unification variable ?{var} occurs in {tpe}")]
    OccursCheck { var: u64, tpe: String },
    #[error("A type variable created in this scope escapes through {tpe}")]
    EscapingSkolem { var: u64, tpe: String },
    #[error("Wrong number of type arguments: got {actual}, expected {expected}")]
    TypeArgsArity { expected: usize, actual: usize },
    #[error("The captures {left} are not included in {right}")]
    NotSubcapture { left: String, right: String },
}

#[derive(Debug, Clone)]
pub struct Unifier {
    /// Variables created per open scope; index 0 is the base scope that
    /// is never closed.
    scope_vars: Vec<Vec<UniVar>>,
    next_value: u64,
    next_capture: u64,
    subst: UnifierSubst,
}

impl Default for Unifier {
    fn default() -> Self {
        Unifier { scope_vars: vec![Vec::new()], next_value: 0, next_capture: 0, subst: UnifierSubst::default() }
    }
}

impl Unifier {
    pub fn new() -> Unifier {
        Unifier::default()
    }

    /// The depth of the currently innermost scope. The base scope has
    /// depth 0.
    pub fn depth(&self) -> usize {
        self.scope_vars.len() - 1
    }

    pub fn enter_scope(&mut self) {
        self.scope_vars.push(Vec::new());
    }

    /// Close the innermost scope. `escaping` are the types that survive
    /// the scope (e.g. the type and effects a definition is recorded
    /// with); an unsolved variable of the closing scope occurring in one
    /// of them is an error.
    pub fn leave_scope(&mut self, escaping: &[&ValueType]) -> Result<(), UnifyError> {
        debug_assert!(self.scope_vars.len() > 1, "cannot leave the base unification scope");
        let closing = self.scope_vars.pop().unwrap_or_default();
        for var in closing {
            if self.subst.solution(var.id).is_some() {
                continue;
            }
            for tpe in escaping {
                let tpe = self.substitute(tpe);
                if unify::occurs(var.id, &tpe) {
                    return Err(UnifyError::EscapingSkolem { var: var.id, tpe: tpe.print_trace() });
                }
            }
        }
        Ok(())
    }

    pub fn fresh_value_var(&mut self) -> ValueType {
        let var = UniVar { id: self.next_value, scope: self.depth() };
        self.next_value += 1;
        self.scope_vars.last_mut().expect("no open unification scope").push(var);
        ValueType::Unification(var)
    }

    pub fn fresh_capture_set(&mut self) -> Captures {
        let var = CaptureVar { id: self.next_capture, scope: self.depth() };
        self.next_capture += 1;
        Captures::singleton(Capture::Unification(var))
    }

    /// Replace the type parameters of a function type by fresh
    /// unification variables (or the supplied type arguments) and its
    /// capture parameters by fresh capture variables.
    ///
    /// Returns the chosen type arguments, the chosen capture arguments,
    /// and the instantiated function type with emptied parameter lists.
    pub fn instantiate(
        &mut self,
        ft: &FunctionType,
        targs: Option<&[ValueType]>,
    ) -> Result<(Vec<ValueType>, Vec<Captures>, FunctionType), UnifyError> {
        let targs: Vec<ValueType> = match targs {
            Some(given) => {
                if given.len() != ft.tparams.len() {
                    return Err(UnifyError::TypeArgsArity {
                        expected: ft.tparams.len(),
                        actual: given.len(),
                    });
                }
                given.to_vec()
            }
            None => ft.tparams.iter().map(|_| self.fresh_value_var()).collect(),
        };
        let cargs: Vec<Captures> =
            ft.cparams.iter().map(|_| self.fresh_capture_set()).collect();

        let mut subst = TypeSubst::assigning(&ft.tparams, &targs);
        for (cparam, carg) in ft.cparams.iter().zip(&cargs) {
            subst.add_capture(cparam, carg.clone());
        }

        let instantiated = FunctionType {
            tparams: Vec::new(),
            cparams: Vec::new(),
            vparams: ft.vparams.iter().map(|p| p.subst(&subst)).collect(),
            bparams: ft.bparams.iter().map(|p| p.subst(&subst)).collect(),
            result: ft.result.subst(&subst),
            effects: ft.effects.subst(&subst),
        };
        Ok((targs, cargs, instantiated))
    }

    /// The least upper bound of the given types under the current
    /// constraint set. With invariant constructors this degenerates to
    /// `Bottom`-absorption plus equality.
    pub fn join(&mut self, types: &[ValueType]) -> Result<ValueType, UnifyError> {
        let mut acc = ValueType::Bottom;
        for tpe in types {
            let tpe = self.substitute(tpe);
            acc = match (&acc, &tpe) {
                (ValueType::Bottom, _) => tpe.clone(),
                (_, ValueType::Bottom) => acc,
                _ => {
                    self.require_equal(&acc, &tpe)?;
                    self.substitute(&acc)
                }
            };
        }
        Ok(acc)
    }

    /// Apply the solved substitution deeply.
    pub fn substitute(&self, tpe: &ValueType) -> ValueType {
        let mut out = tpe.clone();
        out.zonk(&self.subst);
        out
    }

    pub fn substitute_block(&self, tpe: &BlockType) -> BlockType {
        let mut out = tpe.clone();
        out.zonk(&self.subst);
        out
    }

    pub fn substitute_effects(&self, effects: &Effects) -> Effects {
        let mut out = effects.clone();
        out.zonk(&self.subst);
        out
    }

    pub fn substitute_captures(&self, captures: &Captures) -> Captures {
        let mut out = captures.clone();
        out.zonk(&self.subst);
        out
    }

    /// The solved substitution, for zonking checked definitions.
    pub fn subst(&self) -> &UnifierSubst {
        &self.subst
    }

    pub(crate) fn solutions_mut(&mut self) -> &mut UnifierSubst {
        &mut self.subst
    }
}
