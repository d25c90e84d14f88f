//! The two-level continuation abstraction.
//!
//! A continuation is either *static* (a meta-level function over target
//! expressions, inlined at transformation time) or *dynamic* (a target
//! expression, applied with an emitted call). A [`Cps`] value is a
//! function from a continuation to a target expression.
//!
//! The static/dynamic split is the central lever against code blow-up:
//! only [`Cps::join`] forces a continuation to be named; every other
//! combinator preserves static continuations.

use std::rc::Rc;

use crate::ml::{self, Param};
use crate::names::Names;

#[derive(Clone)]
pub enum Continuation {
    /// A meta-level function, inlined where it is applied
    Static(Rc<dyn Fn(ml::Expr) -> ml::Expr>),
    /// A target-level expression standing for the continuation
    Dynamic(ml::Expr),
}

impl Continuation {
    pub fn apply(&self, arg: ml::Expr) -> ml::Expr {
        match self {
            Continuation::Static(f) => f(arg),
            Continuation::Dynamic(k) => ml::Expr::call(k.clone(), vec![arg]),
        }
    }

    /// A target expression standing for this continuation: dynamic
    /// continuations are themselves, static ones are eta-expanded.
    pub fn reify(&self, names: &Names) -> ml::Expr {
        match self {
            Continuation::Dynamic(k) => k.clone(),
            Continuation::Static(f) => {
                let a = names.fresh("a");
                ml::Expr::lambda(vec![Param::Named(a.clone())], f(ml::Expr::var(a)))
            }
        }
    }

    /// The inverse of [`Continuation::reify`].
    pub fn reflect(&self) -> Rc<dyn Fn(ml::Expr) -> ml::Expr> {
        match self {
            Continuation::Static(f) => f.clone(),
            Continuation::Dynamic(k) => {
                let k = k.clone();
                Rc::new(move |a| ml::Expr::call(k.clone(), vec![a]))
            }
        }
    }
}

/// A CPS computation: a function from a continuation to the target
/// expression that runs the computation and feeds its result to the
/// continuation.
#[derive(Clone)]
pub struct Cps {
    prog: Rc<dyn Fn(Continuation) -> ml::Expr>,
}

impl Cps {
    /// Wrap a programmer-supplied builder.
    pub fn inline(prog: impl Fn(Continuation) -> ml::Expr + 'static) -> Cps {
        Cps { prog: Rc::new(prog) }
    }

    /// `λk. k(e)`
    pub fn pure(expr: ml::Expr) -> Cps {
        Cps::inline(move |k| k.apply(expr.clone()))
    }

    /// Like [`Cps::inline`], but forces the continuation to be named
    /// (let-bound) before entering the builder. Use at control-flow
    /// joins (`if`, `match`, `shift`) where the continuation would
    /// otherwise be duplicated into every branch.
    pub fn join(names: &Names, prog: impl Fn(Continuation) -> ml::Expr + 'static) -> Cps {
        let names = names.clone();
        Cps::inline(move |k| {
            let name = names.fresh("k");
            let reified = k.reify(&names);
            ml::Expr::let_in(
                vec![ml::Binding::ValBind { name: name.clone(), expr: reified }],
                prog(Continuation::Dynamic(ml::Expr::var(name))),
            )
        })
    }

    /// `λk. self(a ↦ f(a)(k))`
    pub fn flat_map(self, f: impl Fn(ml::Expr) -> Cps + 'static) -> Cps {
        let f = Rc::new(f);
        Cps::inline(move |k| {
            let f = f.clone();
            self.apply(Continuation::Static(Rc::new(move |a| f(a).apply(k.clone()))))
        })
    }

    pub fn apply(&self, k: Continuation) -> ml::Expr {
        (self.prog)(k)
    }

    /// Run with the identity continuation. Only correct when the result
    /// is a pure expression.
    pub fn run(&self) -> ml::Expr {
        self.apply(Continuation::Static(Rc::new(|a| a)))
    }

    /// The computation as a target expression: `λk. self(k)`.
    pub fn reify(&self, names: &Names) -> ml::Expr {
        let k = names.fresh("k");
        ml::Expr::lambda(
            vec![Param::Named(k.clone())],
            self.apply(Continuation::Dynamic(ml::Expr::var(k))),
        )
    }
}

/// Install a fresh prompt: apply the program to the pure continuation.
pub fn reset(names: &Names, prog: ml::Expr) -> ml::Expr {
    ml::Expr::call(prog, vec![pure_continuation(names)])
}

/// The pure continuation `λa. λk. k(a)`, the delimiter installed by
/// [`reset`].
pub fn pure_continuation(names: &Names) -> ml::Expr {
    let a = names.fresh("a");
    let k = names.fresh("k");
    ml::Expr::lambda(
        vec![Param::Named(a.clone()), Param::Named(k.clone())],
        ml::Expr::call(ml::Expr::var(k), vec![ml::Expr::var(a)]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Names {
        Names::new()
    }

    #[test]
    fn test_pure_applies_continuation() {
        let cps = Cps::pure(ml::Expr::RawValue("42".to_owned()));
        assert_eq!(cps.run(), ml::Expr::RawValue("42".to_owned()));
    }

    #[test]
    fn test_reify_of_pure() {
        // λk. k(42)
        let names = names();
        let cps = Cps::pure(ml::Expr::RawValue("42".to_owned()));
        let reified = cps.reify(&names);
        assert_eq!(
            reified,
            ml::Expr::lambda(
                vec![Param::Named("k0".to_owned())],
                ml::Expr::call(ml::Expr::var("k0"), vec![ml::Expr::RawValue("42".to_owned())]),
            )
        );
    }

    #[test]
    fn test_reify_reflect_is_identity() {
        // reify(reflect(e)) only eta-expands e.
        let names = names();
        let e = ml::Expr::var("e");
        let reflected = Continuation::Dynamic(e.clone()).reflect();
        let roundtripped = Continuation::Static(reflected).reify(&names);
        assert_eq!(
            roundtripped,
            ml::Expr::lambda(
                vec![Param::Named("a0".to_owned())],
                ml::Expr::call(e, vec![ml::Expr::var("a0")]),
            )
        );
    }

    #[test]
    fn test_reflect_reify_is_identity() {
        // reflect(reify(k)) applies exactly like k itself.
        let names = names();
        let k = Continuation::Static(Rc::new(|a| ml::Expr::call(ml::Expr::var("f"), vec![a])));
        let reified = k.reify(&names);
        let reflected = Continuation::Dynamic(reified).reflect();
        let direct = k.apply(ml::Expr::var("x"));
        let indirect = reflected(ml::Expr::var("x"));
        // The indirect form goes through the reified lambda; beta-reducing
        // one step yields the direct form.
        let ml::Expr::Call { fun, args } = indirect else { panic!("expected a call") };
        let ml::Expr::Lambda { params, body } = *fun else { panic!("expected a lambda") };
        assert_eq!(params.len(), 1);
        assert_eq!(args, vec![ml::Expr::var("x")]);
        let Param::Named(param) = &params[0] else { panic!("expected a named param") };
        let ml::Expr::Call { fun: inner_fun, args: inner_args } = *body else {
            panic!("expected a call")
        };
        assert_eq!(*inner_fun, ml::Expr::var("f"));
        assert_eq!(inner_args, vec![ml::Expr::var(param.clone())]);
        assert_eq!(direct, ml::Expr::call(ml::Expr::var("f"), vec![ml::Expr::var("x")]));
    }

    #[test]
    fn test_join_names_the_continuation() {
        // join forces `let k = ... in ...` even for a dynamic
        // continuation.
        let names = names();
        let cps = Cps::join(&names, |k| k.apply(ml::Expr::RawValue("1".to_owned())));
        let out = cps.apply(Continuation::Dynamic(ml::Expr::var("outer")));
        let ml::Expr::Let { bindings, body } = out else { panic!("expected let") };
        assert_eq!(
            bindings,
            vec![ml::Binding::ValBind { name: "k0".to_owned(), expr: ml::Expr::var("outer") }]
        );
        assert_eq!(
            *body,
            ml::Expr::call(ml::Expr::var("k0"), vec![ml::Expr::RawValue("1".to_owned())])
        );
    }

    #[test]
    fn test_flat_map_stays_static() {
        // flatMap must not reify the continuation.
        let cps = Cps::pure(ml::Expr::RawValue("1".to_owned()))
            .flat_map(|v| Cps::pure(ml::Expr::call(ml::Expr::var("f"), vec![v])));
        let out = cps.apply(Continuation::Static(Rc::new(|a| a)));
        assert_eq!(out, ml::Expr::call(ml::Expr::var("f"), vec![ml::Expr::RawValue("1".to_owned())]));
    }
}
