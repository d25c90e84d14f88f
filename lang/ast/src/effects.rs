use pretty::DocAllocator;
use printer::tokens::*;
use printer::{Alloc, Builder, Print, PrintCfg};

use crate::ident::Ident;
use crate::symbols::Symbol;
use crate::types::{InterfaceType, ValueType};

/// One element of an effect row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// An interface without type arguments
    Interface(Symbol),
    /// A builtin effect supplied by the resolver (e.g. `Console`)
    Builtin(Ident),
    /// An interface applied to type arguments
    Apply(InterfaceType),
    /// An applied effect alias; must be dealiased before comparison
    Alias(EffectAliasApp),
}

/// The definition of an effect alias, as attached to its use sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectAlias {
    pub name: Symbol,
    pub params: Vec<Symbol>,
    pub effects: Effects,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectAliasApp {
    pub alias: Box<EffectAlias>,
    pub args: Vec<ValueType>,
}

impl Effect {
    pub fn is_concrete(&self) -> bool {
        match self {
            Effect::Interface(_) | Effect::Builtin(_) => true,
            Effect::Apply(InterfaceType { args, .. }) => args.iter().all(ValueType::is_concrete),
            Effect::Alias(app) => {
                app.args.iter().all(ValueType::is_concrete) && app.alias.effects.is_concrete()
            }
        }
    }

    pub fn mentions_var(&self, var: &Symbol) -> bool {
        match self {
            Effect::Interface(_) | Effect::Builtin(_) => false,
            Effect::Apply(InterfaceType { args, .. }) => {
                args.iter().any(|arg| arg.mentions_var(var))
            }
            Effect::Alias(app) => app.args.iter().any(|arg| arg.mentions_var(var)),
        }
    }

    /// The interface symbol this effect is headed by, if any.
    pub fn head(&self) -> Option<&Symbol> {
        match self {
            Effect::Interface(sym) => Some(sym),
            Effect::Apply(InterfaceType { symbol, .. }) => Some(symbol),
            Effect::Builtin(_) | Effect::Alias(_) => None,
        }
    }
}

/// An effect row.
///
/// Semantically a multiset, stored deduplicated. Rows may mention
/// unification variables while a definition is being checked; everything
/// the typer *stores* is wrapped in [`ConcreteEffects`] first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    effects: Vec<Effect>,
}

impl Effects {
    pub fn empty() -> Effects {
        Effects::default()
    }

    pub fn from_effects(effects: Vec<Effect>) -> Effects {
        let mut out = Effects::empty();
        for eff in effects {
            out.insert(eff);
        }
        out
    }

    pub fn insert(&mut self, eff: Effect) {
        if !self.effects.contains(&eff) {
            self.effects.push(eff);
        }
    }

    pub fn union(&self, other: &Effects) -> Effects {
        let mut out = self.clone();
        for eff in &other.effects {
            out.insert(eff.clone());
        }
        out
    }

    /// Row difference. Used to discharge handled effects at a `try`.
    pub fn minus(&self, handled: &Effects) -> Effects {
        Effects {
            effects: self.effects.iter().filter(|eff| !handled.contains(eff)).cloned().collect(),
        }
    }

    pub fn contains(&self, eff: &Effect) -> bool {
        self.effects.contains(eff)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_concrete(&self) -> bool {
        self.effects.iter().all(Effect::is_concrete)
    }

    pub fn mentions_var(&self, var: &Symbol) -> bool {
        self.effects.iter().any(|eff| eff.mentions_var(var))
    }

    /// Expand all effect aliases, recursively. The result contains no
    /// [`Effect::Alias`] element.
    pub fn dealias(&self) -> Effects {
        let mut out = Effects::empty();
        for eff in &self.effects {
            match eff {
                Effect::Alias(app) => {
                    let subst = crate::subst::TypeSubst::assigning(&app.alias.params, &app.args);
                    let expanded = app.alias.effects.subst(&subst).dealias();
                    for inner in expanded.effects {
                        out.insert(inner);
                    }
                }
                other => out.insert(dealias_effect(other)),
            }
        }
        out
    }
}

fn dealias_effect(eff: &Effect) -> Effect {
    match eff {
        Effect::Apply(InterfaceType { symbol, args }) => Effect::Apply(InterfaceType {
            symbol: symbol.clone(),
            args: args.iter().map(ValueType::dealias).collect(),
        }),
        other => other.clone(),
    }
}

impl FromIterator<Effect> for Effects {
    fn from_iter<I: IntoIterator<Item = Effect>>(iter: I) -> Effects {
        Effects::from_effects(iter.into_iter().collect())
    }
}

/// An effect row that provably contains no unification variable.
///
/// Set-based reasoning (row difference at handlers, top-level unhandled
/// checks) is only sound on concrete rows, so concreteness is asserted at
/// the only construction site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConcreteEffects(Effects);

impl ConcreteEffects {
    pub fn new(effects: Effects) -> ConcreteEffects {
        assert!(effects.is_concrete(), "effect row is not concrete: {}", effects.print_trace());
        ConcreteEffects(effects)
    }

    pub fn empty() -> ConcreteEffects {
        ConcreteEffects(Effects::empty())
    }

    pub fn union(&self, other: &ConcreteEffects) -> ConcreteEffects {
        ConcreteEffects(self.0.union(&other.0))
    }

    pub fn minus(&self, handled: &ConcreteEffects) -> ConcreteEffects {
        ConcreteEffects(self.0.minus(&handled.0))
    }

    pub fn contains(&self, eff: &Effect) -> bool {
        self.0.contains(eff)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn effects(&self) -> &Effects {
        &self.0
    }

    pub fn into_effects(self) -> Effects {
        self.0
    }
}

// Prettyprinting
//
//

impl Print for Effect {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        match self {
            Effect::Interface(sym) => sym.print(cfg, alloc),
            Effect::Builtin(name) => name.print(cfg, alloc),
            Effect::Apply(iface) => iface.print(cfg, alloc),
            Effect::Alias(app) => {
                let sep = alloc.text(COMMA).append(alloc.space());
                if app.args.is_empty() {
                    app.alias.name.print(cfg, alloc)
                } else {
                    app.alias.name.print(cfg, alloc).append(
                        alloc
                            .intersperse(app.args.iter().map(|arg| arg.print(cfg, alloc)), sep)
                            .brackets(),
                    )
                }
            }
        }
    }
}

impl Print for Effects {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        let sep = alloc.text(COMMA).append(alloc.space());
        alloc
            .intersperse(self.effects.iter().map(|eff| eff.print(cfg, alloc)), sep)
            .braces()
    }
}

impl Print for ConcreteEffects {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        self.0.print(cfg, alloc)
    }
}
