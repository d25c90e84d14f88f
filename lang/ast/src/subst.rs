use crate::captures::{Capture, Captures};
use crate::effects::{Effect, EffectAliasApp, Effects};
use crate::symbols::{Symbol, SymbolId};
use crate::types::{
    BlockType, BoxedType, FunctionType, InterfaceType, TypeAliasApp, TypeApp, ValueType,
};
use crate::HashMap;

/// A substitution of rigid type parameters and capture parameters.
///
/// Used for instantiation of polymorphic function types and for expanding
/// alias applications. Symbols are globally unique, so substitution never
/// has to worry about shadowing under binders.
#[derive(Debug, Clone, Default)]
pub struct TypeSubst {
    pub values: HashMap<SymbolId, ValueType>,
    pub captures: HashMap<SymbolId, Captures>,
}

impl TypeSubst {
    /// Pointwise assignment of `args` to `params`. Callers are responsible
    /// for arity checking; extra entries on either side are dropped.
    pub fn assigning(params: &[Symbol], args: &[ValueType]) -> TypeSubst {
        let mut subst = TypeSubst::default();
        for (param, arg) in params.iter().zip(args) {
            subst.values.insert(param.id, arg.clone());
        }
        subst
    }

    pub fn add_capture(&mut self, param: &Symbol, captures: Captures) {
        self.captures.insert(param.id, captures);
    }
}

impl ValueType {
    pub fn subst(&self, subst: &TypeSubst) -> ValueType {
        match self {
            ValueType::Var(sym) => match subst.values.get(&sym.id) {
                Some(replacement) => replacement.clone(),
                None => self.clone(),
            },
            ValueType::Unification(_) | ValueType::Builtin(_) | ValueType::Bottom => self.clone(),
            ValueType::Constructor(TypeApp { symbol, args }) => {
                ValueType::Constructor(TypeApp {
                    symbol: symbol.clone(),
                    args: args.iter().map(|arg| arg.subst(subst)).collect(),
                })
            }
            ValueType::Boxed(BoxedType { block, captures }) => ValueType::Boxed(BoxedType {
                block: Box::new(block.subst(subst)),
                captures: captures.subst(subst),
            }),
            ValueType::Alias(TypeAliasApp { alias, args }) => ValueType::Alias(TypeAliasApp {
                alias: alias.clone(),
                args: args.iter().map(|arg| arg.subst(subst)).collect(),
            }),
        }
    }
}

impl BlockType {
    pub fn subst(&self, subst: &TypeSubst) -> BlockType {
        match self {
            BlockType::Function(ft) => BlockType::Function(Box::new(ft.subst(subst))),
            BlockType::Interface(iface) => BlockType::Interface(iface.subst(subst)),
        }
    }
}

impl InterfaceType {
    pub fn subst(&self, subst: &TypeSubst) -> InterfaceType {
        InterfaceType {
            symbol: self.symbol.clone(),
            args: self.args.iter().map(|arg| arg.subst(subst)).collect(),
        }
    }
}

impl FunctionType {
    pub fn subst(&self, subst: &TypeSubst) -> FunctionType {
        let FunctionType { tparams, cparams, vparams, bparams, result, effects } = self;
        FunctionType {
            tparams: tparams.clone(),
            cparams: cparams.clone(),
            vparams: vparams.iter().map(|p| p.subst(subst)).collect(),
            bparams: bparams.iter().map(|p| p.subst(subst)).collect(),
            result: result.subst(subst),
            effects: effects.subst(subst),
        }
    }
}

impl Effects {
    pub fn subst(&self, subst: &TypeSubst) -> Effects {
        self.iter().map(|eff| eff.subst(subst)).collect()
    }
}

impl Effect {
    pub fn subst(&self, subst: &TypeSubst) -> Effect {
        match self {
            Effect::Interface(_) | Effect::Builtin(_) => self.clone(),
            Effect::Apply(iface) => Effect::Apply(iface.subst(subst)),
            Effect::Alias(EffectAliasApp { alias, args }) => Effect::Alias(EffectAliasApp {
                alias: alias.clone(),
                args: args.iter().map(|arg| arg.subst(subst)).collect(),
            }),
        }
    }
}

impl Captures {
    pub fn subst(&self, subst: &TypeSubst) -> Captures {
        let mut out = Captures::empty();
        for capture in self.iter() {
            match capture {
                Capture::Param(id) => match subst.captures.get(id) {
                    Some(replacement) => out = out.union(replacement),
                    None => out.insert(capture.clone()),
                },
                other => out.insert(other.clone()),
            }
        }
        out
    }
}

/// The solved substitution maintained by the unification engine.
///
/// Maps unification variable ids to their solutions. Applied to stored
/// annotations by [`crate::traits::Zonk`] once a definition is fully
/// checked.
#[derive(Debug, Clone, Default)]
pub struct UnifierSubst {
    pub values: HashMap<u64, ValueType>,
    pub captures: HashMap<u64, Captures>,
}

impl UnifierSubst {
    pub fn solution(&self, var_id: u64) -> Option<&ValueType> {
        self.values.get(&var_id)
    }

    pub fn capture_solution(&self, var_id: u64) -> Option<&Captures> {
        self.captures.get(&var_id)
    }
}
