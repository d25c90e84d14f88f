use pretty::DocAllocator;
use printer::tokens::*;
use printer::{Alloc, Builder, Print, PrintCfg};

use crate::captures::Captures;
use crate::effects::Effects;
use crate::symbols::Symbol;

/// A value-type unification variable, stamped with the scope depth of the
/// unification scope it was created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniVar {
    pub id: u64,
    pub scope: usize,
}

/// A capture-set unification variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaptureVar {
    pub id: u64,
    pub scope: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Int,
    Bool,
    Unit,
    Double,
    String,
}

/// Types of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    /// A rigid type variable (type parameter or handler existential)
    Var(Symbol),
    /// A flexible variable owned by the unification engine
    Unification(UniVar),
    /// Application of a data or record type constructor
    Constructor(TypeApp),
    /// A first-class function, boxed together with what it captures
    Boxed(BoxedType),
    Builtin(Builtin),
    /// Applied type alias; must be dealiased before comparison
    Alias(TypeAliasApp),
    /// The empty type, subtype of every type
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeApp {
    pub symbol: Symbol,
    pub args: Vec<ValueType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxedType {
    pub block: Box<BlockType>,
    pub captures: Captures,
}

/// The definition of a type alias, as attached to its use sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAlias {
    pub name: Symbol,
    pub params: Vec<Symbol>,
    pub rhs: ValueType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAliasApp {
    pub alias: Box<TypeAlias>,
    pub args: Vec<ValueType>,
}

/// Types of blocks (second-class function values).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockType {
    Function(Box<FunctionType>),
    /// A capability implementing an interface of effect operations
    Interface(InterfaceType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionType {
    pub tparams: Vec<Symbol>,
    pub cparams: Vec<Symbol>,
    pub vparams: Vec<ValueType>,
    pub bparams: Vec<BlockType>,
    pub result: ValueType,
    pub effects: Effects,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceType {
    pub symbol: Symbol,
    pub args: Vec<ValueType>,
}

impl ValueType {
    pub fn unit() -> ValueType {
        ValueType::Builtin(Builtin::Unit)
    }

    pub fn int() -> ValueType {
        ValueType::Builtin(Builtin::Int)
    }

    pub fn bool() -> ValueType {
        ValueType::Builtin(Builtin::Bool)
    }

    /// Expand all alias applications, recursively. The result contains no
    /// [`ValueType::Alias`] node.
    pub fn dealias(&self) -> ValueType {
        match self {
            ValueType::Alias(app) => app.expand().dealias(),
            ValueType::Constructor(TypeApp { symbol, args }) => {
                ValueType::Constructor(TypeApp {
                    symbol: symbol.clone(),
                    args: args.iter().map(ValueType::dealias).collect(),
                })
            }
            ValueType::Boxed(BoxedType { block, captures }) => ValueType::Boxed(BoxedType {
                block: Box::new(block.dealias()),
                captures: captures.clone(),
            }),
            other => other.clone(),
        }
    }

    /// A type is concrete if no unification variable occurs in it.
    pub fn is_concrete(&self) -> bool {
        match self {
            ValueType::Var(_) | ValueType::Builtin(_) | ValueType::Bottom => true,
            ValueType::Unification(_) => false,
            ValueType::Constructor(TypeApp { args, .. }) => {
                args.iter().all(ValueType::is_concrete)
            }
            ValueType::Boxed(BoxedType { block, captures }) => {
                block.is_concrete() && captures.is_concrete()
            }
            ValueType::Alias(app) => {
                app.args.iter().all(ValueType::is_concrete) && app.alias.rhs.is_concrete()
            }
        }
    }

    /// Does the given rigid type variable occur in this type?
    pub fn mentions_var(&self, var: &Symbol) -> bool {
        match self {
            ValueType::Var(sym) => sym == var,
            ValueType::Unification(_) | ValueType::Builtin(_) | ValueType::Bottom => false,
            ValueType::Constructor(TypeApp { args, .. }) => {
                args.iter().any(|arg| arg.mentions_var(var))
            }
            ValueType::Boxed(BoxedType { block, .. }) => block.mentions_var(var),
            ValueType::Alias(app) => app.expand().mentions_var(var),
        }
    }
}

impl TypeAliasApp {
    /// Replace the alias application by its right-hand side with the
    /// parameters substituted. The result may itself contain aliases.
    pub fn expand(&self) -> ValueType {
        let TypeAliasApp { alias, args } = self;
        let subst = crate::subst::TypeSubst::assigning(&alias.params, args);
        alias.rhs.subst(&subst)
    }
}

impl BlockType {
    pub fn dealias(&self) -> BlockType {
        match self {
            BlockType::Function(ft) => BlockType::Function(Box::new(ft.dealias())),
            BlockType::Interface(InterfaceType { symbol, args }) => {
                BlockType::Interface(InterfaceType {
                    symbol: symbol.clone(),
                    args: args.iter().map(ValueType::dealias).collect(),
                })
            }
        }
    }

    pub fn is_concrete(&self) -> bool {
        match self {
            BlockType::Function(ft) => ft.is_concrete(),
            BlockType::Interface(InterfaceType { args, .. }) => {
                args.iter().all(ValueType::is_concrete)
            }
        }
    }

    pub fn mentions_var(&self, var: &Symbol) -> bool {
        match self {
            BlockType::Function(ft) => {
                ft.vparams.iter().any(|p| p.mentions_var(var))
                    || ft.bparams.iter().any(|p| p.mentions_var(var))
                    || ft.result.mentions_var(var)
                    || ft.effects.mentions_var(var)
            }
            BlockType::Interface(InterfaceType { args, .. }) => {
                args.iter().any(|arg| arg.mentions_var(var))
            }
        }
    }
}

impl FunctionType {
    pub fn dealias(&self) -> FunctionType {
        let FunctionType { tparams, cparams, vparams, bparams, result, effects } = self;
        FunctionType {
            tparams: tparams.clone(),
            cparams: cparams.clone(),
            vparams: vparams.iter().map(ValueType::dealias).collect(),
            bparams: bparams.iter().map(BlockType::dealias).collect(),
            result: result.dealias(),
            effects: effects.dealias(),
        }
    }

    pub fn is_concrete(&self) -> bool {
        self.vparams.iter().all(ValueType::is_concrete)
            && self.bparams.iter().all(BlockType::is_concrete)
            && self.result.is_concrete()
            && self.effects.is_concrete()
    }
}

// Prettyprinting
//
//

impl Print for Builtin {
    fn print<'a>(&'a self, _cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        let text = match self {
            Builtin::Int => INT,
            Builtin::Bool => BOOL,
            Builtin::Unit => UNIT,
            Builtin::Double => DOUBLE,
            Builtin::String => STRING,
        };
        alloc.text(text)
    }
}

impl Print for ValueType {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        match self {
            ValueType::Var(sym) => sym.print(cfg, alloc),
            ValueType::Unification(UniVar { id, .. }) => alloc.text(format!("?{id}")),
            ValueType::Constructor(app) => print_type_app(&app.symbol, &app.args, cfg, alloc),
            ValueType::Boxed(BoxedType { block, captures }) => block
                .print(cfg, alloc)
                .append(alloc.space())
                .append(alloc.text(AT))
                .append(alloc.space())
                .append(captures.print(cfg, alloc)),
            ValueType::Builtin(builtin) => builtin.print(cfg, alloc),
            ValueType::Alias(app) => print_type_app(&app.alias.name, &app.args, cfg, alloc),
            ValueType::Bottom => alloc.text(BOTTOM),
        }
    }
}

fn print_type_app<'a>(
    symbol: &'a Symbol,
    args: &'a [ValueType],
    cfg: &PrintCfg,
    alloc: &'a Alloc<'a>,
) -> Builder<'a> {
    if args.is_empty() {
        return symbol.print(cfg, alloc);
    }
    let sep = alloc.text(COMMA).append(alloc.space());
    symbol
        .print(cfg, alloc)
        .append(alloc.intersperse(args.iter().map(|arg| arg.print(cfg, alloc)), sep).brackets())
}

impl Print for BlockType {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        match self {
            BlockType::Function(ft) => ft.print(cfg, alloc),
            BlockType::Interface(iface) => iface.print(cfg, alloc),
        }
    }
}

impl Print for InterfaceType {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        print_type_app(&self.symbol, &self.args, cfg, alloc)
    }
}

impl Print for FunctionType {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        let FunctionType { tparams, cparams: _, vparams, bparams, result, effects } = self;
        let sep = alloc.text(COMMA).append(alloc.space());
        let tparams_doc = if tparams.is_empty() {
            alloc.nil()
        } else {
            alloc.intersperse(tparams.iter().map(|p| p.print(cfg, alloc)), sep.clone()).brackets()
        };
        let vparams_doc = alloc
            .intersperse(vparams.iter().map(|p| p.print(cfg, alloc)), sep.clone())
            .parens();
        let bparams_doc = if bparams.is_empty() {
            alloc.nil()
        } else {
            alloc.concat(bparams.iter().map(|p| p.print(cfg, alloc).braces()))
        };
        let effects_doc = if effects.is_empty() {
            alloc.nil()
        } else {
            alloc
                .space()
                .append(alloc.text(SLASH))
                .append(alloc.space())
                .append(effects.print(cfg, alloc))
        };
        tparams_doc
            .append(vparams_doc)
            .append(bparams_doc)
            .append(alloc.space())
            .append(alloc.text(FAT_ARROW))
            .append(alloc.space())
            .append(result.print(cfg, alloc))
            .append(effects_doc)
    }
}
