//! Typing context
//!
//! Tracks the types bound to symbols, the effects lexically in scope, and
//! everything else the typer may mutate while walking a module. The
//! whole mutable state can be snapshotted and restored, which is what
//! overload resolution builds its trials on.

use std::rc::Rc;

use miette_util::Span;

use ast::source::{Decl, InterfaceDecl};
use ast::*;

use crate::result::{TcResult, TypeError, TypeWarning};
use crate::unifier::Unifier;

/// Metadata for a constructor, shared by calls and pattern checking.
#[derive(Debug, Clone)]
pub struct CtorMeta {
    /// The data or record type this constructor belongs to
    pub datatype: Symbol,
    pub tparams: Vec<Symbol>,
    pub fields: Vec<ValueType>,
}

impl CtorMeta {
    /// The constructor as a function from its fields to the datatype.
    pub fn function_type(&self) -> FunctionType {
        FunctionType {
            tparams: self.tparams.clone(),
            cparams: Vec::new(),
            vparams: self.fields.clone(),
            bparams: Vec::new(),
            result: ValueType::Constructor(TypeApp {
                symbol: self.datatype.clone(),
                args: self.tparams.iter().map(|p| ValueType::Var(p.clone())).collect(),
            }),
            effects: Effects::empty(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpMeta {
    pub interface: Symbol,
}

/// Declaration metadata of a module: interfaces by symbol, constructor
/// and operation back-references. Appended into the global dependencies
/// database once a module is checked.
#[derive(Debug, Clone, Default)]
pub struct DeclTable {
    pub interfaces: HashMap<SymbolId, InterfaceDecl>,
    pub ctors: HashMap<SymbolId, CtorMeta>,
    pub ops: HashMap<SymbolId, OpMeta>,
}

impl DeclTable {
    pub fn register(&mut self, decl: &Decl) {
        match decl {
            Decl::Data(data) => {
                for ctor in &data.ctors {
                    self.ctors.insert(
                        ctor.symbol.id,
                        CtorMeta {
                            datatype: data.symbol.clone(),
                            tparams: data.tparams.clone(),
                            fields: ctor.fields.clone(),
                        },
                    );
                }
            }
            Decl::Record(record) => {
                self.ctors.insert(
                    record.ctor.id,
                    CtorMeta {
                        datatype: record.symbol.clone(),
                        tparams: record.tparams.clone(),
                        fields: record.fields.iter().map(|f| f.tpe.clone()).collect(),
                    },
                );
            }
            Decl::Interface(iface) => {
                for op in &iface.ops {
                    self.ops.insert(op.symbol.id, OpMeta { interface: iface.symbol.clone() });
                }
                self.interfaces.insert(iface.symbol.id, iface.clone());
            }
            // Alias applications carry their definition along, so aliases
            // need no table of their own.
            Decl::TypeAlias(_) | Decl::EffectAlias(_) => {}
        }
    }

    pub fn append(&mut self, other: DeclTable) {
        self.interfaces.extend(other.interfaces);
        self.ctors.extend(other.ctors);
        self.ops.extend(other.ops);
    }
}

/// The types a checked module exports for its downstream dependents.
#[derive(Debug, Clone, Default)]
pub struct ModuleTypes {
    pub values: HashMap<SymbolId, ValueType>,
    pub blocks: HashMap<SymbolId, BlockType>,
    pub captures: HashMap<SymbolId, Captures>,
}

/// The global database of already-checked dependencies. Lookups in the
/// typing context fall back to this for symbols of other modules.
#[derive(Debug, Clone, Default)]
pub struct DependencyTypes {
    pub values: HashMap<SymbolId, ValueType>,
    pub blocks: HashMap<SymbolId, BlockType>,
    pub captures: HashMap<SymbolId, Captures>,
    pub decls: DeclTable,
}

#[derive(Debug)]
pub struct Ctx {
    /// Typing of value symbols
    values: HashMap<SymbolId, ValueType>,
    /// Typing of block symbols
    blocks: HashMap<SymbolId, BlockType>,
    /// Capture sets of block symbols
    captures: HashMap<SymbolId, Captures>,
    /// Effects lexically in scope, innermost last
    lexical_effects: Vec<Effect>,
    /// Symbols introduced by `var`; only these may be assigned to
    mutable_vars: HashSet<SymbolId>,
    /// Declaration metadata of the current module
    pub decls: DeclTable,
    /// Already-checked dependencies
    deps: Rc<DependencyTypes>,
    pub unifier: Unifier,
    /// Buffered diagnostics of the current compilation
    pub errors: Vec<TypeError>,
    pub warnings: Vec<TypeWarning>,
    /// Source of typer-made symbols (handler existentials)
    pub fresh: SymbolSource,
}

/// A full snapshot of the typer's mutable state.
#[derive(Clone)]
pub struct Snapshot {
    values: HashMap<SymbolId, ValueType>,
    blocks: HashMap<SymbolId, BlockType>,
    captures: HashMap<SymbolId, Captures>,
    lexical_effects: Vec<Effect>,
    mutable_vars: HashSet<SymbolId>,
    unifier: Unifier,
    errors: Vec<TypeError>,
    warnings: Vec<TypeWarning>,
    fresh: SymbolSource,
}

impl Ctx {
    pub fn new(decls: DeclTable, deps: Rc<DependencyTypes>, fresh: SymbolSource) -> Ctx {
        Ctx {
            values: HashMap::default(),
            blocks: HashMap::default(),
            captures: HashMap::default(),
            lexical_effects: Vec::new(),
            mutable_vars: HashSet::default(),
            decls,
            deps,
            unifier: Unifier::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            fresh,
        }
    }

    // Binding
    //
    //

    pub fn bind_value(&mut self, symbol: &Symbol, tpe: ValueType) {
        self.values.insert(symbol.id, tpe);
    }

    pub fn bind_block(&mut self, symbol: &Symbol, tpe: BlockType) {
        self.blocks.insert(symbol.id, tpe);
    }

    pub fn bind_captures(&mut self, symbol: &Symbol, captures: Captures) {
        self.captures.insert(symbol.id, captures);
    }

    pub fn mark_mutable(&mut self, symbol: &Symbol) {
        self.mutable_vars.insert(symbol.id);
    }

    pub fn is_mutable(&self, symbol: &Symbol) -> bool {
        self.mutable_vars.contains(&symbol.id)
    }

    // Lookup
    //
    //

    pub fn lookup_value(&self, symbol: &Symbol, span: Option<Span>) -> TcResult<ValueType> {
        self.values
            .get(&symbol.id)
            .or_else(|| self.deps.values.get(&symbol.id))
            .cloned()
            .ok_or_else(|| TypeError::resolution(symbol, span))
    }

    pub fn lookup_block(&self, symbol: &Symbol, span: Option<Span>) -> TcResult<BlockType> {
        self.blocks
            .get(&symbol.id)
            .or_else(|| self.deps.blocks.get(&symbol.id))
            .cloned()
            .ok_or_else(|| TypeError::resolution(symbol, span))
    }

    /// Look up a block symbol that must already have a *function* type.
    /// Failure signals mutual recursion without an annotation: the
    /// definition is used before its type could be assembled.
    pub fn lookup_function_type(
        &self,
        symbol: &Symbol,
        span: Option<Span>,
    ) -> TcResult<FunctionType> {
        use miette_util::ToMiette;
        match self.blocks.get(&symbol.id).or_else(|| self.deps.blocks.get(&symbol.id)) {
            Some(BlockType::Function(ft)) => Ok((**ft).clone()),
            Some(BlockType::Interface(iface)) => {
                use printer::Print;
                Err(Box::new(TypeError::ExpectedFunctionBlock {
                    got: iface.print_trace(),
                    span: span.to_miette(),
                }))
            }
            None => Err(Box::new(TypeError::NoFunctionType {
                name: symbol.name.id.clone(),
                span: span.to_miette(),
            })),
        }
    }

    pub fn lookup_captures(&self, symbol: &Symbol) -> Captures {
        self.captures
            .get(&symbol.id)
            .or_else(|| self.deps.captures.get(&symbol.id))
            .cloned()
            .unwrap_or_else(|| Captures::of_block(symbol))
    }

    pub fn lookup_interface(&self, symbol: &Symbol, span: Option<Span>) -> TcResult<InterfaceDecl> {
        self.decls
            .interfaces
            .get(&symbol.id)
            .or_else(|| self.deps.decls.interfaces.get(&symbol.id))
            .cloned()
            .ok_or_else(|| TypeError::resolution(symbol, span))
    }

    pub fn lookup_ctor(&self, symbol: &Symbol, span: Option<Span>) -> TcResult<CtorMeta> {
        self.decls
            .ctors
            .get(&symbol.id)
            .or_else(|| self.deps.decls.ctors.get(&symbol.id))
            .cloned()
            .ok_or_else(|| TypeError::resolution(symbol, span))
    }

    // Lexical effects
    //
    //

    /// Bring effects into lexical scope; returns the previous length for
    /// [`Ctx::truncate_lexical_effects`].
    pub fn push_lexical_effects<I: IntoIterator<Item = Effect>>(&mut self, effects: I) -> usize {
        let mark = self.lexical_effects.len();
        self.lexical_effects.extend(effects);
        mark
    }

    pub fn truncate_lexical_effects(&mut self, mark: usize) {
        self.lexical_effects.truncate(mark);
    }

    pub fn lexical_effects(&self) -> &[Effect] {
        &self.lexical_effects
    }

    /// The types bound so far, for the dependency database.
    pub fn exports(&self) -> ModuleTypes {
        ModuleTypes {
            values: self.values.clone(),
            blocks: self.blocks.clone(),
            captures: self.captures.clone(),
        }
    }

    // Snapshots
    //
    //

    pub fn backup(&self) -> Snapshot {
        Snapshot {
            values: self.values.clone(),
            blocks: self.blocks.clone(),
            captures: self.captures.clone(),
            lexical_effects: self.lexical_effects.clone(),
            mutable_vars: self.mutable_vars.clone(),
            unifier: self.unifier.clone(),
            errors: self.errors.clone(),
            warnings: self.warnings.clone(),
            fresh: self.fresh.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        let Snapshot {
            values,
            blocks,
            captures,
            lexical_effects,
            mutable_vars,
            unifier,
            errors,
            warnings,
            fresh,
        } = snapshot;
        self.values = values;
        self.blocks = blocks;
        self.captures = captures;
        self.lexical_effects = lexical_effects;
        self.mutable_vars = mutable_vars;
        self.unifier = unifier;
        self.errors = errors;
        self.warnings = warnings;
        self.fresh = fresh;
    }

    // Diagnostics
    //
    //

    /// Buffer an error and continue.
    pub fn report(&mut self, error: Box<TypeError>) {
        self.errors.push(*error);
    }

    pub fn warn(&mut self, warning: TypeWarning) {
        self.warnings.push(warning);
    }

    /// Substitute and dealias an effect row and assert that it has become
    /// concrete. Rows are only stored or compared as sets once they pass
    /// through here.
    pub fn concrete_effects(
        &mut self,
        effects: &Effects,
        span: Option<Span>,
    ) -> TcResult<ConcreteEffects> {
        use miette_util::ToMiette;
        let substituted = self.unifier.substitute_effects(effects).dealias();
        if substituted.is_concrete() {
            Ok(ConcreteEffects::new(substituted))
        } else {
            Err(Box::new(TypeError::CannotInferEffects { span: span.to_miette() }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_restore_is_identity() {
        let mut ctx = Ctx::new(
            DeclTable::default(),
            Rc::new(DependencyTypes::default()),
            SymbolSource::starting_at(1000),
        );
        let x = Symbol::new(1, "x", SymbolKind::Value);
        ctx.bind_value(&x, ValueType::int());

        let snapshot = ctx.backup();
        let y = Symbol::new(2, "y", SymbolKind::Value);
        ctx.bind_value(&y, ValueType::bool());
        ctx.mark_mutable(&y);
        ctx.unifier.enter_scope();
        let var = ctx.unifier.fresh_value_var();
        ctx.unifier.require_equal(&var, &ValueType::int()).unwrap();

        ctx.restore(snapshot);
        assert!(ctx.lookup_value(&x, None).is_ok());
        assert!(ctx.lookup_value(&y, None).is_err());
        assert!(!ctx.is_mutable(&y));
        assert_eq!(ctx.unifier.depth(), 0);
    }
}
