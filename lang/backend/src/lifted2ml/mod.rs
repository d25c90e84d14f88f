//! The lifted-IR → Target-ML transformer.
//!
//! Consumes a lifted module and produces a [`ml::Toplevel`]. Declarations
//! come first (data types, then the arity-shared interface objects),
//! followed by externs and the topologically ordered definitions. The
//! transformer is consumed by [`transform`]; there is no re-entry.

pub mod decls;
pub mod evidence;
pub mod exprs;
pub mod sort;
pub mod stmts;

use log::debug;

use ast::lifted::*;
use ast::{HashMap, HashSet, Symbol, SymbolId};

use crate::cps::Continuation;
use crate::ml::{self, Param};
use crate::names::Names;
use crate::result::{BackendError, BackendResult};

/// Where an operation lives inside its interface: dispatch is positional.
#[derive(Debug, Clone, Copy)]
pub struct OpInfo {
    pub index: usize,
    pub arity: usize,
}

#[derive(Debug, Clone)]
pub struct CtorInfo {
    pub fields: usize,
}

/// The shared object encoding of all interfaces of one arity.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub type_name: String,
    pub members: Vec<String>,
}

pub struct Transformer {
    names: Names,
    /// op symbol -> position and arity of its interface
    ops: HashMap<SymbolId, OpInfo>,
    /// interface symbol -> operation count
    interfaces: HashMap<SymbolId, usize>,
    /// ctor symbol -> field count (for tupling of payloads)
    ctors: HashMap<SymbolId, CtorInfo>,
    /// arity -> shared object encoding, filled on first demand
    objects: HashMap<usize, ObjectInfo>,
    /// bindings for the object datatypes and accessors, in emission order
    object_bindings: Vec<ml::Binding>,
    /// state cells currently in scope
    state_cells: HashSet<SymbolId>,
}

impl Transformer {
    fn new() -> Transformer {
        Transformer {
            names: Names::new(),
            ops: HashMap::default(),
            interfaces: HashMap::default(),
            ctors: HashMap::default(),
            objects: HashMap::default(),
            object_bindings: Vec::new(),
            state_cells: HashSet::default(),
        }
    }

    fn register(&mut self, decl: &Declaration) {
        match decl {
            Declaration::Data(data) => {
                for ctor in &data.ctors {
                    self.ctors.insert(ctor.id.id, CtorInfo { fields: ctor.fields.len() });
                }
            }
            Declaration::Interface(iface) => {
                let arity = iface.ops.len();
                self.interfaces.insert(iface.id.id, arity);
                for (index, op) in iface.ops.iter().enumerate() {
                    self.ops.insert(op.id.id, OpInfo { index, arity });
                }
            }
        }
    }

    /// The object encoding shared by all interfaces of the given arity.
    /// The first request emits the datatype and its accessors.
    pub(crate) fn object_info(&mut self, arity: usize) -> ObjectInfo {
        if let Some(info) = self.objects.get(&arity) {
            return info.clone();
        }
        let type_name = format!("Object{arity}");
        let tvars: Vec<String> = (0..arity).map(decls::tvar).collect();
        let payload = match arity {
            0 => None,
            1 => Some(ml::Type::Var(tvars[0].clone())),
            _ => Some(ml::Type::Tuple(tvars.iter().cloned().map(ml::Type::Var).collect())),
        };
        self.object_bindings.push(ml::Binding::DataBind {
            name: type_name.clone(),
            tvars,
            ctors: vec![(type_name.clone(), payload)],
        });

        let members: Vec<String> = (1..=arity).map(|i| format!("member{i}of{arity}")).collect();
        for (index, member) in members.iter().enumerate() {
            let args: Vec<ml::Pattern> = (0..arity)
                .map(|i| {
                    if i == index {
                        ml::Pattern::Var("arg".to_owned())
                    } else {
                        ml::Pattern::Wildcard
                    }
                })
                .collect();
            self.object_bindings.push(ml::Binding::FunBind {
                name: member.clone(),
                params: vec![Param::Patterned(ml::Pattern::Ctor {
                    name: type_name.clone(),
                    args,
                })],
                body: ml::Expr::var("arg"),
            });
        }

        let info = ObjectInfo { type_name, members };
        self.objects.insert(arity, info.clone());
        info
    }

    /// The accessor selecting the given operation from its object.
    pub(crate) fn member_accessor(&mut self, op: &Symbol) -> BackendResult<String> {
        let Some(info) = self.ops.get(&op.id).copied() else {
            return Err(BackendError::Impossible(format!(
                "operation {} does not belong to any known interface",
                op.name.id
            )));
        };
        Ok(self.object_info(info.arity).members[info.index].clone())
    }

    /// Lower a run of definitions in dependency order.
    pub(crate) fn transform_definitions(
        &mut self,
        definitions: &[Definition],
    ) -> BackendResult<Vec<ml::Binding>> {
        let sorted = sort::sort_definitions(definitions)?;
        let mut bindings = Vec::with_capacity(sorted.len());
        for definition in sorted {
            bindings.push(self.transform_definition(definition)?);
        }
        Ok(bindings)
    }

    fn transform_definition(&mut self, definition: &Definition) -> BackendResult<ml::Binding> {
        match definition {
            Definition::Def(Def { id, block: Block::BlockLit(lit) }) => {
                let name = self.names.name_of(id);
                let mut params: Vec<Param> =
                    lit.params.iter().map(|p| Param::Named(self.names.name_of(&p.id))).collect();
                let k = self.names.fresh("k");
                params.push(Param::Named(k.clone()));
                let body = self
                    .transform_term(&lit.body)?
                    .apply(Continuation::Dynamic(ml::Expr::var(k)));
                Ok(ml::Binding::FunBind { name, params, body })
            }
            Definition::Def(Def { id, block }) => {
                let name = self.names.name_of(id);
                let expr = self.transform_block(block)?;
                Ok(ml::Binding::ValBind { name, expr })
            }
            Definition::Let(Let { id: Binder::Wildcard, expr }) => {
                // An anonymous binding still runs for its effects.
                Ok(ml::Binding::AnonBind { expr: self.transform_expr(expr)? })
            }
            Definition::Let(Let { id: Binder::Id(id), expr }) => {
                let name = self.names.name_of(id);
                Ok(ml::Binding::ValBind { name, expr: self.transform_expr(expr)? })
            }
        }
    }
}

/// Transform a lifted module. When `main` is given, the toplevel ends
/// with the entry-point call of [`run_main`].
pub fn transform(module: &Module, main: Option<&Symbol>) -> BackendResult<ml::Toplevel> {
    debug!("transforming module {}", module.path);
    let mut transformer = Transformer::new();
    for decl in &module.decls {
        transformer.register(decl);
    }

    let mut data_bindings = Vec::new();
    for decl in &module.decls {
        match decl {
            Declaration::Data(data) => data_bindings.extend(transformer.transform_data(data)),
            Declaration::Interface(iface) => {
                transformer.object_info(iface.ops.len());
            }
        }
    }

    let extern_bindings: Vec<ml::Binding> = module
        .externs
        .iter()
        .map(|ext| transformer.transform_extern(ext))
        .collect();

    let definition_bindings = transformer.transform_definitions(&module.definitions)?;

    let mut bindings = data_bindings;
    bindings.extend(transformer.object_bindings.clone());
    bindings.extend(extern_bindings);
    bindings.extend(definition_bindings);

    let main_call =
        main.map(|main| run_main(ml::Expr::Variable(transformer.names.name_of(main))));
    Ok(ml::Toplevel { bindings, main_call })
}

/// The entry point: apply the main function to two identity
/// continuations, the outer prompt and the outer continuation.
pub fn run_main(main: ml::Expr) -> ml::Expr {
    let identity =
        ml::Expr::lambda(vec![Param::Named("a".to_owned())], ml::Expr::var("a"));
    ml::Expr::call(main, vec![identity.clone(), identity])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast::SymbolKind;
    use ast::source::Lit;

    fn sym(id: u32, name: &str) -> Symbol {
        Symbol::new(id, name, SymbolKind::Block)
    }

    fn int(value: i64) -> Expr {
        Expr::Literal(Lit::Int(value))
    }

    fn ret(expr: Expr) -> Term {
        Term::Return(Return { expr })
    }

    fn block_lit(params: Vec<Symbol>, body: Term) -> BlockLit {
        BlockLit {
            tparams: vec![],
            params: params.into_iter().map(|id| ast::lifted::Param { id }).collect(),
            body: Box::new(body),
        }
    }

    fn empty_module(definitions: Vec<Definition>) -> Module {
        Module { path: "test".to_owned(), decls: vec![], externs: vec![], definitions }
    }

    #[test]
    fn test_return_becomes_pure() {
        // Return(42)  ~>  fn k => k(42)
        let mut t = Transformer::new();
        let cps = t.transform_term(&ret(int(42))).unwrap();
        let reified = cps.reify(&t.names);
        assert_eq!(
            reified,
            ml::Expr::lambda(
                vec![Param::Named("k0".to_owned())],
                ml::Expr::call(ml::Expr::var("k0"), vec![ml::Expr::RawValue("42".to_owned())]),
            )
        );
    }

    #[test]
    fn test_val_chain_passes_continuation_last() {
        // Val(x, App(f, [], [1]), Return(x))  ~>  fn k => f(1, fn a => let x = a in k(x))
        let f = sym(1, "f");
        let x = Symbol::new(2, "x", SymbolKind::Value);
        let term = Term::Val(Val {
            id: x.clone(),
            binding: Box::new(Term::App(App {
                block: Block::BlockVar(f),
                targs: vec![],
                args: vec![Argument::Expr(int(1))],
            })),
            body: Box::new(ret(Expr::ValueVar(x))),
        });

        let mut t = Transformer::new();
        let out = t
            .transform_term(&term)
            .unwrap()
            .apply(Continuation::Dynamic(ml::Expr::var("k")));

        let ml::Expr::Call { fun, args } = out else { panic!("expected call of f") };
        assert_eq!(*fun, ml::Expr::var("f"));
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], ml::Expr::RawValue("1".to_owned()));
        // The continuation is the trailing argument and binds x.
        let ml::Expr::Lambda { params, body } = &args[1] else {
            panic!("expected reified continuation")
        };
        assert_eq!(params.len(), 1);
        let ml::Expr::Let { bindings, body } = &**body else { panic!("expected let") };
        assert!(
            matches!(&bindings[0], ml::Binding::ValBind { name, .. } if name == "x"),
            "{bindings:?}"
        );
        assert_eq!(**body, ml::Expr::call(ml::Expr::var("k"), vec![ml::Expr::var("x")]));
    }

    #[test]
    fn test_if_joins_the_continuation() {
        // If(true, Return 1, Return 2)  ~>  fn k => let k' = k in if true then k'(1) else k'(2)
        let term = Term::If(If {
            cond: Expr::Literal(Lit::Bool(true)),
            then_term: Box::new(ret(int(1))),
            else_term: Box::new(ret(int(2))),
        });
        let mut t = Transformer::new();
        let out = t
            .transform_term(&term)
            .unwrap()
            .apply(Continuation::Dynamic(ml::Expr::var("k")));
        assert_eq!(
            out,
            ml::Expr::let_in(
                vec![ml::Binding::ValBind { name: "k0".to_owned(), expr: ml::Expr::var("k") }],
                ml::Expr::if_else(
                    ml::Expr::var("trueVal"),
                    ml::Expr::call(ml::Expr::var("k0"), vec![ml::Expr::RawValue("1".to_owned())]),
                    ml::Expr::call(ml::Expr::var("k0"), vec![ml::Expr::RawValue("2".to_owned())]),
                ),
            )
        );
    }

    #[test]
    fn test_try_installs_prompt() {
        // Try(fn ev => Return 7, [])  ~>  fn k => reset(body(lift))(k)
        let ev = sym(1, "ev");
        let term = Term::Try(Try {
            body: Block::BlockLit(block_lit(vec![ev], ret(int(7)))),
            handlers: vec![],
        });
        let mut t = Transformer::new();
        let out = t
            .transform_term(&term)
            .unwrap()
            .apply(Continuation::Dynamic(ml::Expr::var("k")));

        // Outermost: applied to the continuation.
        let ml::Expr::Call { fun, args } = out else { panic!("expected call") };
        assert_eq!(args, vec![ml::Expr::var("k")]);
        // Next: reset, i.e. application to the pure continuation.
        let ml::Expr::Call { fun, args } = *fun else { panic!("expected reset") };
        assert_eq!(args.len(), 1);
        assert!(matches!(args[0], ml::Expr::Lambda { .. }), "pure continuation is a lambda");
        // Innermost: the body applied to the lift evidence.
        let ml::Expr::Call { fun, args } = *fun else { panic!("expected evidence application") };
        assert_eq!(args, vec![ml::Expr::var("lift")]);
        let ml::Expr::Lambda { params, .. } = *fun else { panic!("expected body lambda") };
        assert_eq!(params.len(), 2, "evidence parameter plus continuation");
    }

    #[test]
    fn test_interfaces_share_object_per_arity() {
        let iface1 = Declaration::Interface(Interface {
            id: Symbol::new(1, "Reader", SymbolKind::Type),
            tparams: vec![Symbol::new(2, "R", SymbolKind::Type)],
            ops: vec![Property {
                id: sym(3, "ask"),
                tpe: ast::BlockType::Interface(ast::InterfaceType {
                    symbol: Symbol::new(1, "Reader", SymbolKind::Type),
                    args: vec![],
                }),
            }],
        });
        let iface2 = Declaration::Interface(Interface {
            id: Symbol::new(4, "Exc", SymbolKind::Type),
            tparams: vec![],
            ops: vec![Property {
                id: sym(5, "raise"),
                tpe: ast::BlockType::Interface(ast::InterfaceType {
                    symbol: Symbol::new(4, "Exc", SymbolKind::Type),
                    args: vec![],
                }),
            }],
        });
        let module = Module {
            path: "test".to_owned(),
            decls: vec![iface1, iface2],
            externs: vec![],
            definitions: vec![],
        };
        let toplevel = transform(&module, None).unwrap();
        // One datatype and one accessor for arity 1, emitted exactly once.
        assert_eq!(
            toplevel.bindings,
            vec![
                ml::Binding::DataBind {
                    name: "Object1".to_owned(),
                    tvars: vec!["a".to_owned()],
                    ctors: vec![(
                        "Object1".to_owned(),
                        Some(ml::Type::Var("a".to_owned()))
                    )],
                },
                ml::Binding::FunBind {
                    name: "member1of1".to_owned(),
                    params: vec![Param::Patterned(ml::Pattern::Ctor {
                        name: "Object1".to_owned(),
                        args: vec![ml::Pattern::Var("arg".to_owned())],
                    })],
                    body: ml::Expr::var("arg"),
                },
            ]
        );
    }

    #[test]
    fn test_mutual_recursion_is_rejected() {
        let even = sym(1, "even");
        let odd = sym(2, "odd");
        let definitions = vec![
            Definition::Def(Def {
                id: even.clone(),
                block: Block::BlockLit(block_lit(
                    vec![],
                    Term::App(App {
                        block: Block::BlockVar(odd.clone()),
                        targs: vec![],
                        args: vec![],
                    }),
                )),
            }),
            Definition::Def(Def {
                id: odd,
                block: Block::BlockLit(block_lit(
                    vec![],
                    Term::App(App { block: Block::BlockVar(even), targs: vec![], args: vec![] }),
                )),
            }),
        ];
        let err = transform(&empty_module(definitions), None).unwrap_err();
        let BackendError::MutualRecursionUnsupported { names } = err else {
            panic!("expected mutual recursion error")
        };
        assert!(names.contains("even") && names.contains("odd"), "{names}");
    }

    #[test]
    fn test_definitions_emit_in_dependency_order() {
        let f = sym(1, "f");
        let g = sym(2, "g");
        // f calls g but is defined first; emission must flip them.
        let definitions = vec![
            Definition::Def(Def {
                id: f,
                block: Block::BlockLit(block_lit(
                    vec![],
                    Term::App(App {
                        block: Block::BlockVar(g.clone()),
                        targs: vec![],
                        args: vec![],
                    }),
                )),
            }),
            Definition::Def(Def {
                id: g,
                block: Block::BlockLit(block_lit(vec![], ret(int(1)))),
            }),
        ];
        let toplevel = transform(&empty_module(definitions), None).unwrap();
        let names: Vec<&str> = toplevel
            .bindings
            .iter()
            .map(|binding| match binding {
                ml::Binding::FunBind { name, .. } => name.as_str(),
                other => panic!("expected function bindings, got {other:?}"),
            })
            .collect();
        assert_eq!(names, vec!["g", "f"]);
        // Every emitted function takes its parameters plus the
        // continuation.
        for binding in &toplevel.bindings {
            let ml::Binding::FunBind { params, .. } = binding else { unreachable!() };
            assert_eq!(params.len(), 1);
        }
    }

    #[test]
    fn test_lets_stay_in_source_order() {
        let a = Symbol::new(1, "a", SymbolKind::Value);
        let b = Symbol::new(2, "b", SymbolKind::Value);
        let f = sym(3, "f");
        let definitions = vec![
            Definition::Let(Let { id: Binder::Id(a), expr: int(1) }),
            Definition::Def(Def {
                id: f,
                block: Block::BlockLit(block_lit(vec![], ret(int(0)))),
            }),
            Definition::Let(Let { id: Binder::Id(b), expr: int(2) }),
        ];
        let toplevel = transform(&empty_module(definitions), None).unwrap();
        let kinds: Vec<&str> = toplevel
            .bindings
            .iter()
            .map(|binding| match binding {
                ml::Binding::ValBind { name, .. } => name.as_str(),
                ml::Binding::FunBind { name, .. } => name.as_str(),
                other => panic!("unexpected binding {other:?}"),
            })
            .collect();
        assert_eq!(kinds, vec!["a", "f", "b"]);
    }

    #[test]
    fn test_state_in_global_region_is_a_ref() {
        let cell = Symbol::new(1, "s", SymbolKind::Value);
        let get = sym(2, "get");
        let term = Term::State(State {
            id: cell.clone(),
            init: int(0),
            region: StateRegion::Global,
            evidence: Evidence::here(),
            body: Box::new(Term::App(App {
                block: Block::Member(Member {
                    receiver: Box::new(Block::BlockVar(cell)),
                    op: get,
                }),
                targs: vec![],
                args: vec![Argument::Evidence(Evidence::here())],
            })),
        });
        let mut t = Transformer::new();
        let out = t
            .transform_term(&term)
            .unwrap()
            .apply(Continuation::Dynamic(ml::Expr::var("k")));
        assert_eq!(
            out,
            ml::Expr::let_in(
                vec![ml::Binding::ValBind {
                    name: "s".to_owned(),
                    expr: ml::Expr::Ref(Box::new(ml::Expr::RawValue("0".to_owned()))),
                }],
                ml::Expr::call(
                    ml::Expr::var("k"),
                    vec![ml::Expr::Deref(Box::new(ml::Expr::var("s")))],
                ),
            )
        );
    }

    #[test]
    fn test_evidence_composition() {
        let mut t = Transformer::new();
        let x = sym(1, "x");

        let empty = Evidence::here();
        assert_eq!(t.evidence_expr(&empty), ml::Expr::var("here"));

        let single = Evidence { lifts: vec![Lift::Try] };
        assert_eq!(t.evidence_expr(&single), ml::Expr::var("lift"));

        let composed = Evidence { lifts: vec![Lift::Var(x), Lift::Try, Lift::Reg] };
        assert_eq!(
            t.evidence_expr(&composed),
            ml::Expr::call(
                ml::Expr::var("nested"),
                vec![
                    ml::Expr::var("x"),
                    ml::Expr::call(
                        ml::Expr::var("nested"),
                        vec![ml::Expr::var("lift"), ml::Expr::var("lift")],
                    ),
                ],
            )
        );
    }

    #[test]
    fn test_run_main_applies_two_identities() {
        let identity =
            ml::Expr::lambda(vec![Param::Named("a".to_owned())], ml::Expr::var("a"));
        assert_eq!(
            run_main(ml::Expr::var("main")),
            ml::Expr::call(ml::Expr::var("main"), vec![identity.clone(), identity]),
        );
    }

    #[test]
    fn test_hole_raises() {
        let mut t = Transformer::new();
        let out = t
            .transform_term(&Term::Hole)
            .unwrap()
            .apply(Continuation::Dynamic(ml::Expr::var("k")));
        assert_eq!(out, ml::Expr::RawExpr("raise Hole".to_owned()));
    }
}
