//! Checking of toplevel definitions.
//!
//! Two passes. *Precheck* assigns every type that can be assembled from
//! annotations alone (constructors, record accessors, operations,
//! externs, fully annotated functions); this is what makes annotated
//! mutual recursion work. *Synth* then re-walks every function and checks
//! its body, binding the solved type of unannotated functions as it goes.

use std::rc::Rc;

use log::trace;

use ast::source::*;
use ast::*;

use super::ctx::{Ctx, DeclTable, DependencyTypes, ModuleTypes};
use super::exprs::CheckInfer;
use super::exprs::ExpectTyped;
use crate::result::{TcResult, TypeError, TypeWarning};

/// The result of checking a module: the annotated tree plus everything
/// the driver needs to surface diagnostics and feed the dependency
/// database.
#[derive(Debug)]
pub struct CheckedModule {
    pub module: ModuleDecl,
    pub table: DeclTable,
    pub exports: ModuleTypes,
    pub errors: Vec<TypeError>,
    pub warnings: Vec<TypeWarning>,
}

impl CheckedModule {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

pub fn check_module(
    module: &ModuleDecl,
    deps: Rc<DependencyTypes>,
    first_free_symbol: u32,
) -> CheckedModule {
    let mut table = DeclTable::default();
    for decl in &module.decls {
        table.register(decl);
    }

    let mut ctx =
        Ctx::new(table.clone(), deps, SymbolSource::starting_at(first_free_symbol));

    precheck(&mut ctx, module);

    let mut definitions = Vec::with_capacity(module.definitions.len());
    for def in &module.definitions {
        trace!("checking definition {}", def.symbol.name.id);
        match check_fun_def(&mut ctx, def) {
            Ok(out) => definitions.push(out),
            Err(error) => {
                // Fatal for this definition; continue with the next.
                ctx.report(error);
                definitions.push(def.clone());
            }
        }
    }

    let module = ModuleDecl {
        path: module.path.clone(),
        decls: module.decls.clone(),
        externs: module.externs.clone(),
        definitions,
    };
    let exports = ctx.exports();
    CheckedModule { module, table, exports, errors: ctx.errors, warnings: ctx.warnings }
}

/// Assign the types that follow from annotations alone.
fn precheck(ctx: &mut Ctx, module: &ModuleDecl) {
    for decl in &module.decls {
        match decl {
            Decl::Data(data) => {
                for ctor in &data.ctors {
                    if let Ok(meta) = ctx.lookup_ctor(&ctor.symbol, ctor.span) {
                        ctx.bind_block(
                            &ctor.symbol,
                            BlockType::Function(Box::new(meta.function_type())),
                        );
                    }
                }
            }
            Decl::Record(record) => {
                if let Ok(meta) = ctx.lookup_ctor(&record.ctor, record.span) {
                    ctx.bind_block(
                        &record.ctor,
                        BlockType::Function(Box::new(meta.function_type())),
                    );
                }
                let record_type = ValueType::Constructor(TypeApp {
                    symbol: record.symbol.clone(),
                    args: record
                        .tparams
                        .iter()
                        .map(|p| ValueType::Var(p.clone()))
                        .collect(),
                });
                for field in &record.fields {
                    let accessor = FunctionType {
                        tparams: record.tparams.clone(),
                        cparams: Vec::new(),
                        vparams: vec![record_type.clone()],
                        bparams: Vec::new(),
                        result: field.tpe.clone(),
                        effects: Effects::empty(),
                    };
                    ctx.bind_block(&field.symbol, BlockType::Function(Box::new(accessor)));
                }
            }
            Decl::Interface(iface) => {
                let self_effect = if iface.tparams.is_empty() {
                    Effect::Interface(iface.symbol.clone())
                } else {
                    Effect::Apply(InterfaceType {
                        symbol: iface.symbol.clone(),
                        args: iface
                            .tparams
                            .iter()
                            .map(|p| ValueType::Var(p.clone()))
                            .collect(),
                    })
                };
                for op in &iface.ops {
                    let mut effects = op.effects.clone();
                    effects.insert(self_effect.clone());
                    let op_type = FunctionType {
                        tparams: iface.tparams.iter().chain(&op.tparams).cloned().collect(),
                        cparams: Vec::new(),
                        vparams: op.vparams.clone(),
                        bparams: Vec::new(),
                        result: op.result.clone(),
                        effects,
                    };
                    ctx.bind_block(&op.symbol, BlockType::Function(Box::new(op_type)));
                }
            }
            Decl::TypeAlias(_) | Decl::EffectAlias(_) => {}
        }
    }

    for ext in &module.externs {
        let mut vparams = Vec::with_capacity(ext.vparams.len());
        for param in &ext.vparams {
            match &param.annot {
                Some(annot) => vparams.push(annot.clone()),
                None => ctx.report(Box::new(TypeError::CannotInferParam {
                    name: param.symbol.name.id.clone(),
                    span: None,
                })),
            }
        }
        let ft = FunctionType {
            tparams: ext.tparams.clone(),
            cparams: Vec::new(),
            vparams,
            bparams: Vec::new(),
            result: ext.result.clone(),
            effects: ext.effects.clone(),
        };
        ctx.bind_block(&ext.symbol, BlockType::Function(Box::new(ft)));
    }

    for def in &module.definitions {
        if def.is_fully_annotated() {
            ctx.bind_block(&def.symbol, BlockType::Function(Box::new(annotated_type(def))));
        }
    }
}

/// The function type of a fully annotated definition.
fn annotated_type(def: &FunDef) -> FunctionType {
    let (result, effects) = def.ret.clone().expect("definition is fully annotated");
    FunctionType {
        tparams: def.tparams.clone(),
        cparams: def.cparams.clone(),
        vparams: def.vparams.iter().filter_map(|p| p.annot.clone()).collect(),
        bparams: def.bparams.iter().map(|p| p.annot.clone()).collect(),
        result,
        effects,
    }
}

fn check_fun_def(ctx: &mut Ctx, def: &FunDef) -> TcResult<FunDef> {
    ctx.unifier.enter_scope();

    let mut vparams_out = Vec::with_capacity(def.vparams.len());
    for param in &def.vparams {
        let tpe = match &param.annot {
            Some(annot) => annot.clone(),
            None => ctx.unifier.fresh_value_var(),
        };
        ctx.bind_value(&param.symbol, tpe.clone());
        vparams_out.push(ValueParam {
            span: param.span,
            symbol: param.symbol.clone(),
            annot: Some(tpe),
        });
    }
    for param in &def.bparams {
        ctx.bind_block(&param.symbol, param.annot.clone());
    }

    let body = match &def.ret {
        Some((result, _)) => def.body.check(ctx, &result.dealias())?,
        None => def.body.infer(ctx)?,
    };

    let body_effects = match ctx.concrete_effects(&body.expect_effects()?, def.span) {
        Ok(effects) => effects,
        Err(error) => {
            ctx.report(error);
            ConcreteEffects::empty()
        }
    };

    match &def.ret {
        Some((_, declared)) => {
            // Control effects the annotation does not declare are
            // unhandled at the top level of this definition.
            let declared = ctx.concrete_effects(&declared.clone(), def.span)?;
            let leftover = body_effects.minus(&declared);
            if !leftover.is_empty() {
                ctx.report(TypeError::unhandled_effects(&def.symbol, &leftover, def.span));
            }
        }
        None => {
            // The inferred effects become part of the function's type.
            let result = ctx.unifier.substitute(&body.expect_typ()?);
            let ft = FunctionType {
                tparams: def.tparams.clone(),
                cparams: def.cparams.clone(),
                vparams: vparams_out
                    .iter()
                    .filter_map(|p| p.annot.as_ref())
                    .map(|t| ctx.unifier.substitute(t))
                    .collect(),
                bparams: def.bparams.iter().map(|p| p.annot.clone()).collect(),
                result,
                effects: body_effects.clone().into_effects(),
            };
            ctx.bind_block(&def.symbol, BlockType::Function(Box::new(ft)));
        }
    }

    // Nothing from this definition's unification scope may survive
    // unsolved in the types we keep.
    let escaping: Vec<ValueType> = vparams_out
        .iter()
        .filter_map(|p| p.annot.as_ref())
        .map(|t| ctx.unifier.substitute(t))
        .chain(body.expect_typ().ok().map(|t| ctx.unifier.substitute(&t)))
        .collect();
    let escaping_refs: Vec<&ValueType> = escaping.iter().collect();
    if let Err(cause) = ctx.unifier.leave_scope(&escaping_refs) {
        ctx.report(TypeError::lifted(cause, def.span));
    }

    let mut out = FunDef {
        span: def.span,
        symbol: def.symbol.clone(),
        tparams: def.tparams.clone(),
        cparams: def.cparams.clone(),
        vparams: vparams_out,
        bparams: def.bparams.clone(),
        ret: def.ret.clone(),
        body,
    };
    out.zonk(ctx.unifier.subst());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast::source::*;
    use printer::Print;

    fn sym(id: u32, name: &str, kind: SymbolKind) -> Symbol {
        Symbol::new(id, name, kind)
    }

    fn int_lit(value: i64) -> Expr {
        Expr::Literal(Literal { span: None, lit: Lit::Int(value), inferred_type: None })
    }

    fn ret(expr: Expr) -> Stmt {
        Stmt::Return(ReturnStmt { span: None, expr, inferred_type: None, inferred_effects: None })
    }

    fn fun(symbol: Symbol, vparams: Vec<ValueParam>, ret_type: ValueType, body: Stmt) -> FunDef {
        FunDef {
            span: None,
            symbol,
            tparams: vec![],
            cparams: vec![],
            vparams,
            bparams: vec![],
            ret: Some((ret_type, Effects::empty())),
            body,
        }
    }

    fn vparam(symbol: Symbol, annot: ValueType) -> ValueParam {
        ValueParam { span: None, symbol, annot: Some(annot) }
    }

    fn call(layers: Vec<Vec<Symbol>>, name: &str, vargs: Vec<Expr>) -> CallExpr {
        CallExpr {
            span: None,
            target: CallTarget::Id(IdTarget {
                name: Ident::from_string(name),
                layers,
                resolved: None,
            }),
            targs: vec![],
            vargs,
            bargs: vec![],
            inferred_targs: None,
            inferred_type: None,
            inferred_effects: None,
        }
    }

    fn check(module: &ModuleDecl) -> CheckedModule {
        check_module(module, Rc::new(DependencyTypes::default()), 1000)
    }

    fn empty_module(definitions: Vec<FunDef>) -> ModuleDecl {
        ModuleDecl { path: "test".to_owned(), decls: vec![], externs: vec![], definitions }
    }

    #[test]
    fn test_annotated_literal_definition() {
        let f = sym(1, "f", SymbolKind::Block);
        let module = empty_module(vec![fun(f, vec![], ValueType::int(), ret(int_lit(42)))]);
        let checked = check(&module);
        assert!(checked.errors.is_empty(), "{:?}", checked.errors);
        assert_eq!(
            checked.module.definitions[0].body.inferred_type(),
            Some(&ValueType::int())
        );
    }

    #[test]
    fn test_return_type_mismatch_is_buffered() {
        let f = sym(1, "f", SymbolKind::Block);
        let module = empty_module(vec![fun(f, vec![], ValueType::bool(), ret(int_lit(42)))]);
        let checked = check(&module);
        assert_eq!(checked.errors.len(), 1);
        assert!(matches!(checked.errors[0], TypeError::UnificationFailure { .. }));
    }

    #[test]
    fn test_overload_resolution_is_deterministic() {
        // Two candidates named `id`, one over Int and one over Bool; the
        // Int argument selects the Int overload, every time.
        let id_int = sym(1, "id", SymbolKind::Block);
        let id_bool = sym(2, "id", SymbolKind::Block);
        let x = sym(3, "x", SymbolKind::Value);
        let y = sym(4, "y", SymbolKind::Value);
        let main = sym(5, "main", SymbolKind::Block);

        let make_module = || {
            let defs = vec![
                fun(
                    id_int.clone(),
                    vec![vparam(x.clone(), ValueType::int())],
                    ValueType::int(),
                    ret(Expr::Var(VarRef { span: None, symbol: x.clone(), inferred_type: None })),
                ),
                fun(
                    id_bool.clone(),
                    vec![vparam(y.clone(), ValueType::bool())],
                    ValueType::bool(),
                    ret(Expr::Var(VarRef { span: None, symbol: y.clone(), inferred_type: None })),
                ),
                fun(
                    main.clone(),
                    vec![],
                    ValueType::int(),
                    ret(Expr::Call(call(
                        vec![vec![id_int.clone(), id_bool.clone()]],
                        "id",
                        vec![int_lit(1)],
                    ))),
                ),
            ];
            empty_module(defs)
        };

        let resolved_symbol = |checked: &CheckedModule| {
            let Stmt::Return(ret_stmt) = &checked.module.definitions[2].body else {
                panic!("expected return")
            };
            let Expr::Call(call) = &ret_stmt.expr else { panic!("expected call") };
            let CallTarget::Id(target) = &call.target else { panic!("expected id target") };
            target.resolved.clone().expect("call should be resolved")
        };

        let first = check(&make_module());
        assert!(first.errors.is_empty(), "{:?}", first.errors);
        let second = check(&make_module());
        assert_eq!(resolved_symbol(&first), resolved_symbol(&second));
        assert_eq!(resolved_symbol(&first), id_int);
    }

    #[test]
    fn test_call_type_arguments_are_annotated() {
        // fun first[T](x: T): T = return x;  fun main(): Int = return first(42)
        let tparam = sym(1, "T", SymbolKind::Type);
        let first = sym(2, "first", SymbolKind::Block);
        let x = sym(3, "x", SymbolKind::Value);
        let main = sym(4, "main", SymbolKind::Block);
        let module = empty_module(vec![
            FunDef {
                span: None,
                symbol: first.clone(),
                tparams: vec![tparam.clone()],
                cparams: vec![],
                vparams: vec![vparam(x.clone(), ValueType::Var(tparam.clone()))],
                bparams: vec![],
                ret: Some((ValueType::Var(tparam), Effects::empty())),
                body: ret(Expr::Var(VarRef { span: None, symbol: x, inferred_type: None })),
            },
            fun(
                main,
                vec![],
                ValueType::int(),
                ret(Expr::Call(call(vec![vec![first]], "first", vec![int_lit(42)]))),
            ),
        ]);
        let checked = check(&module);
        assert!(checked.errors.is_empty(), "{:?}", checked.errors);

        let Stmt::Return(ret_stmt) = &checked.module.definitions[1].body else {
            panic!("expected return")
        };
        let Expr::Call(call) = &ret_stmt.expr else { panic!("expected call") };
        // One type parameter, one solved type argument.
        let targs = call.inferred_targs.as_ref().expect("type arguments annotated");
        assert_eq!(targs, &vec![ValueType::int()]);
        // Nothing stored on the tree mentions a unification variable.
        assert!(call.inferred_type.as_ref().unwrap().is_concrete());
        assert!(call.inferred_effects.as_ref().unwrap().is_concrete());
    }

    #[test]
    fn test_failed_trials_do_not_leak_diagnostics() {
        let id_int = sym(1, "id", SymbolKind::Block);
        let x = sym(2, "x", SymbolKind::Value);
        let main = sym(3, "main", SymbolKind::Block);
        let module = empty_module(vec![
            fun(
                id_int.clone(),
                vec![vparam(x.clone(), ValueType::int())],
                ValueType::int(),
                ret(Expr::Var(VarRef { span: None, symbol: x.clone(), inferred_type: None })),
            ),
            fun(
                main,
                vec![],
                ValueType::int(),
                ret(Expr::Call(call(vec![vec![id_int]], "id", vec![int_lit(1)]))),
            ),
        ]);
        let checked = check(&module);
        assert!(checked.errors.is_empty(), "{:?}", checked.errors);
    }

    #[test]
    fn test_unannotated_mutual_recursion_fails() {
        // `even` calls `odd` before `odd` has a type: without annotations
        // this must surface as a missing function type.
        let even = sym(1, "even", SymbolKind::Block);
        let odd = sym(2, "odd", SymbolKind::Block);
        let module = empty_module(vec![
            FunDef {
                span: None,
                symbol: even.clone(),
                tparams: vec![],
                cparams: vec![],
                vparams: vec![],
                bparams: vec![],
                ret: None,
                body: ret(Expr::Call(call(vec![vec![odd.clone()]], "odd", vec![]))),
            },
            FunDef {
                span: None,
                symbol: odd,
                tparams: vec![],
                cparams: vec![],
                vparams: vec![],
                bparams: vec![],
                ret: None,
                body: ret(Expr::Call(call(vec![vec![even]], "even", vec![]))),
            },
        ]);
        let checked = check(&module);
        assert!(
            checked.errors.iter().any(|e| matches!(e, TypeError::NoFunctionType { .. })),
            "{:?}",
            checked.errors
        );
    }

    #[test]
    fn test_handler_discharges_effect() {
        // interface Ask { ask(): Int }
        // fun main(): Int = try { val x = ask(); return x } with Ask { ask() resume => return 7 }
        let ask_iface = sym(1, "Ask", SymbolKind::Type);
        let ask_op = sym(2, "ask", SymbolKind::Block);
        let main = sym(3, "main", SymbolKind::Block);
        let x = sym(4, "x", SymbolKind::Value);
        let resume = sym(5, "resume", SymbolKind::Block);

        let iface_decl = Decl::Interface(InterfaceDecl {
            span: None,
            symbol: ask_iface.clone(),
            tparams: vec![],
            ops: vec![OpDecl {
                span: None,
                symbol: ask_op.clone(),
                tparams: vec![],
                vparams: vec![],
                result: ValueType::int(),
                effects: Effects::empty(),
            }],
        });

        let body = Stmt::Val(ValStmt {
            span: None,
            symbol: x.clone(),
            annot: None,
            binding: Expr::Call(call(vec![vec![ask_op.clone()]], "ask", vec![])),
            rest: Box::new(ret(Expr::Var(VarRef {
                span: None,
                symbol: x.clone(),
                inferred_type: None,
            }))),
            inferred_type: None,
            inferred_effects: None,
        });

        let handler = Handler {
            span: None,
            iface: ask_iface.clone(),
            targs: vec![],
            clauses: vec![OpClause {
                span: None,
                op: ask_op.clone(),
                params: vec![],
                resume,
                body: ret(int_lit(7)),
            }],
        };

        let try_handle = Expr::TryHandle(TryHandle {
            span: None,
            body: Box::new(body),
            handlers: vec![handler],
            inferred_type: None,
            inferred_effects: None,
        });

        let module = ModuleDecl {
            path: "test".to_owned(),
            decls: vec![iface_decl],
            externs: vec![],
            definitions: vec![fun(main, vec![], ValueType::int(), ret(try_handle))],
        };
        let checked = check(&module);
        assert!(checked.errors.is_empty(), "{:?}", checked.errors);
        // The handled effect is discharged: nothing leaks to the
        // definition level.
        let effects = checked.module.definitions[0].body.inferred_effects().unwrap();
        assert!(effects.is_empty(), "{}", effects.print_trace());
    }

    #[test]
    fn test_missing_operation_is_reported() {
        let ask_iface = sym(1, "Ask", SymbolKind::Type);
        let ask_op = sym(2, "ask", SymbolKind::Block);
        let main = sym(3, "main", SymbolKind::Block);

        let iface_decl = Decl::Interface(InterfaceDecl {
            span: None,
            symbol: ask_iface.clone(),
            tparams: vec![],
            ops: vec![OpDecl {
                span: None,
                symbol: ask_op,
                tparams: vec![],
                vparams: vec![],
                result: ValueType::int(),
                effects: Effects::empty(),
            }],
        });

        let try_handle = Expr::TryHandle(TryHandle {
            span: None,
            body: Box::new(ret(int_lit(1))),
            handlers: vec![Handler {
                span: None,
                iface: ask_iface,
                targs: vec![],
                clauses: vec![],
            }],
            inferred_type: None,
            inferred_effects: None,
        });

        let module = ModuleDecl {
            path: "test".to_owned(),
            decls: vec![iface_decl],
            externs: vec![],
            definitions: vec![fun(main, vec![], ValueType::int(), ret(try_handle))],
        };
        let checked = check(&module);
        assert!(
            checked.errors.iter().any(|e| matches!(e, TypeError::MissingOperation { .. })),
            "{:?}",
            checked.errors
        );
    }
}
