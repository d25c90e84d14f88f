//! Phase sequencing for one compilation.
//!
//! The database owns the diagnostics buffer and the global dependency
//! types of already-checked modules. Phases run synchronously: type
//! checking, then (after the external lifter) the ML transformation,
//! then emission. A non-empty error buffer after a phase skips every
//! downstream phase.

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use log::{debug, warn};

use ast::Symbol;
use ast::lifted;
use ast::source;
use backend::ml;
use elaborator::result::TypeWarning;
use elaborator::typechecker::decls::CheckedModule;
use elaborator::{DependencyTypes, check_module};
use printer::Print;

use crate::result::{DriverError, Error};

#[derive(Default)]
pub struct Database {
    deps: Rc<DependencyTypes>,
    pub errors: Vec<Error>,
    pub warnings: Vec<TypeWarning>,
}

impl Database {
    pub fn new() -> Database {
        Database::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Run the typer over a resolved module. Diagnostics are buffered;
    /// the checked module's exports feed the dependency database so
    /// later modules can look its symbols up.
    pub fn check(
        &mut self,
        module: &source::ModuleDecl,
        first_free_symbol: u32,
    ) -> CheckedModule {
        debug!("checking module {}", module.path);
        let checked = check_module(module, self.deps.clone(), first_free_symbol);

        for warning in &checked.warnings {
            warn!("{warning}");
        }
        self.warnings.extend(checked.warnings.iter().cloned());
        self.errors.extend(checked.errors.iter().cloned().map(|e| Error::Type(Box::new(e))));

        if checked.errors.is_empty() {
            let mut deps = (*self.deps).clone();
            deps.values.extend(checked.exports.values.clone());
            deps.blocks.extend(checked.exports.blocks.clone());
            deps.captures.extend(checked.exports.captures.clone());
            deps.decls.append(checked.table.clone());
            self.deps = Rc::new(deps);
        }
        checked
    }

    /// Lower a lifted module to Target-ML. Skipped when an earlier phase
    /// reported errors.
    pub fn transform(
        &mut self,
        module: &lifted::Module,
        main: Option<&Symbol>,
    ) -> Option<ml::Toplevel> {
        if self.has_errors() {
            debug!("skipping ML transformation of {}: earlier errors", module.path);
            return None;
        }
        match backend::transform(module, main) {
            Ok(toplevel) => Some(toplevel),
            Err(error) => {
                self.errors.push(Error::Backend(error));
                None
            }
        }
    }

    /// Emit a toplevel to `<out_dir>/<path with '/'→'_'>.sml`.
    pub fn write_output(
        &mut self,
        out_dir: &Path,
        module_path: &str,
        toplevel: &ml::Toplevel,
    ) -> Option<PathBuf> {
        if self.has_errors() {
            return None;
        }
        let file = output_path(out_dir, module_path);
        let rendered = toplevel.print_to_string(None);
        if let Err(error) = std::fs::write(&file, rendered) {
            self.errors.push(Error::Driver(DriverError::Io(Arc::new(error))));
            return None;
        }
        debug!("wrote {}", file.display());
        Some(file)
    }
}

/// Each source module maps to exactly one output file.
pub fn output_path(out_dir: &Path, module_path: &str) -> PathBuf {
    out_dir.join(format!("{}.sml", module_path.replace('/', "_")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast::source::*;
    use ast::*;

    fn int_fun(id: u32, name: &str, value: i64) -> FunDef {
        FunDef {
            span: None,
            symbol: Symbol::new(id, name, SymbolKind::Block),
            tparams: vec![],
            cparams: vec![],
            vparams: vec![],
            bparams: vec![],
            ret: Some((ValueType::int(), Effects::empty())),
            body: Stmt::Return(ReturnStmt {
                span: None,
                expr: Expr::Literal(Literal {
                    span: None,
                    lit: Lit::Int(value),
                    inferred_type: None,
                }),
                inferred_type: None,
                inferred_effects: None,
            }),
        }
    }

    fn source_module(definitions: Vec<FunDef>) -> source::ModuleDecl {
        source::ModuleDecl {
            path: "examples/hello".to_owned(),
            decls: vec![],
            externs: vec![],
            definitions,
        }
    }

    #[test]
    fn test_output_path_mapping() {
        let path = output_path(Path::new("/tmp/out"), "examples/hello");
        assert_eq!(path, PathBuf::from("/tmp/out/examples_hello.sml"));
    }

    #[test]
    fn test_pipeline_writes_output() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut db = Database::new();
        let checked = db.check(&source_module(vec![int_fun(1, "main", 42)]), 100);
        assert!(!checked.has_errors());

        let main = Symbol::new(1, "main", SymbolKind::Block);
        let lifted_module = lifted::Module {
            path: "examples/hello".to_owned(),
            decls: vec![],
            externs: vec![],
            definitions: vec![lifted::Definition::Def(lifted::Def {
                id: main.clone(),
                block: lifted::Block::BlockLit(lifted::BlockLit {
                    tparams: vec![],
                    params: vec![],
                    body: Box::new(lifted::Term::Return(lifted::Return {
                        expr: lifted::Expr::Literal(Lit::Int(42)),
                    })),
                }),
            })],
        };
        let toplevel = db.transform(&lifted_module, Some(&main)).expect("no errors");

        let dir = tempfile::tempdir().unwrap();
        let file = db.write_output(dir.path(), &lifted_module.path, &toplevel).unwrap();
        assert_eq!(file.file_name().unwrap(), "examples_hello.sml");
        let contents = std::fs::read_to_string(&file).unwrap();
        assert!(contents.contains("fun main"), "{contents}");
        assert!(contents.contains("val _ = (main"), "{contents}");
    }

    #[test]
    fn test_errors_skip_downstream_phases() {
        let mut db = Database::new();
        // Body returns an Int against a declared Bool return type.
        let mut bad = int_fun(1, "main", 1);
        bad.ret = Some((ValueType::bool(), Effects::empty()));
        db.check(&source_module(vec![bad]), 100);
        assert!(db.has_errors());

        let lifted_module = lifted::Module {
            path: "examples/hello".to_owned(),
            decls: vec![],
            externs: vec![],
            definitions: vec![],
        };
        assert!(db.transform(&lifted_module, None).is_none());
    }
}
