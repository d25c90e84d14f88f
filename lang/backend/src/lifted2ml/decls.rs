//! Lowering of data declarations, records and externs.

use ast::lifted::*;
use ast::{Builtin, HashMap, SymbolId, ValueType};

use crate::ml::{self, Param};

use super::Transformer;

/// Type variable names by position: `a`, `b`, … then `t26`, `t27`, ….
pub(crate) fn tvar(index: usize) -> String {
    if index < 26 {
        ((b'a' + index as u8) as char).to_string()
    } else {
        format!("t{index}")
    }
}

impl Transformer {
    /// A data type becomes one datatype binding; a record (exactly one
    /// constructor) additionally gets one accessor function per field,
    /// matching on the single constructor and projecting positionally.
    pub(crate) fn transform_data(&mut self, data: &Data) -> Vec<ml::Binding> {
        let tenv: HashMap<SymbolId, String> = data
            .tparams
            .iter()
            .enumerate()
            .map(|(index, param)| (param.id, tvar(index)))
            .collect();
        let tvars: Vec<String> = (0..data.tparams.len()).map(tvar).collect();

        let ctors: Vec<(String, Option<ml::Type>)> = data
            .ctors
            .iter()
            .map(|ctor| {
                let name = self.names.name_of(&ctor.id);
                let payload = match ctor.fields.len() {
                    0 => None,
                    1 => Some(self.ml_type(&ctor.fields[0].tpe, &tenv)),
                    _ => Some(ml::Type::Tuple(
                        ctor.fields.iter().map(|f| self.ml_type(&f.tpe, &tenv)).collect(),
                    )),
                };
                (name, payload)
            })
            .collect();

        let mut bindings = vec![ml::Binding::DataBind {
            name: self.names.name_of(&data.id),
            tvars,
            ctors,
        }];

        if let [ctor] = data.ctors.as_slice() {
            let ctor_name = self.names.name_of(&ctor.id);
            let arity = ctor.fields.len();
            for (index, field) in ctor.fields.iter().enumerate() {
                let args: Vec<ml::Pattern> = (0..arity)
                    .map(|i| {
                        if i == index {
                            ml::Pattern::Var("arg".to_owned())
                        } else {
                            ml::Pattern::Wildcard
                        }
                    })
                    .collect();
                bindings.push(ml::Binding::FunBind {
                    name: self.names.name_of(&field.id),
                    params: vec![Param::Patterned(ml::Pattern::Ctor {
                        name: ctor_name.clone(),
                        args,
                    })],
                    body: ml::Expr::var("arg"),
                });
            }
        }

        bindings
    }

    /// Externs are verbatim target code behind a curried function head.
    pub(crate) fn transform_extern(&mut self, ext: &Extern) -> ml::Binding {
        let name = self.names.name_of(&ext.id);
        let params: Vec<String> =
            ext.params.iter().map(|p| self.names.name_of(&p.id)).collect();
        let text = if params.is_empty() {
            format!("val {} = {}", name, ext.body)
        } else {
            format!("fun {} {} = {}", name, params.join(" "), ext.body)
        };
        ml::Binding::RawBind { text }
    }

    fn ml_type(&mut self, tpe: &ValueType, tenv: &HashMap<SymbolId, String>) -> ml::Type {
        match tpe {
            ValueType::Var(sym) => match tenv.get(&sym.id) {
                Some(name) => ml::Type::Var(name.clone()),
                None => ml::Type::Var(format!("u{}", sym.id)),
            },
            ValueType::Unification(var) => ml::Type::Var(format!("u{}", var.id)),
            ValueType::Constructor(app) => ml::Type::Data {
                name: self.names.name_of(&app.symbol),
                args: app.args.iter().map(|arg| self.ml_type(arg, tenv)).collect(),
            },
            ValueType::Boxed(boxed) => self.ml_block_type(&boxed.block, tenv),
            ValueType::Builtin(builtin) => match builtin {
                Builtin::Int => ml::Type::Integer,
                Builtin::Bool => ml::Type::Bool,
                Builtin::Unit => ml::Type::Unit,
                Builtin::Double => ml::Type::Real,
                Builtin::String => ml::Type::Str,
            },
            ValueType::Alias(app) => self.ml_type(&app.expand(), tenv),
            ValueType::Bottom => ml::Type::Unit,
        }
    }

    fn ml_block_type(
        &mut self,
        tpe: &ast::BlockType,
        tenv: &HashMap<SymbolId, String>,
    ) -> ml::Type {
        match tpe {
            ast::BlockType::Function(ft) => {
                let mut out = self.ml_type(&ft.result, tenv);
                for param in ft.vparams.iter().rev() {
                    out = ml::Type::Fun(Box::new(self.ml_type(param, tenv)), Box::new(out));
                }
                out
            }
            ast::BlockType::Interface(iface) => {
                let arity = self.interfaces.get(&iface.symbol.id).copied().unwrap_or(0);
                ml::Type::Data {
                    name: self.object_info(arity).type_name,
                    args: Vec::new(),
                }
            }
        }
    }
}
