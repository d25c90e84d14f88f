//! Rendering of the Target-ML AST as SML concrete syntax.
//!
//! Every compound expression parenthesizes itself, so application can
//! simply juxtapose its parts. Application and lambdas print curried.

use pretty::DocAllocator;
use printer::tokens::*;
use printer::util::ParensExt;
use printer::{Alloc, Builder, Print, PrintCfg};

use super::*;

impl Print for Expr {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        match self {
            Expr::Variable(name) => alloc.text(name),
            Expr::RawValue(text) => alloc.text(text),
            Expr::RawExpr(text) => alloc.text(text).parens(),
            Expr::MLString(text) => alloc.text(escape(text)),
            Expr::Lambda { params, body } => {
                let mut doc = body.print(cfg, alloc);
                for param in params.iter().rev() {
                    doc = alloc
                        .text(FN)
                        .append(alloc.space())
                        .append(param.print(cfg, alloc))
                        .append(alloc.space())
                        .append(alloc.text(FAT_ARROW))
                        .append(alloc.space())
                        .append(doc);
                }
                doc.parens()
            }
            Expr::Call { fun, args } => {
                let sep = alloc.space();
                fun.print(cfg, alloc)
                    .append(alloc.space())
                    .append(alloc.intersperse(args.iter().map(|arg| arg.print(cfg, alloc)), sep))
                    .parens()
            }
            Expr::If { cond, then_branch, else_branch } => alloc
                .text(IF)
                .append(alloc.space())
                .append(cond.print(cfg, alloc))
                .append(alloc.space())
                .append(alloc.text(THEN))
                .append(alloc.space())
                .append(then_branch.print(cfg, alloc))
                .append(alloc.space())
                .append(alloc.text(ELSE))
                .append(alloc.space())
                .append(else_branch.print(cfg, alloc))
                .parens(),
            Expr::Let { bindings, body } => {
                let bindings_doc = alloc.intersperse(
                    bindings.iter().map(|binding| binding.print(cfg, alloc)),
                    alloc.hardline(),
                );
                alloc
                    .text(LET)
                    .append(alloc.hardline().append(bindings_doc).nest(cfg.indent))
                    .append(alloc.hardline())
                    .append(alloc.text(IN))
                    .append(alloc.hardline().append(body.print(cfg, alloc)).nest(cfg.indent))
                    .append(alloc.hardline())
                    .append(alloc.text(END))
            }
            Expr::Tuple(parts) => {
                let sep = alloc.text(COMMA).append(alloc.space());
                alloc
                    .intersperse(parts.iter().map(|part| part.print(cfg, alloc)), sep)
                    .parens()
            }
            Expr::Make { ctor, payload } => match payload {
                None => alloc.text(ctor),
                Some(payload) => alloc
                    .text(ctor)
                    .append(alloc.space())
                    .append(payload.print(cfg, alloc))
                    .parens(),
            },
            Expr::Match { scrutinee, clauses, default } => {
                let sep = alloc
                    .hardline()
                    .append(alloc.space())
                    .append(alloc.space())
                    .append(alloc.text(PIPE))
                    .append(alloc.space());
                let mut arms: Vec<Builder<'a>> = clauses
                    .iter()
                    .map(|clause| {
                        clause
                            .pattern
                            .print(cfg, alloc)
                            .append(alloc.space())
                            .append(alloc.text(FAT_ARROW))
                            .append(alloc.space())
                            .append(clause.body.print(cfg, alloc))
                    })
                    .collect();
                if let Some(default) = default {
                    arms.push(
                        alloc
                            .text(UNDERSCORE)
                            .append(alloc.space())
                            .append(alloc.text(FAT_ARROW))
                            .append(alloc.space())
                            .append(default.print(cfg, alloc)),
                    );
                }
                alloc
                    .text(CASE)
                    .append(alloc.space())
                    .append(scrutinee.print(cfg, alloc))
                    .append(alloc.space())
                    .append(alloc.text(OF))
                    .append(alloc.space())
                    .append(alloc.intersperse(arms, sep))
                    .parens()
            }
            Expr::Ref(init) => alloc
                .text(REF)
                .append(alloc.space())
                .append(init.print(cfg, alloc))
                .parens(),
            Expr::Deref(cell) => alloc
                .text(BANG)
                .append(alloc.space())
                .append(cell.print(cfg, alloc))
                .parens(),
            Expr::Assign { cell, value } => cell
                .print(cfg, alloc)
                .append(alloc.space())
                .append(alloc.text(ASSIGN))
                .append(alloc.space())
                .append(value.print(cfg, alloc))
                .parens(),
        }
    }
}

impl Print for Param {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        match self {
            Param::Named(name) => alloc.text(name),
            Param::Patterned(pattern) => {
                let atomic = matches!(pattern, Pattern::Var(_) | Pattern::Wildcard);
                pattern.print(cfg, alloc).parens_if(!atomic)
            }
        }
    }
}

impl Print for Pattern {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        match self {
            Pattern::Var(name) => alloc.text(name),
            Pattern::Wildcard => alloc.text(UNDERSCORE),
            Pattern::Ctor { name, args } => match args.len() {
                0 => alloc.text(name),
                1 => {
                    let arg = &args[0];
                    let atomic = matches!(arg, Pattern::Var(_) | Pattern::Wildcard);
                    alloc
                        .text(name)
                        .append(alloc.space())
                        .append(arg.print(cfg, alloc).parens_if(!atomic))
                }
                _ => {
                    let sep = alloc.text(COMMA).append(alloc.space());
                    alloc.text(name).append(alloc.space()).append(
                        alloc
                            .intersperse(args.iter().map(|arg| arg.print(cfg, alloc)), sep)
                            .parens(),
                    )
                }
            },
            Pattern::Tuple(parts) => {
                let sep = alloc.text(COMMA).append(alloc.space());
                alloc
                    .intersperse(parts.iter().map(|part| part.print(cfg, alloc)), sep)
                    .parens()
            }
        }
    }
}

impl Print for Binding {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        match self {
            Binding::ValBind { name, expr } => alloc
                .text(VAL)
                .append(alloc.space())
                .append(alloc.text(name))
                .append(alloc.space())
                .append(alloc.text(EQUALS))
                .append(alloc.space())
                .append(expr.print(cfg, alloc)),
            Binding::AnonBind { expr } => alloc
                .text(VAL)
                .append(alloc.space())
                .append(alloc.text(UNDERSCORE))
                .append(alloc.space())
                .append(alloc.text(EQUALS))
                .append(alloc.space())
                .append(expr.print(cfg, alloc)),
            Binding::FunBind { name, params, body } => {
                let sep = alloc.space();
                alloc
                    .text(FUN)
                    .append(alloc.space())
                    .append(alloc.text(name))
                    .append(alloc.space())
                    .append(
                        alloc.intersperse(params.iter().map(|param| param.print(cfg, alloc)), sep),
                    )
                    .append(alloc.space())
                    .append(alloc.text(EQUALS))
                    .append(alloc.space())
                    .append(body.print(cfg, alloc))
            }
            Binding::DataBind { name, tvars, ctors } => {
                let tvars_doc = match tvars.len() {
                    0 => alloc.nil(),
                    1 => alloc.text(TICK).append(alloc.text(&tvars[0])).append(alloc.space()),
                    _ => {
                        let sep = alloc.text(COMMA).append(alloc.space());
                        alloc
                            .intersperse(
                                tvars.iter().map(|tv| alloc.text(TICK).append(alloc.text(tv))),
                                sep,
                            )
                            .parens()
                            .append(alloc.space())
                    }
                };
                let sep = alloc.space().append(alloc.text(PIPE)).append(alloc.space());
                let ctors_doc =
                    alloc.intersperse(
                        ctors.iter().map(|(ctor, payload)| match payload {
                            None => alloc.text(ctor),
                            Some(tpe) => alloc
                                .text(ctor)
                                .append(alloc.space())
                                .append(alloc.text(OF))
                                .append(alloc.space())
                                .append(tpe.print(cfg, alloc)),
                        }),
                        sep,
                    );
                alloc
                    .text(DATATYPE)
                    .append(alloc.space())
                    .append(tvars_doc)
                    .append(alloc.text(name))
                    .append(alloc.space())
                    .append(alloc.text(EQUALS))
                    .append(alloc.space())
                    .append(ctors_doc)
            }
            Binding::RawBind { text } => alloc.text(text),
        }
    }
}

impl Print for Type {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        match self {
            Type::Var(name) => alloc.text(TICK).append(alloc.text(name)),
            Type::Tuple(parts) => {
                let sep = alloc.space().append(alloc.text("*")).append(alloc.space());
                alloc.intersperse(
                    parts.iter().map(|part| {
                        let atomic = !matches!(part, Type::Fun(..) | Type::Tuple(_));
                        part.print(cfg, alloc).parens_if(!atomic)
                    }),
                    sep,
                )
            }
            Type::Fun(from, to) => {
                let atomic = !matches!(**from, Type::Fun(..));
                from.print(cfg, alloc)
                    .parens_if(!atomic)
                    .append(alloc.space())
                    .append(alloc.text(ARROW))
                    .append(alloc.space())
                    .append(to.print(cfg, alloc))
            }
            Type::Data { name, args } => match args.len() {
                0 => alloc.text(name),
                1 => {
                    let arg = &args[0];
                    let atomic = !matches!(arg, Type::Fun(..) | Type::Tuple(_));
                    arg.print(cfg, alloc)
                        .parens_if(!atomic)
                        .append(alloc.space())
                        .append(alloc.text(name))
                }
                _ => {
                    let sep = alloc.text(COMMA).append(alloc.space());
                    alloc
                        .intersperse(args.iter().map(|arg| arg.print(cfg, alloc)), sep)
                        .parens()
                        .append(alloc.space())
                        .append(alloc.text(name))
                }
            },
            Type::Integer => alloc.text("int"),
            Type::Bool => alloc.text("bool"),
            Type::Unit => alloc.text("unit"),
            Type::Real => alloc.text("real"),
            Type::Str => alloc.text("string"),
        }
    }
}

impl Print for Toplevel {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        let sep = alloc.hardline();
        let mut docs: Vec<Builder<'a>> =
            self.bindings.iter().map(|binding| binding.print(cfg, alloc)).collect();
        if let Some(main_call) = &self.main_call {
            docs.push(
                alloc
                    .text(VAL)
                    .append(alloc.space())
                    .append(alloc.text(UNDERSCORE))
                    .append(alloc.space())
                    .append(alloc.text(EQUALS))
                    .append(alloc.space())
                    .append(main_call.print(cfg, alloc)),
            );
        }
        alloc.intersperse(docs, sep).append(alloc.hardline())
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datatype_rendering() {
        // datatype 'a List = Nil | Cons of 'a * 'a List
        let list = Binding::DataBind {
            name: "List".to_owned(),
            tvars: vec!["a".to_owned()],
            ctors: vec![
                ("Nil".to_owned(), None),
                (
                    "Cons".to_owned(),
                    Some(Type::Tuple(vec![
                        Type::Var("a".to_owned()),
                        Type::Data { name: "List".to_owned(), args: vec![Type::Var("a".to_owned())] },
                    ])),
                ),
            ],
        };
        assert_eq!(list.print_trace(), "datatype 'a List = Nil | Cons of 'a * 'a List");
    }

    #[test]
    fn test_accessor_rendering() {
        let accessor = Binding::FunBind {
            name: "member1of1".to_owned(),
            params: vec![Param::Patterned(Pattern::Ctor {
                name: "Object1".to_owned(),
                args: vec![Pattern::Var("arg".to_owned())],
            })],
            body: Expr::var("arg"),
        };
        assert_eq!(accessor.print_trace(), "fun member1of1 (Object1 arg) = arg");
    }

    #[test]
    fn test_curried_application() {
        let expr = Expr::call(Expr::var("f"), vec![Expr::RawValue("1".to_owned()), Expr::var("k")]);
        assert_eq!(expr.print_trace(), "(f 1 k)");
    }

    #[test]
    fn test_lambda_is_curried() {
        let expr = Expr::lambda(
            vec![Param::Named("a".to_owned()), Param::Named("k".to_owned())],
            Expr::call(Expr::var("k"), vec![Expr::var("a")]),
        );
        assert_eq!(expr.print_trace(), "(fn a => fn k => (k a))");
    }

    #[test]
    fn test_negative_numeral() {
        let expr = Expr::RawValue("~5".to_owned());
        assert_eq!(expr.print_trace(), "~5");
    }
}
