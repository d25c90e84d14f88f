use pretty::DocAllocator;
use pretty::termcolor::ColorSpec;

pub type Alloc<'a> = pretty::Arena<'a, ColorSpec>;
pub type Builder<'a> = pretty::DocBuilder<'a, Alloc<'a>, ColorSpec>;

/// Configuration of the prettyprinter.
#[derive(Debug, Clone)]
pub struct PrintCfg {
    /// The width of the output page.
    pub width: usize,
    /// How many spaces one indentation level is wide.
    pub indent: isize,
}

impl Default for PrintCfg {
    fn default() -> Self {
        Self { width: crate::DEFAULT_WIDTH, indent: 4 }
    }
}

pub trait Print {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a>;

    fn print_to_string(&self, cfg: Option<&PrintCfg>) -> String {
        let alloc = Alloc::new();
        let mut buf = Vec::new();
        {
            let default = PrintCfg::default();
            let cfg = cfg.unwrap_or(&default);
            let doc_builder = self.print(cfg, &alloc);
            doc_builder.1.render(cfg.width, &mut buf).expect("Failed to print to string");
        }
        String::from_utf8(buf).expect("Prettyprinter emitted invalid UTF-8")
    }

    /// Render on a single (wide) line. Used in trace logs and error messages
    /// where line breaks would garble the surrounding output.
    fn print_trace(&self) -> String {
        let cfg = PrintCfg { width: usize::MAX, ..Default::default() };
        self.print_to_string(Some(&cfg))
    }
}

impl<T: Print> Print for Box<T> {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        (**self).print(cfg, alloc)
    }
}

impl<T: Print> Print for Option<T> {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        match self {
            Some(inner) => inner.print(cfg, alloc),
            None => alloc.nil(),
        }
    }
}

impl<T: Print> Print for Vec<T> {
    fn print<'a>(&'a self, cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        let sep = alloc.text(crate::tokens::COMMA).append(alloc.space());
        alloc.intersperse(self.iter().map(|x| x.print(cfg, alloc)), sep)
    }
}

impl Print for String {
    fn print<'a>(&'a self, _cfg: &PrintCfg, alloc: &'a Alloc<'a>) -> Builder<'a> {
        alloc.text(self)
    }
}
