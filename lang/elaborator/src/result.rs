use miette::{Diagnostic, SourceSpan};
use miette_util::ToMiette;
use thiserror::Error;

use miette_util::Span;

use ast::*;
use printer::Print;

use crate::unifier::UnifyError;

pub type TcResult<T = ()> = Result<T, Box<TypeError>>;

fn comma_separated<I: IntoIterator<Item = String>>(iter: I) -> String {
    let vec: Vec<_> = iter.into_iter().collect();
    vec.join(", ")
}

#[derive(Error, Diagnostic, Debug, Clone)]
pub enum TypeError {
    #[error("Unbound symbol {name}")]
    #[diagnostic(code("T-001"))]
    ResolutionError {
        name: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("{cause}")]
    #[diagnostic(code("T-002"))]
    UnificationFailure {
        cause: UnifyError,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Wrong number of arguments to {name} provided: got {actual}, expected {expected}")]
    #[diagnostic(code("T-003"))]
    Arity {
        name: String,
        expected: usize,
        actual: usize,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Blocks cannot be used as expressions; box {name} first")]
    #[diagnostic(code("T-004"))]
    NotFirstClass {
        name: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Cannot assign to {name}, which is not a `var` binder")]
    #[diagnostic(code("T-005"))]
    AssignToImmutable {
        name: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Expected a boxed function type, got {got}")]
    #[diagnostic(code("T-006"))]
    ExpectedBoxed {
        got: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Expected a function block, got interface {got}")]
    #[diagnostic(code("T-007"))]
    ExpectedFunctionBlock {
        got: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("{name} has no function type yet; mutually recursive definitions need a type annotation")]
    #[diagnostic(code("T-008"))]
    NoFunctionType {
        name: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Handler for {iface} does not implement: {missing}")]
    #[diagnostic(code("T-009"))]
    MissingOperation {
        iface: String,
        missing: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Handler for {iface} implements {op} more than once")]
    #[diagnostic(code("T-010"))]
    DuplicateOperation {
        iface: String,
        op: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Ambiguous reference to {name}; candidates are:\n{candidates}")]
    #[diagnostic(code("T-011"))]
    Ambiguous {
        name: String,
        candidates: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("No overload of {name} applies:\n{details}")]
    #[diagnostic(code("T-012"))]
    NoMatchingOverload {
        name: String,
        details: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Unhandled control effects at the top level of {name}: {effects}")]
    #[diagnostic(code("T-013"))]
    UnhandledControlEffect {
        name: String,
        effects: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Existential type {var} escapes through the effects of this handler clause")]
    #[diagnostic(code("T-014"))]
    EscapingEffect {
        var: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Could not infer the effects of this expression")]
    #[diagnostic(code("T-015"))]
    CannotInferEffects {
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Cannot infer a type for {name}; annotate the parameter")]
    #[diagnostic(code("T-016"))]
    CannotInferParam {
        name: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Literal pattern does not fit the scrutinee type {expected}")]
    #[diagnostic(code("T-017"))]
    PatternTypeMismatch {
        expected: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("An unexpected internal error occurred: {message}")]
    #[diagnostic(code("T-XXX"))]
    /// This error should not occur.
    /// Some internal invariant has been violated.
    Impossible {
        message: String,
        #[label]
        span: Option<SourceSpan>,
    },
}

impl TypeError {
    /// Lift a unification failure into a diagnostic at the current focus.
    pub fn lifted(cause: UnifyError, span: Option<Span>) -> Box<TypeError> {
        Box::new(TypeError::UnificationFailure { cause, span: span.to_miette() })
    }

    pub fn resolution(symbol: &Symbol, span: Option<Span>) -> Box<TypeError> {
        Box::new(TypeError::ResolutionError {
            name: symbol.name.id.clone(),
            span: span.to_miette(),
        })
    }

    pub fn arity(name: &Symbol, expected: usize, actual: usize, span: Option<Span>) -> Box<TypeError> {
        Box::new(TypeError::Arity {
            name: name.name.id.clone(),
            expected,
            actual,
            span: span.to_miette(),
        })
    }

    pub fn missing_operations(
        iface: &Symbol,
        missing: &[&Symbol],
        span: Option<Span>,
    ) -> Box<TypeError> {
        Box::new(TypeError::MissingOperation {
            iface: iface.name.id.clone(),
            missing: comma_separated(missing.iter().map(|op| op.name.id.clone())),
            span: span.to_miette(),
        })
    }

    pub fn unhandled_effects(
        name: &Symbol,
        effects: &ConcreteEffects,
        span: Option<Span>,
    ) -> Box<TypeError> {
        Box::new(TypeError::UnhandledControlEffect {
            name: name.name.id.clone(),
            effects: effects.print_trace(),
            span: span.to_miette(),
        })
    }
}

/// Non-fatal findings. Buffered separately from errors; a compilation
/// with warnings still proceeds.
#[derive(Error, Diagnostic, Debug, Clone)]
pub enum TypeWarning {
    #[error("Handler for {iface} is unused: the body cannot perform this effect")]
    #[diagnostic(code("W-001"))]
    UnusedHandler {
        iface: String,
        #[label]
        span: Option<SourceSpan>,
    },
}

/// Convert a unifier result into a typer result at the given focus.
pub fn at_span<T>(res: Result<T, UnifyError>, span: Option<Span>) -> TcResult<T> {
    res.map_err(|cause| TypeError::lifted(cause, span))
}
