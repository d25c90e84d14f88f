use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum BackendError {
    #[error("Mutual recursion is not supported by the ML backend: {names}")]
    #[diagnostic(code("B-001"))]
    MutualRecursionUnsupported { names: String },
    #[error("Impossible: {0}")]
    #[diagnostic(code("B-XXX"))]
    Impossible(String),
}

pub type BackendResult<T = ()> = Result<T, BackendError>;
