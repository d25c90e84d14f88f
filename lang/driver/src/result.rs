use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug, Clone)]
#[diagnostic(transparent)]
#[error(transparent)]
pub enum Error {
    Type(#[from] Box<elaborator::result::TypeError>),
    Backend(#[from] backend::BackendError),
    Driver(#[from] DriverError),
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum DriverError {
    #[error("IO error: {0}")]
    Io(#[from] Arc<std::io::Error>),
    #[error("Impossible: {0}")]
    Impossible(String),
}
