pub mod cps;
pub mod lifted2ml;
pub mod ml;
pub mod names;
pub mod result;
pub mod runtime;

pub use lifted2ml::{run_main, transform};
pub use result::{BackendError, BackendResult};
