mod free_vars;
mod has_span;
mod zonk;

pub use free_vars::*;
pub use has_span::*;
pub use zonk::*;
