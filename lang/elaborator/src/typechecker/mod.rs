pub mod blocks;
pub mod ctx;
pub mod decls;
pub mod exhaustiveness;
pub mod exprs;
pub mod overload;
pub mod patterns;
pub mod stmts;

pub use crate::result::TypeError;
pub use decls::{CheckedModule, check_module};
