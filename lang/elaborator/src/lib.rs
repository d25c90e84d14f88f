pub mod result;
pub mod typechecker;
pub mod unifier;

pub use result::{TcResult, TypeError, TypeWarning};
pub use typechecker::check_module;
pub use typechecker::ctx::{Ctx, DeclTable, DependencyTypes};
pub use unifier::Unifier;
