pub use pretty::DocAllocator;

pub mod tokens;
pub mod types;
pub mod util;

pub use types::*;

pub const DEFAULT_WIDTH: usize = 100;
