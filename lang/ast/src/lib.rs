pub mod captures;
pub mod effects;
pub mod ident;
pub mod lifted;
pub mod source;
pub mod subst;
pub mod symbols;
pub mod traits;
pub mod types;

pub use captures::*;
pub use effects::*;
pub use ident::*;
pub use subst::*;
pub use symbols::*;
pub use traits::*;
pub use types::*;

/// Hash map used throughout the compiler. Keys are small (symbol ids,
/// unification variable ids), so the fx hash wins over SipHash.
pub type HashMap<K, V> = fxhash::FxHashMap<K, V>;
pub type HashSet<V> = fxhash::FxHashSet<V>;
