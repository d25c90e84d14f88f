//! Names of the runtime primitives referenced by emitted code.
//!
//! The runtime library itself is external; the transformer hard-codes
//! these names and must never inline their definitions.

pub const LIFT: &str = "lift";
pub const NESTED: &str = "nested";
pub const HERE: &str = "here";
pub const FRESH: &str = "fresh";
pub const WITH_REGION: &str = "withRegion";
pub const UNIT_VAL: &str = "unitVal";
pub const TRUE_VAL: &str = "trueVal";
pub const FALSE_VAL: &str = "falseVal";
