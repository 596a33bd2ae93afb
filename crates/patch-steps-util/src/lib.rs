//! patch-steps-util - shared leaf utilities for the patch-steps engine.
//!
//! Provides the structural copy/merge primitives the step interpreter and
//! differ are built on, deep equality for callers comparing patched output,
//! and a seeded random JSON generator for the fuzz suites.

pub mod json_copy;
pub mod json_equal;
pub mod json_merge;
pub mod random_json;
pub mod value_kind;

// Re-exports for convenience
pub use json_copy::copy;
pub use json_equal::deep_equal;
pub use json_merge::{merge, MergeError};
pub use random_json::RandomJson;
pub use value_kind::kind_name;
