//! Structural copy of JSON values.
//!
//! The single choke point for copy semantics in the engine: every value a
//! step writes into a document goes through [`copy`], so a patch never
//! aliases structure with the step sequence or the loader's cache.

mod copy;

pub use copy::copy;
