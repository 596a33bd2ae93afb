//! Structural merge of JSON containers.

mod merge;

pub use merge::{merge, MergeError};
