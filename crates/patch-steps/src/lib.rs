//! patch-steps — a JSON diff/patch engine built on replayable step sequences.
//!
//! Given two JSON documents, [`patch_diff::diff`] computes a compact sequence
//! of edit steps; [`patch::Patcher`] applies a step sequence to a document,
//! including loader-mediated IMPORT/INCLUDE references, FOR_IN loops, and
//! COPY/PASTE aliasing. Diff output is always directly patch-applicable.

pub mod patch;
pub mod patch_cli;
pub mod patch_diff;
