//! Greedy array alignment.
//!
//! Pairs the elements of a new sequence against an old one with a bounded
//! lookahead window. The output is a stack-machine program over the old
//! array: it always consumes all of the old elements and produces all of the
//! new ones, but it is a heuristic, not an optimal edit script - an
//! unmatched element is force-paired rather than treated as an insertion
//! while old elements remain. That exact greedy behavior is part of the
//! wire-compatibility contract and must not be replaced by an edit-distance
//! algorithm.

use serde_json::Value;

use super::similarity::similarity;
use super::DiffSettings;

/// One alignment decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignOp {
    /// Drop the next unconsumed old element.
    Popa,
    /// Produce the next new element out of nothing.
    Insert,
    /// Pair the next unconsumed old element with the next new element.
    Patch,
}

/// Aligns `b` against `a` left to right.
///
/// For each new element, the lowest-scoring old element within
/// `array_lookahead` of the cursor wins; a best score above
/// `array_truly_different_threshold` counts as no match.
pub fn align(a: &[Value], b: &[Value], settings: &DiffSettings) -> Vec<AlignOp> {
    let mut ops = Vec::new();
    let mut ai = 0;
    for b_val in b {
        let window_end = a.len().min(ai + settings.array_lookahead);
        let mut best: Option<(f64, usize)> = None;
        for j in ai..window_end {
            let score = similarity(&a[j], b_val, settings).unwrap_or(1.0);
            if best.is_none_or(|(best_score, _)| score < best_score) {
                best = Some((score, j));
            }
        }
        match best {
            Some((score, j)) if score <= settings.array_truly_different_threshold => {
                for _ in ai..j {
                    ops.push(AlignOp::Popa);
                }
                ops.push(AlignOp::Patch);
                ai = j + 1;
            }
            Some(_) => {
                // Forced pairing with the next unconsumed element.
                ops.push(AlignOp::Patch);
                ai += 1;
            }
            None => ops.push(AlignOp::Insert),
        }
    }
    for _ in ai..a.len() {
        ops.push(AlignOp::Popa);
    }
    ops
}
