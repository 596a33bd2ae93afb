//! Instruction-count optimization over a linear step sequence.

use crate::patch::types::{Step, StepIndex};

/// Collapses adjacent EXIT/EXIT into one counted EXIT and adjacent
/// ENTER/ENTER into one ENTER whose index is the concatenated chain.
///
/// Purely a size optimization: a counted EXIT pops one level per count and a
/// chained ENTER descends one level per key, so apply-time semantics are
/// unchanged.
pub fn optimize(steps: Vec<Step>) -> Vec<Step> {
    let mut out: Vec<Step> = Vec::with_capacity(steps.len());
    for step in steps {
        match (out.last_mut(), step) {
            (Some(Step::Exit { count, .. }), Step::Exit { count: next, .. }) => {
                *count = Some(count.unwrap_or(1) + next.unwrap_or(1));
            }
            (Some(Step::Enter { index, .. }), Step::Enter { index: next, .. }) => {
                let mut chain = std::mem::replace(index, StepIndex::Chain(Vec::new())).into_vec();
                chain.extend(next.into_vec());
                *index = StepIndex::Chain(chain);
            }
            (_, step) => out.push(step),
        }
    }
    out
}
