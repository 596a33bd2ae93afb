//! Structural similarity scoring between two JSON values.

use serde_json::{Map, Value};

use super::align::{align, AlignOp};
use super::DiffSettings;

/// Scores how different two values are: `Some(0.0)` identical through
/// `Some(1.0)` maximally different.
///
/// `None` marks the null/non-null boundary as incomparable, which forces the
/// differ to replace rather than descend. Values of different structural
/// kinds score 1.0 and are likewise never entered.
pub fn similarity(a: &Value, b: &Value, settings: &DiffSettings) -> Option<f64> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(0.0),
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Array(x), Value::Array(y)) => Some(array_similarity(x, y, settings)),
        (Value::Object(x), Value::Object(y)) => Some(object_similarity(x, y, settings)),
        (Value::Array(_), _) | (_, Value::Array(_)) => Some(1.0),
        (Value::Object(_), _) | (_, Value::Object(_)) => Some(1.0),
        _ => Some(if a == b { 0.0 } else { 1.0 }),
    }
}

/// Changed fraction over the aligned slots: a removal counts as a full
/// change, an insertion is free, a patched pair contributes its recursive
/// similarity.
fn array_similarity(a: &[Value], b: &[Value], settings: &DiffSettings) -> f64 {
    let ops = align(a, b, settings);
    let mut ai = 0;
    let mut bi = 0;
    let mut slots = 0usize;
    let mut changed = 0.0;
    for op in ops {
        match op {
            AlignOp::Popa => {
                slots += 1;
                changed += 1.0;
                ai += 1;
            }
            AlignOp::Insert => {
                bi += 1;
            }
            AlignOp::Patch => {
                slots += 1;
                changed += similarity(&a[ai], &b[bi], settings).unwrap_or(1.0);
                ai += 1;
                bi += 1;
            }
        }
    }
    if slots == 0 {
        0.0
    } else {
        changed / slots as f64
    }
}

/// Keyed cost sum over the union of both key sets, normalized by the union
/// size.
fn object_similarity(
    a: &Map<String, Value>,
    b: &Map<String, Value>,
    settings: &DiffSettings,
) -> f64 {
    let mut union = 0usize;
    let mut total = 0.0;
    for (key, a_val) in a {
        union += 1;
        match b.get(key) {
            Some(b_val) => {
                total += settings.diff_mul_same_key
                    * similarity(a_val, b_val, settings).unwrap_or(1.0);
            }
            None => total += settings.diff_add_new_key,
        }
    }
    for key in b.keys() {
        if !a.contains_key(key) {
            union += 1;
            total += settings.diff_add_del_key;
        }
    }
    if union == 0 {
        0.0
    } else {
        total / union as f64
    }
}
