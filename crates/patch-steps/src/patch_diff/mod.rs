//! Patch Steps generation: computes a step sequence that transforms one JSON
//! document into another.
//!
//! The output of [`diff`] is directly applicable by the interpreter; the two
//! sides share the wire format, which is the round-trip contract the test
//! suites verify.

mod align;
mod optimize;
mod similarity;

pub use align::{align, AlignOp};
pub use optimize::optimize;
pub use similarity::similarity;

use serde::Deserialize;
use serde_json::{Map, Value};

use patch_steps_util::copy;

use crate::patch::types::{PathStep, Step, StepIndex};

// ── Settings ──────────────────────────────────────────────────────────────

/// Tuning knobs for the differ and its similarity heuristic.
///
/// Deserializes from the wire settings object with per-field fallbacks, so a
/// partial settings document merges over the defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiffSettings {
    /// Similarity score above which an array-aligned pair is treated as
    /// unrelated rather than patched.
    pub array_truly_different_threshold: f64,
    /// Same cut for object fields.
    pub truly_different_threshold: f64,
    /// Max candidate window scanned when aligning array elements.
    pub array_lookahead: usize,
    /// Cost of a key present only in the old document.
    pub diff_add_new_key: f64,
    /// Cost of a key present only in the new document.
    pub diff_add_del_key: f64,
    /// Weight applied to the recursive difference of same-named keys.
    pub diff_mul_same_key: f64,
    /// Path-prefix string; when set, every emitted step carries a `comment`
    /// with the dotted path it targets.
    pub comment: Option<String>,
    /// Collapse adjacent EXIT/EXIT and ENTER/ENTER pairs after diffing.
    pub optimize: bool,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            array_truly_different_threshold: 0.5,
            truly_different_threshold: 0.5,
            array_lookahead: 8,
            diff_add_new_key: 0.0,
            diff_add_del_key: 1.0,
            diff_mul_same_key: 0.75,
            comment: None,
            optimize: true,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────

/// Computes the step sequence transforming `a` into `b`.
///
/// Returns `None` when the two roots are unpatchable as a pair (different
/// structural kinds, or exactly one is null) - callers replace the document
/// wholesale in that case. `Some(vec![])` means the documents are already
/// equal.
pub fn diff(a: &Value, b: &Value, settings: &DiffSettings) -> Option<Vec<Step>> {
    let mut path = Vec::new();
    let steps = diff_values(a, b, settings, &mut path)?;
    Some(if settings.optimize {
        optimize(steps)
    } else {
        steps
    })
}

// ── Recursive core ────────────────────────────────────────────────────────

fn annotate(settings: &DiffSettings, path: &[String]) -> Option<String> {
    settings.comment.as_ref().map(|prefix| {
        if path.is_empty() {
            prefix.clone()
        } else {
            format!("{prefix}.{}", path.join("."))
        }
    })
}

/// `None` is the unpatchable sentinel: the pair must be replaced wholesale
/// by the caller, never entered.
fn diff_values(
    a: &Value,
    b: &Value,
    settings: &DiffSettings,
    path: &mut Vec<String>,
) -> Option<Vec<Step>> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Vec::new()),
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Array(x), Value::Array(y)) => Some(diff_arrays(x, y, settings, path)),
        (Value::Object(x), Value::Object(y)) => Some(diff_objects(x, y, settings, path)),
        (Value::Array(_), _) | (_, Value::Array(_)) => None,
        (Value::Object(_), _) | (_, Value::Object(_)) => None,
        _ => {
            if a == b {
                Some(Vec::new())
            } else {
                None
            }
        }
    }
}

fn diff_arrays(
    a: &[Value],
    b: &[Value],
    settings: &DiffSettings,
    path: &mut Vec<String>,
) -> Vec<Step> {
    let ops = align(a, b, settings);
    let mut steps = Vec::new();
    let mut ai = 0;
    let mut bi = 0;
    let mut oi = 0;
    for (pos, op) in ops.iter().enumerate() {
        match op {
            AlignOp::Popa => {
                path.push(oi.to_string());
                steps.push(Step::RemoveArrayElement {
                    index: oi,
                    comment: annotate(settings, path),
                });
                path.pop();
                ai += 1;
            }
            AlignOp::Insert => {
                // A run of inserts/removals reaching the end of the program
                // appends: the leftover elements it still removes all sit
                // before the appended tail.
                let trailing = ops[pos..]
                    .iter()
                    .all(|o| matches!(o, AlignOp::Insert | AlignOp::Popa));
                path.push(oi.to_string());
                steps.push(Step::AddArrayElement {
                    index: (!trailing).then_some(oi),
                    content: copy(&b[bi]),
                    comment: annotate(settings, path),
                });
                path.pop();
                bi += 1;
                oi += 1;
            }
            AlignOp::Patch => {
                path.push(oi.to_string());
                match diff_values(&a[ai], &b[bi], settings, path) {
                    None => steps.push(Step::SetKey {
                        index: PathStep::Index(oi),
                        content: Some(copy(&b[bi])),
                        comment: annotate(settings, path),
                    }),
                    Some(inner) if inner.is_empty() => {}
                    Some(inner) => {
                        let comment = annotate(settings, path);
                        steps.push(Step::Enter {
                            index: StepIndex::One(PathStep::Index(oi)),
                            comment: comment.clone(),
                        });
                        steps.extend(inner);
                        steps.push(Step::Exit {
                            count: None,
                            comment,
                        });
                    }
                }
                path.pop();
                ai += 1;
                bi += 1;
                oi += 1;
            }
        }
    }
    steps
}

fn diff_objects(
    a: &Map<String, Value>,
    b: &Map<String, Value>,
    settings: &DiffSettings,
    path: &mut Vec<String>,
) -> Vec<Step> {
    let mut steps = Vec::new();
    for (key, a_val) in a {
        path.push(key.clone());
        match b.get(key) {
            Some(b_val) => {
                let score = similarity(a_val, b_val, settings);
                if score.is_some_and(|s| s >= settings.truly_different_threshold) {
                    steps.push(Step::SetKey {
                        index: PathStep::Key(key.clone()),
                        content: Some(copy(b_val)),
                        comment: annotate(settings, path),
                    });
                } else {
                    match diff_values(a_val, b_val, settings, path) {
                        None => steps.push(Step::SetKey {
                            index: PathStep::Key(key.clone()),
                            content: Some(copy(b_val)),
                            comment: annotate(settings, path),
                        }),
                        Some(inner) if inner.is_empty() => {}
                        Some(inner) => {
                            let comment = annotate(settings, path);
                            steps.push(Step::Enter {
                                index: StepIndex::One(PathStep::Key(key.clone())),
                                comment: comment.clone(),
                            });
                            steps.extend(inner);
                            steps.push(Step::Exit {
                                count: None,
                                comment,
                            });
                        }
                    }
                }
            }
            None => steps.push(Step::SetKey {
                index: PathStep::Key(key.clone()),
                content: None,
                comment: annotate(settings, path),
            }),
        }
        path.pop();
    }
    for (key, b_val) in b {
        if !a.contains_key(key) {
            path.push(key.clone());
            steps.push(Step::SetKey {
                index: PathStep::Key(key.clone()),
                content: Some(copy(b_val)),
                comment: annotate(settings, path),
            });
            path.pop();
        }
    }
    steps
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{codec, DebugState, DenyLoader, PatchDocument, Patcher};
    use patch_steps_util::deep_equal;
    use serde_json::json;

    fn apply(root: &mut Value, steps: Vec<Step>) {
        let mut debug = DebugState::new();
        Patcher::new(&DenyLoader)
            .patch_traced(root, &PatchDocument::Steps(steps), "<diff>", &mut debug)
            .expect("applying diff output failed");
    }

    fn roundtrip(a: Value, b: Value) {
        let steps = diff(&a, &b, &DiffSettings::default()).expect("roots should be patchable");
        let mut doc = a;
        apply(&mut doc, steps);
        assert!(deep_equal(&doc, &b), "got {doc}, want {b}");
    }

    #[test]
    fn no_op_diff_is_empty() {
        let doc = json!({"a": [1, {"b": "c"}], "d": null});
        let steps = diff(&doc, &doc, &DiffSettings::default()).unwrap();
        assert!(steps.is_empty());
    }

    #[test]
    fn both_null_is_empty() {
        assert_eq!(diff(&json!(null), &json!(null), &DiffSettings::default()), Some(vec![]));
    }

    #[test]
    fn kind_mismatch_is_unpatchable() {
        let settings = DiffSettings::default();
        assert_eq!(diff(&json!({"a": 1}), &json!([1]), &settings), None);
        assert_eq!(diff(&json!(null), &json!(1), &settings), None);
        assert_eq!(diff(&json!(1), &json!("1"), &settings), None);
    }

    #[test]
    fn scalar_replace() {
        let steps = diff(&json!({"x": 1}), &json!({"x": 2}), &DiffSettings::default()).unwrap();
        assert_eq!(
            steps,
            vec![Step::SetKey {
                index: PathStep::Key("x".into()),
                content: Some(json!(2)),
                comment: None,
            }]
        );
        roundtrip(json!({"x": 1}), json!({"x": 2}));
    }

    #[test]
    fn array_append_has_no_index() {
        let steps = diff(&json!([1, 2]), &json!([1, 2, 3]), &DiffSettings::default()).unwrap();
        assert_eq!(
            steps,
            vec![Step::AddArrayElement {
                index: None,
                content: json!(3),
                comment: None,
            }]
        );
        roundtrip(json!([1, 2]), json!([1, 2, 3]));
    }

    #[test]
    fn key_deletion_is_a_content_less_set_key() {
        let steps = diff(&json!({"a": 1, "b": 2}), &json!({"a": 1}), &DiffSettings::default())
            .unwrap();
        assert_eq!(
            steps,
            vec![Step::SetKey {
                index: PathStep::Key("b".into()),
                content: None,
                comment: None,
            }]
        );
        roundtrip(json!({"a": 1, "b": 2}), json!({"a": 1}));
    }

    #[test]
    fn similar_nested_objects_are_entered() {
        // Three of four fields unchanged keeps the pair well under the
        // truly-different threshold, so the differ descends.
        let a = json!({"unit": {"x": 1, "y": 2, "z": 3, "w": 4}});
        let b = json!({"unit": {"x": 9, "y": 2, "z": 3, "w": 4}});
        let steps = diff(&a, &b, &DiffSettings::default()).unwrap();
        assert_eq!(
            steps,
            vec![
                Step::Enter {
                    index: StepIndex::One(PathStep::Key("unit".into())),
                    comment: None,
                },
                Step::SetKey {
                    index: PathStep::Key("x".into()),
                    content: Some(json!(9)),
                    comment: None,
                },
                Step::Exit {
                    count: None,
                    comment: None,
                },
            ]
        );
        roundtrip(a, b);
    }

    #[test]
    fn dissimilar_values_replace_wholesale() {
        // A fully different child is replaced in one SET_KEY, not entered.
        let a = json!({"unit": {"x": 1, "y": 2}});
        let b = json!({"unit": {"x": 9, "y": 8}});
        let steps = diff(&a, &b, &DiffSettings::default()).unwrap();
        assert_eq!(steps.len(), 1);
        assert!(matches!(&steps[0], Step::SetKey { content: Some(_), .. }));
        roundtrip(a, b);
    }

    #[test]
    fn structural_kind_change_of_a_field_replaces() {
        let a = json!({"v": {"k": 1}});
        let b = json!({"v": [1]});
        let steps = diff(&a, &b, &DiffSettings::default()).unwrap();
        assert_eq!(steps.len(), 1);
        assert!(matches!(&steps[0], Step::SetKey { content: Some(_), .. }));
        roundtrip(a, b);
    }

    #[test]
    fn array_element_removal() {
        roundtrip(json!([1, 2, 3]), json!([1, 3]));
        roundtrip(json!(["a", "b", "c"]), json!([]));
    }

    #[test]
    fn middle_insertion_forces_a_pairing() {
        // The greedy alignment never inserts while old elements remain: the
        // unmatched element is force-paired and the tail re-appended.
        let a = json!(["alpha", "beta"]);
        let b = json!(["alpha", "inserted", "beta"]);
        let steps = diff(&a, &b, &DiffSettings::default()).unwrap();
        assert_eq!(
            steps,
            vec![
                Step::SetKey {
                    index: PathStep::Index(1),
                    content: Some(json!("inserted")),
                    comment: None,
                },
                Step::AddArrayElement {
                    index: None,
                    content: json!("beta"),
                    comment: None,
                },
            ]
        );
        roundtrip(a, b);
    }

    #[test]
    fn mixed_array_edits_round_trip() {
        roundtrip(
            json!([{"id": 1, "hp": 10}, {"id": 2, "hp": 20}, {"id": 3, "hp": 30}]),
            json!([{"id": 1, "hp": 10}, {"id": 2, "hp": 25}, {"id": 4, "hp": 40}]),
        );
        roundtrip(json!([[1, 2], [3, 4]]), json!([[1, 2, 5], [3]]));
    }

    #[test]
    fn deep_nesting_round_trips() {
        roundtrip(
            json!({"a": {"b": {"c": {"d": 1, "e": 2, "f": 3, "g": 4}}}}),
            json!({"a": {"b": {"c": {"d": 9, "e": 2, "f": 3, "g": 4}}}}),
        );
    }

    #[test]
    fn comments_carry_the_dotted_path() {
        let settings = DiffSettings {
            comment: Some("chars".into()),
            ..DiffSettings::default()
        };
        let steps = diff(&json!({"x": 1}), &json!({"x": 2}), &settings).unwrap();
        assert_eq!(
            steps,
            vec![Step::SetKey {
                index: PathStep::Key("x".into()),
                content: Some(json!(2)),
                comment: Some("chars.x".into()),
            }]
        );
    }

    #[test]
    fn optimization_can_be_disabled() {
        let a = json!({"a": {"b": {"c": 1, "d": 2, "e": 3, "f": 4}}});
        let b = json!({"a": {"b": {"c": 9, "d": 2, "e": 3, "f": 4}}});
        let plain = diff(
            &a,
            &b,
            &DiffSettings {
                optimize: false,
                ..DiffSettings::default()
            },
        )
        .unwrap();
        let optimized = diff(&a, &b, &DiffSettings::default()).unwrap();
        assert!(optimized.len() < plain.len());

        let mut doc = a;
        apply(&mut doc, optimized);
        assert!(deep_equal(&doc, &b));
    }

    #[test]
    fn diff_output_survives_the_wire_format() {
        let a = json!({"list": [1, 2], "meta": {"k1": "v", "k2": "w", "k3": "x", "k4": "y"}});
        let b = json!({"list": [1, 2, 3], "meta": {"k1": "v2", "k2": "w", "k3": "x", "k4": "y"}});
        let steps = diff(&a, &b, &DiffSettings::default()).unwrap();
        let decoded = codec::json::from_json_steps(&codec::json::to_json_steps(&steps)).unwrap();
        assert_eq!(steps, decoded);
        let mut doc = a;
        apply(&mut doc, decoded);
        assert!(deep_equal(&doc, &b));
    }

    #[test]
    fn partial_settings_deserialize_over_defaults() {
        let settings: DiffSettings = serde_json::from_value(json!({
            "arrayLookahead": 3,
            "comment": "root",
        }))
        .unwrap();
        assert_eq!(settings.array_lookahead, 3);
        assert_eq!(settings.comment.as_deref(), Some("root"));
        assert_eq!(settings.truly_different_threshold, 0.5);
        assert!(settings.optimize);
    }
}
