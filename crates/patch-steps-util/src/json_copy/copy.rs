use serde_json::Value;

/// Returns a deep, independent copy of a JSON value.
///
/// Containers are rebuilt recursively; scalars are copied by value. The
/// result shares no mutable structure with the input, so mutating either
/// side never affects the other.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use patch_steps_util::copy;
///
/// let original = json!({"items": [1, {"deep": true}]});
/// let mut copied = copy(&original);
/// copied["items"][0] = json!(99);
/// assert_eq!(original["items"][0], json!(1));
/// ```
pub fn copy(value: &Value) -> Value {
    match value {
        Value::Array(elements) => Value::Array(elements.iter().map(copy).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, val)| (key.clone(), copy(val)))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deep_equal;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn scalars_pass_through() {
        for v in [json!(null), json!(true), json!(42), json!("text")] {
            assert_eq!(copy(&v), v);
        }
    }

    #[test]
    fn copy_is_independent() {
        let original = json!({"a": {"b": [1, 2, 3]}});
        let mut copied = copy(&original);
        copied["a"]["b"][1] = json!("mutated");
        assert_eq!(original["a"]["b"][1], json!(2));
    }

    #[test]
    fn copy_of_copy_is_equal() {
        let v = json!({"nested": [{"x": 1}, null, "s"]});
        assert!(deep_equal(&copy(&copy(&v)), &copy(&v)));
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i32>().prop_map(Value::from),
            "[a-z]{0,6}".prop_map(Value::from),
        ];
        leaf.prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn copy_round_trips_arbitrary_values(v in arb_json()) {
            prop_assert!(deep_equal(&copy(&v), &v));
        }
    }
}
