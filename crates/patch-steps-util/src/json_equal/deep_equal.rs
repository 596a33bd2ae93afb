use serde_json::Value;

/// Recursive equality over JSON values.
///
/// Arrays compare element by element in order; objects compare key by key
/// with order ignored; scalars compare by value.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use patch_steps_util::deep_equal;
///
/// assert!(deep_equal(&json!({"a": [1, 2]}), &json!({"a": [1, 2]})));
/// assert!(!deep_equal(&json!({"a": [1, 2]}), &json!({"a": [2, 1]})));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| deep_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, l)| y.get(key).is_some_and(|r| deep_equal(l, r)))
        }
        (x, y) => x == y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars() {
        assert!(deep_equal(&json!(null), &json!(null)));
        assert!(deep_equal(&json!("a"), &json!("a")));
        assert!(!deep_equal(&json!(1), &json!("1")));
    }

    #[test]
    fn object_key_order_is_ignored() {
        let a = json!({"x": 1, "y": 2});
        let b = json!({"y": 2, "x": 1});
        assert!(deep_equal(&a, &b));
    }

    #[test]
    fn array_order_matters() {
        assert!(!deep_equal(&json!([1, 2]), &json!([2, 1])));
    }

    #[test]
    fn missing_key_differs() {
        assert!(!deep_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn nested_structures() {
        let a = json!({"list": [{"k": [null, true]}]});
        let b = json!({"list": [{"k": [null, true]}]});
        assert!(deep_equal(&a, &b));
    }
}
