use serde_json::Value;

/// Returns the JSON kind of a value as a short lowercase name.
///
/// Used in error messages throughout the engine.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use patch_steps_util::value_kind::kind_name;
///
/// assert_eq!(kind_name(&json!(null)), "null");
/// assert_eq!(kind_name(&json!([1, 2])), "array");
/// assert_eq!(kind_name(&json!({"a": 1})), "object");
/// ```
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
