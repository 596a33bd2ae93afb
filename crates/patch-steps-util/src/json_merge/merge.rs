use serde_json::Value;
use thiserror::Error;

use crate::json_copy::copy;
use crate::value_kind::kind_name;

/// Error raised when [`merge`] is asked to combine incompatible kinds.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("TypeMismatch: cannot merge {src} into {dst}")]
    TypeMismatch {
        dst: &'static str,
        src: &'static str,
    },
}

/// Merges `src` into `dst` in place.
///
/// An object source deep-copies each of its fields into the destination
/// object, overwriting keys of the same name. An array source deep-copies
/// and appends each element to the destination array. Any other pairing of
/// kinds is a [`MergeError::TypeMismatch`]; merging a scalar is never
/// supported.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use patch_steps_util::merge;
///
/// let mut dst = json!({"a": 1, "b": 2});
/// merge(&mut dst, &json!({"b": 3, "c": 4})).unwrap();
/// assert_eq!(dst, json!({"a": 1, "b": 3, "c": 4}));
/// ```
pub fn merge(dst: &mut Value, src: &Value) -> Result<(), MergeError> {
    match (dst, src) {
        (Value::Object(dst_fields), Value::Object(src_fields)) => {
            for (key, val) in src_fields {
                dst_fields.insert(key.clone(), copy(val));
            }
            Ok(())
        }
        (Value::Array(dst_elements), Value::Array(src_elements)) => {
            dst_elements.extend(src_elements.iter().map(copy));
            Ok(())
        }
        (dst, src) => Err(MergeError::TypeMismatch {
            dst: kind_name(dst),
            src: kind_name(src),
        }),
    }
}
