//! JSON codec for patch steps.
//!
//! The persisted form of a step sequence is an array of objects, each
//! `{"type": <NAME>, ...type-specific fields}`. A document that is a plain
//! mapping instead of an array decodes to the legacy recursive-merge form.
//! Unknown type names decode to [`Step::Custom`] so host-registered steps
//! survive a decode/encode round trip.

use serde_json::{json, Map, Value};

use crate::patch::types::{Keyword, PatchDocument, PatchError, PathStep, Step, StepIndex};

// ── Decode helpers ────────────────────────────────────────────────────────

fn require<'a>(obj: &'a Map<String, Value>, key: &str, step: &str) -> Result<&'a Value, PatchError> {
    obj.get(key)
        .ok_or_else(|| PatchError::Value(format!("{step} requires `{key}`")))
}

fn decode_path_step(v: &Value, step: &str) -> Result<PathStep, PatchError> {
    PathStep::from_value(v).ok_or_else(|| {
        PatchError::Value(format!(
            "{step} index must be a string or a non-negative integer"
        ))
    })
}

fn decode_step_index(v: &Value, step: &str) -> Result<StepIndex, PatchError> {
    match v {
        Value::Array(parts) => {
            let steps = parts
                .iter()
                .map(|p| decode_path_step(p, step))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(StepIndex::Chain(steps))
        }
        other => Ok(StepIndex::One(decode_path_step(other, step)?)),
    }
}

fn decode_usize(v: &Value, step: &str, key: &str) -> Result<usize, PatchError> {
    v.as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| PatchError::Value(format!("{step} `{key}` must be a non-negative integer")))
}

// ── Decoding ──────────────────────────────────────────────────────────────

/// Decodes one step object.
pub fn from_json(v: &Value) -> Result<Step, PatchError> {
    let obj = v
        .as_object()
        .ok_or_else(|| PatchError::Value("a step must be an object".into()))?;
    let step_type = obj
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| PatchError::Value("a step requires a string `type`".into()))?;
    let comment = obj
        .get("comment")
        .and_then(|c| c.as_str())
        .map(|c| c.to_string());

    match step_type {
        "ENTER" => Ok(Step::Enter {
            index: decode_step_index(require(obj, "index", "ENTER")?, "ENTER")?,
            comment,
        }),
        "EXIT" => {
            let count = obj
                .get("count")
                .map(|c| decode_usize(c, "EXIT", "count"))
                .transpose()?;
            Ok(Step::Exit { count, comment })
        }
        "SET_KEY" => Ok(Step::SetKey {
            index: decode_path_step(require(obj, "index", "SET_KEY")?, "SET_KEY")?,
            content: obj.get("content").cloned(),
            comment,
        }),
        "REMOVE_ARRAY_ELEMENT" => Ok(Step::RemoveArrayElement {
            index: decode_usize(
                require(obj, "index", "REMOVE_ARRAY_ELEMENT")?,
                "REMOVE_ARRAY_ELEMENT",
                "index",
            )?,
            comment,
        }),
        "ADD_ARRAY_ELEMENT" => Ok(Step::AddArrayElement {
            index: obj
                .get("index")
                .map(|i| decode_usize(i, "ADD_ARRAY_ELEMENT", "index"))
                .transpose()?,
            content: require(obj, "content", "ADD_ARRAY_ELEMENT")?.clone(),
            comment,
        }),
        "FOR_IN" => {
            let values = require(obj, "values", "FOR_IN")?
                .as_array()
                .ok_or_else(|| PatchError::Value("FOR_IN `values` must be an array".into()))?
                .clone();
            let keyword = match require(obj, "keyword", "FOR_IN")? {
                Value::String(kw) => Keyword::Literal(kw.clone()),
                Value::Object(patterns) => {
                    let mut decoded = indexmap::IndexMap::new();
                    for (name, pattern) in patterns {
                        let pattern = pattern.as_str().ok_or_else(|| {
                            PatchError::Value(format!(
                                "FOR_IN keyword pattern `{name}` must be a string"
                            ))
                        })?;
                        decoded.insert(name.clone(), pattern.to_string());
                    }
                    Keyword::Patterns(decoded)
                }
                _ => {
                    return Err(PatchError::Value(
                        "FOR_IN `keyword` must be a string or a mapping of patterns".into(),
                    ))
                }
            };
            let body = require(obj, "body", "FOR_IN")?
                .as_array()
                .ok_or_else(|| PatchError::Value("FOR_IN `body` must be an array".into()))?
                .clone();
            Ok(Step::ForIn {
                values,
                keyword,
                body,
            })
        }
        "COPY" => Ok(Step::Copy {
            alias: require(obj, "alias", "COPY")?
                .as_str()
                .ok_or_else(|| PatchError::Value("COPY `alias` must be a string".into()))?
                .to_string(),
        }),
        "PASTE" => Ok(Step::Paste {
            alias: require(obj, "alias", "PASTE")?
                .as_str()
                .ok_or_else(|| PatchError::Value("PASTE `alias` must be a string".into()))?
                .to_string(),
            index: obj
                .get("index")
                .map(|i| decode_path_step(i, "PASTE"))
                .transpose()?,
        }),
        "IMPORT" => {
            let src = require(obj, "src", "IMPORT")?
                .as_str()
                .ok_or_else(|| PatchError::Value("IMPORT `src` must be a string".into()))?
                .to_string();
            let path = obj
                .get("path")
                .map(|p| {
                    p.as_array()
                        .ok_or_else(|| {
                            PatchError::Value("IMPORT `path` must be an array of keys".into())
                        })?
                        .iter()
                        .map(|k| decode_path_step(k, "IMPORT"))
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()?;
            let index = obj
                .get("index")
                .map(|i| decode_path_step(i, "IMPORT"))
                .transpose()?;
            Ok(Step::Import { src, path, index })
        }
        "INCLUDE" => Ok(Step::Include {
            src: require(obj, "src", "INCLUDE")?
                .as_str()
                .ok_or_else(|| PatchError::Value("INCLUDE `src` must be a string".into()))?
                .to_string(),
        }),
        "INIT_KEY" => Ok(Step::InitKey {
            index: decode_path_step(require(obj, "index", "INIT_KEY")?, "INIT_KEY")?,
            content: require(obj, "content", "INIT_KEY")?.clone(),
        }),
        "COMMENT" => Ok(Step::Comment {
            value: obj.get("value").cloned().unwrap_or(Value::Null),
        }),
        "DEBUG" => Ok(Step::Debug {
            value: require(obj, "value", "DEBUG")?
                .as_bool()
                .ok_or_else(|| PatchError::Value("DEBUG `value` must be a boolean".into()))?,
        }),
        other => {
            let mut fields = obj.clone();
            fields.remove("type");
            Ok(Step::Custom {
                name: other.to_string(),
                fields,
            })
        }
    }
}

/// Decodes a step array.
pub fn from_json_steps(v: &Value) -> Result<Vec<Step>, PatchError> {
    let arr = v
        .as_array()
        .ok_or_else(|| PatchError::Value("a step sequence must be an array".into()))?;
    arr.iter().map(from_json).collect()
}

/// Decodes a full patch document: a step array, or the legacy mapping form.
pub fn document_from_value(v: &Value) -> Result<PatchDocument, PatchError> {
    match v {
        Value::Array(_) => Ok(PatchDocument::Steps(from_json_steps(v)?)),
        Value::Object(map) => Ok(PatchDocument::Merge(map.clone())),
        other => Err(PatchError::Value(format!(
            "a patch document must be an array or a mapping, found {}",
            patch_steps_util::kind_name(other)
        ))),
    }
}

// ── Encoding ──────────────────────────────────────────────────────────────

fn encode_step_index(index: &StepIndex) -> Value {
    match index {
        StepIndex::One(step) => step.to_value(),
        StepIndex::Chain(steps) => Value::Array(steps.iter().map(PathStep::to_value).collect()),
    }
}

fn push_comment(m: &mut Map<String, Value>, comment: &Option<String>) {
    if let Some(comment) = comment {
        m.insert("comment".into(), json!(comment));
    }
}

/// Encodes one step to its wire object.
pub fn to_json(step: &Step) -> Value {
    match step {
        Step::Enter { index, comment } => {
            let mut m = Map::new();
            m.insert("type".into(), json!("ENTER"));
            m.insert("index".into(), encode_step_index(index));
            push_comment(&mut m, comment);
            Value::Object(m)
        }
        Step::Exit { count, comment } => {
            let mut m = Map::new();
            m.insert("type".into(), json!("EXIT"));
            if let Some(count) = count {
                m.insert("count".into(), json!(count));
            }
            push_comment(&mut m, comment);
            Value::Object(m)
        }
        Step::SetKey {
            index,
            content,
            comment,
        } => {
            let mut m = Map::new();
            m.insert("type".into(), json!("SET_KEY"));
            m.insert("index".into(), index.to_value());
            if let Some(content) = content {
                m.insert("content".into(), content.clone());
            }
            push_comment(&mut m, comment);
            Value::Object(m)
        }
        Step::RemoveArrayElement { index, comment } => {
            let mut m = Map::new();
            m.insert("type".into(), json!("REMOVE_ARRAY_ELEMENT"));
            m.insert("index".into(), json!(index));
            push_comment(&mut m, comment);
            Value::Object(m)
        }
        Step::AddArrayElement {
            index,
            content,
            comment,
        } => {
            let mut m = Map::new();
            m.insert("type".into(), json!("ADD_ARRAY_ELEMENT"));
            if let Some(index) = index {
                m.insert("index".into(), json!(index));
            }
            m.insert("content".into(), content.clone());
            push_comment(&mut m, comment);
            Value::Object(m)
        }
        Step::ForIn {
            values,
            keyword,
            body,
        } => json!({
            "type": "FOR_IN",
            "values": values,
            "keyword": match keyword {
                Keyword::Literal(kw) => json!(kw),
                Keyword::Patterns(patterns) => Value::Object(
                    patterns
                        .iter()
                        .map(|(name, pattern)| (name.clone(), json!(pattern)))
                        .collect(),
                ),
            },
            "body": body,
        }),
        Step::Copy { alias } => json!({ "type": "COPY", "alias": alias }),
        Step::Paste { alias, index } => {
            let mut m = Map::new();
            m.insert("type".into(), json!("PASTE"));
            m.insert("alias".into(), json!(alias));
            if let Some(index) = index {
                m.insert("index".into(), index.to_value());
            }
            Value::Object(m)
        }
        Step::Import { src, path, index } => {
            let mut m = Map::new();
            m.insert("type".into(), json!("IMPORT"));
            m.insert("src".into(), json!(src));
            if let Some(path) = path {
                m.insert(
                    "path".into(),
                    Value::Array(path.iter().map(PathStep::to_value).collect()),
                );
            }
            if let Some(index) = index {
                m.insert("index".into(), index.to_value());
            }
            Value::Object(m)
        }
        Step::Include { src } => json!({ "type": "INCLUDE", "src": src }),
        Step::InitKey { index, content } => json!({
            "type": "INIT_KEY",
            "index": index.to_value(),
            "content": content,
        }),
        Step::Comment { value } => json!({ "type": "COMMENT", "value": value }),
        Step::Debug { value } => json!({ "type": "DEBUG", "value": value }),
        Step::Custom { name, fields } => {
            let mut m = Map::new();
            m.insert("type".into(), json!(name));
            for (key, val) in fields {
                m.insert(key.clone(), val.clone());
            }
            Value::Object(m)
        }
    }
}

/// Encodes a step sequence to its wire array.
pub fn to_json_steps(steps: &[Step]) -> Value {
    Value::Array(steps.iter().map(to_json).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roundtrip(wire: Value) -> Value {
        let step = from_json(&wire).expect("decode failed");
        to_json(&step)
    }

    #[test]
    fn enter_scalar_and_chain() {
        assert_eq!(
            roundtrip(json!({"type": "ENTER", "index": "models"})),
            json!({"type": "ENTER", "index": "models"})
        );
        assert_eq!(
            roundtrip(json!({"type": "ENTER", "index": ["models", 2, "parts"]})),
            json!({"type": "ENTER", "index": ["models", 2, "parts"]})
        );
    }

    #[test]
    fn exit_with_and_without_count() {
        assert_eq!(
            roundtrip(json!({"type": "EXIT"})),
            json!({"type": "EXIT"})
        );
        assert_eq!(
            roundtrip(json!({"type": "EXIT", "count": 3})),
            json!({"type": "EXIT", "count": 3})
        );
    }

    #[test]
    fn set_key_deletion_has_no_content() {
        let step = from_json(&json!({"type": "SET_KEY", "index": "b"})).unwrap();
        assert_eq!(
            step,
            Step::SetKey {
                index: PathStep::Key("b".into()),
                content: None,
                comment: None
            }
        );
    }

    #[test]
    fn add_array_element_append_form() {
        let step = from_json(&json!({"type": "ADD_ARRAY_ELEMENT", "content": 3})).unwrap();
        assert_eq!(
            step,
            Step::AddArrayElement {
                index: None,
                content: json!(3),
                comment: None
            }
        );
    }

    #[test]
    fn for_in_with_literal_and_pattern_keywords() {
        let wire = json!({
            "type": "FOR_IN",
            "values": [1, 2],
            "keyword": "$value",
            "body": [{"type": "ADD_ARRAY_ELEMENT", "content": "$value"}],
        });
        assert_eq!(roundtrip(wire.clone()), wire);

        let wire = json!({
            "type": "FOR_IN",
            "values": [{"id": "a"}],
            "keyword": {"id": "\\$id"},
            "body": [],
        });
        assert_eq!(roundtrip(wire.clone()), wire);
    }

    #[test]
    fn import_with_path_and_index() {
        let wire = json!({
            "type": "IMPORT",
            "src": "game:data/foo.json",
            "path": ["entries", 0],
            "index": "imported",
        });
        assert_eq!(roundtrip(wire.clone()), wire);
    }

    #[test]
    fn unknown_type_survives_as_custom() {
        let wire = json!({"type": "CALL", "id": "my-func", "args": [1]});
        let step = from_json(&wire).unwrap();
        assert_eq!(step.name(), "CALL");
        assert_eq!(to_json(&step), wire);
    }

    #[test]
    fn missing_required_fields_are_value_errors() {
        for wire in [
            json!({"type": "ENTER"}),
            json!({"type": "COPY"}),
            json!({"type": "ADD_ARRAY_ELEMENT"}),
            json!({"type": "REMOVE_ARRAY_ELEMENT", "index": "x"}),
            json!({"type": "FOR_IN", "values": [], "keyword": "k", "body": 5}),
            json!({"type": "DEBUG", "value": "yes"}),
        ] {
            let err = from_json(&wire).unwrap_err();
            assert_eq!(err.kind(), "ValueError", "{wire}");
        }
    }

    #[test]
    fn comment_field_is_preserved() {
        let wire = json!({"type": "SET_KEY", "index": "x", "content": 2, "comment": "root.x"});
        assert_eq!(roundtrip(wire.clone()), wire);
    }

    #[test]
    fn document_forms() {
        assert!(matches!(
            document_from_value(&json!([{ "type": "EXIT" }])).unwrap(),
            PatchDocument::Steps(_)
        ));
        assert!(matches!(
            document_from_value(&json!({"a": 1})).unwrap(),
            PatchDocument::Merge(_)
        ));
        assert!(document_from_value(&json!(4)).is_err());
    }
}
