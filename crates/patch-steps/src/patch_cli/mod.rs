//! Command-line tools for diffing and patching JSON documents.
//!
//! Provides the core logic used by the binary entry points:
//! - `patch-steps-diff`  — generate a step sequence from two documents
//! - `patch-steps-patch` — apply a step sequence to a document

use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::patch::codec::json as codec;
use crate::patch::{DebugState, LoadError, Loader, Origin, Patcher};
use crate::patch_diff::{diff, DiffSettings};

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Diff(String),
    #[error("{0}")]
    Patch(String),
}

// ── patch-steps-diff ──────────────────────────────────────────────────────

/// Diffs two JSON documents into a pretty-printed step array.
///
/// `settings_json` is an optional partial [`DiffSettings`] object merged
/// over the defaults.
pub fn diff_documents(
    a_json: &str,
    b_json: &str,
    settings_json: Option<&str>,
) -> Result<String, CliError> {
    let a: Value = serde_json::from_str(a_json)?;
    let b: Value = serde_json::from_str(b_json)?;
    let settings: DiffSettings = match settings_json {
        Some(raw) => serde_json::from_str(raw)?,
        None => DiffSettings::default(),
    };
    match diff(&a, &b, &settings) {
        Some(steps) => Ok(serde_json::to_string_pretty(&codec::to_json_steps(&steps))?),
        None => Err(CliError::Diff(
            "documents are structurally unrelated; ship the new document instead of a patch"
                .into(),
        )),
    }
}

// ── patch-steps-patch ─────────────────────────────────────────────────────

/// Applies a patch document (step array or legacy mapping) and returns the
/// pretty-printed result. Failures carry the rendered step trace.
pub fn patch_document(
    doc_json: &str,
    patch_json: &str,
    loader: &dyn Loader,
) -> Result<String, CliError> {
    let mut doc: Value = serde_json::from_str(doc_json)?;
    let raw: Value = serde_json::from_str(patch_json)?;
    let patch = codec::document_from_value(&raw).map_err(|e| CliError::Patch(e.to_string()))?;

    let patcher = Patcher::new(loader);
    let mut debug = DebugState::new();
    patcher
        .patch_traced(&mut doc, &patch, "<patch>", &mut debug)
        .map_err(|e| CliError::Patch(format!("{e}\n{}", debug.render())))?;
    Ok(serde_json::to_string_pretty(&doc)?)
}

// ── Filesystem loader ─────────────────────────────────────────────────────

/// Loader resolving game- and mod-origin references against two directory
/// roots. Custom origins are refused.
pub struct FsLoader {
    game_root: PathBuf,
    mod_root: PathBuf,
}

impl FsLoader {
    pub fn new(game_root: impl Into<PathBuf>, mod_root: impl Into<PathBuf>) -> Self {
        Self {
            game_root: game_root.into(),
            mod_root: mod_root.into(),
        }
    }
}

impl Loader for FsLoader {
    fn load(&self, origin: &Origin, path: &str) -> Result<Value, LoadError> {
        let root = match origin {
            Origin::Game => &self.game_root,
            Origin::Mod => &self.mod_root,
            Origin::Custom(_) => {
                return Err(LoadError::new(origin, path, "unknown origin"));
            }
        };
        let full = root.join(path);
        let text =
            fs::read_to_string(&full).map_err(|e| LoadError::new(origin, path, e))?;
        serde_json::from_str(&text).map_err(|e| LoadError::new(origin, path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::DenyLoader;
    use serde_json::json;

    #[test]
    fn diff_then_patch_round_trips_through_strings() {
        let a = r#"{"x": 1, "list": [1, 2]}"#;
        let b = json!({"x": 2, "list": [1, 2, 3]});
        let patch = diff_documents(a, &b.to_string(), None).unwrap();
        let result = patch_document(a, &patch, &DenyLoader).unwrap();
        let result: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(result, b);
    }

    #[test]
    fn diff_accepts_partial_settings() {
        let patch = diff_documents(
            r#"{"x": 1}"#,
            r#"{"x": 2}"#,
            Some(r#"{"comment": "doc"}"#),
        )
        .unwrap();
        assert!(patch.contains("doc.x"));
    }

    #[test]
    fn unrelated_documents_refuse_to_diff() {
        let err = diff_documents("[1]", r#"{"a": 1}"#, None).unwrap_err();
        assert!(matches!(err, CliError::Diff(_)));
    }

    #[test]
    fn patch_failure_carries_the_trace() {
        let err = patch_document(
            "{}",
            r#"[{"type": "ENTER", "index": "missing"}]"#,
            &DenyLoader,
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("at ENTER (step: 0)"));
    }

    #[test]
    fn invalid_json_is_reported() {
        assert!(diff_documents("{", "{}", None).is_err());
        assert!(patch_document("{}", "not json", &DenyLoader).is_err());
    }
}
