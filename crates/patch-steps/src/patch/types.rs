//! Core types for the Patch Steps module: the step vocabulary, cursor path
//! steps, document forms, and the error taxonomy.

use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use thiserror::Error;

use patch_steps_util::MergeError;

use super::source::LoadError;

// ── Error ─────────────────────────────────────────────────────────────────

/// Failure raised while decoding or applying a step sequence.
#[derive(Debug, Error)]
pub enum PatchError {
    /// A step is missing a required field or carries an invalid one.
    #[error("ValueError: {0}")]
    Value(String),
    /// Unknown step type, or an operation against an unsupported cursor kind.
    #[error("TypeError: {0}")]
    Type(String),
    /// Navigation failure: missing key on ENTER, EXIT underflow, or an index
    /// out of range.
    #[error("Error: {0}")]
    State(String),
    /// IMPORT merged incompatible kinds.
    #[error(transparent)]
    Merge(#[from] MergeError),
    /// Loader failure, surfaced verbatim.
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl PatchError {
    /// Short taxonomy label used in rendered traces.
    pub fn kind(&self) -> &'static str {
        match self {
            PatchError::Value(_) => "ValueError",
            PatchError::Type(_) => "TypeError",
            PatchError::State(_) => "Error",
            PatchError::Merge(_) => "TypeMismatch",
            PatchError::Load(_) => "LoadError",
        }
    }
}

// ── Cursor path steps ─────────────────────────────────────────────────────

/// One cursor descent: an object key or an array position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

impl PathStep {
    /// Reads a path step from a wire value (string or non-negative integer).
    pub fn from_value(value: &Value) -> Option<PathStep> {
        match value {
            Value::String(s) => Some(PathStep::Key(s.clone())),
            Value::Number(n) => n.as_u64().map(|i| PathStep::Index(i as usize)),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            PathStep::Key(key) => Value::String(key.clone()),
            PathStep::Index(index) => Value::from(*index as u64),
        }
    }

    /// The object-key form of this step (numeric steps use their decimal
    /// rendering, matching how the original system indexed objects).
    pub fn as_key(&self) -> String {
        match self {
            PathStep::Key(key) => key.clone(),
            PathStep::Index(index) => index.to_string(),
        }
    }

    /// The array-position form of this step, when it has one.
    pub fn as_array_index(&self) -> Option<usize> {
        match self {
            PathStep::Index(index) => Some(*index),
            PathStep::Key(key) => key.parse().ok(),
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Key(key) => write!(f, "{key}"),
            PathStep::Index(index) => write!(f, "{index}"),
        }
    }
}

/// ENTER's target: a single key or a chain descended in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepIndex {
    One(PathStep),
    Chain(Vec<PathStep>),
}

impl StepIndex {
    pub fn steps(&self) -> &[PathStep] {
        match self {
            StepIndex::One(step) => std::slice::from_ref(step),
            StepIndex::Chain(steps) => steps,
        }
    }

    pub fn into_vec(self) -> Vec<PathStep> {
        match self {
            StepIndex::One(step) => vec![step],
            StepIndex::Chain(steps) => steps,
        }
    }
}

// ── Step vocabulary ───────────────────────────────────────────────────────

/// FOR_IN's substitution keyword: a literal marker replaced by the whole
/// element, or named regex patterns each replaced by the same-named field of
/// the element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyword {
    Literal(String),
    Patterns(IndexMap<String, String>),
}

/// One edit operation in a patch sequence.
///
/// Diff-emitted variants carry an optional `comment` holding the dotted path
/// the step targets, attached when [`DiffSettings::comment`] is set.
///
/// [`DiffSettings::comment`]: crate::patch_diff::DiffSettings
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Push the cursor onto the stack and descend through each key in order.
    Enter {
        index: StepIndex,
        comment: Option<String>,
    },
    /// Pop `count` (default 1) ancestors back into the cursor.
    Exit {
        count: Option<usize>,
        comment: Option<String>,
    },
    /// Set `cursor[index]` to a copy of `content`, or delete the key when
    /// `content` is absent.
    SetKey {
        index: PathStep,
        content: Option<Value>,
        comment: Option<String>,
    },
    /// Splice one element out of the array cursor.
    RemoveArrayElement {
        index: usize,
        comment: Option<String>,
    },
    /// Splice a copy of `content` in at `index`, or append when absent.
    AddArrayElement {
        index: Option<usize>,
        content: Value,
        comment: Option<String>,
    },
    /// Execute `body` once per element of `values`, substituting `keyword`
    /// occurrences in the body with the current element first. The body is
    /// kept as raw step JSON so substitution happens before decoding.
    ForIn {
        values: Vec<Value>,
        keyword: Keyword,
        body: Vec<Value>,
    },
    /// Deep-copy the cursor into the alias register `alias`.
    Copy { alias: String },
    /// Write a copy of the aliased value back out: into an array cursor as
    /// ADD_ARRAY_ELEMENT, into an object cursor as SET_KEY.
    Paste {
        alias: String,
        index: Option<PathStep>,
    },
    /// Load a game-origin value; optionally descend `path`, then either set
    /// `cursor[index]` or deep-merge into the cursor.
    Import {
        src: String,
        path: Option<Vec<PathStep>>,
        index: Option<PathStep>,
    },
    /// Load a mod-origin patch document and apply it to the current cursor.
    Include { src: String },
    /// SET_KEY that only fires when the key is currently absent.
    InitKey { index: PathStep, content: Value },
    /// No mutation; surfaced when the debug flag is active.
    Comment { value: Value },
    /// Toggle the interpreter's debug flag.
    Debug { value: bool },
    /// A step outside the built-in vocabulary, dispatched through the
    /// host-supplied registry.
    Custom {
        name: String,
        fields: Map<String, Value>,
    },
}

impl Step {
    /// The wire name of this step's type.
    pub fn name(&self) -> &str {
        match self {
            Step::Enter { .. } => "ENTER",
            Step::Exit { .. } => "EXIT",
            Step::SetKey { .. } => "SET_KEY",
            Step::RemoveArrayElement { .. } => "REMOVE_ARRAY_ELEMENT",
            Step::AddArrayElement { .. } => "ADD_ARRAY_ELEMENT",
            Step::ForIn { .. } => "FOR_IN",
            Step::Copy { .. } => "COPY",
            Step::Paste { .. } => "PASTE",
            Step::Import { .. } => "IMPORT",
            Step::Include { .. } => "INCLUDE",
            Step::InitKey { .. } => "INIT_KEY",
            Step::Comment { .. } => "COMMENT",
            Step::Debug { .. } => "DEBUG",
            Step::Custom { name, .. } => name,
        }
    }
}

// ── Document forms ────────────────────────────────────────────────────────

/// A patch document: a step sequence, or the legacy shallow-recursive-merge
/// mapping form.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchDocument {
    Steps(Vec<Step>),
    Merge(Map<String, Value>),
}
