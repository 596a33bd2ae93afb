//! Step application: the cursor/stack state machine and per-step appliers.
//!
//! The cursor is represented as the document root plus the path of levels
//! opened by ENTER; every applier navigates from the root, so the borrow of
//! the document is always scoped to one step. EXIT pops levels, and the
//! stack invariant is simply the length of that path.

use std::collections::HashMap;

use indexmap::IndexMap;
use regex::{NoExpand, Regex};
use serde_json::{Map, Value};

use patch_steps_util::{copy, kind_name, merge};

use super::codec::json as codec;
use super::debug::DebugState;
use super::source::{parse_src, Loader, Origin};
use super::types::{Keyword, PatchDocument, PatchError, PathStep, Step, StepIndex};

// ── Host extension registry ───────────────────────────────────────────────

/// Applier for a step type outside the built-in vocabulary. Receives the
/// interpreter context and the step's raw fields (everything but `type`).
pub type CustomApplier = Box<dyn Fn(&mut PatchContext<'_>, &Map<String, Value>) -> Result<(), PatchError>>;

/// Capability-scoped registry of host-defined step appliers.
///
/// Passed into the interpreter by the [`Patcher`](super::Patcher) that owns
/// it; there is no process-wide applier table.
#[derive(Default)]
pub struct StepRegistry {
    appliers: HashMap<String, CustomApplier>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, applier: CustomApplier) {
        self.appliers.insert(name.into(), applier);
    }

    fn get(&self, name: &str) -> Option<&CustomApplier> {
        self.appliers.get(name)
    }
}

// ── Interpreter context ───────────────────────────────────────────────────

/// Mutable state of one patch run: the document, the opened path, the alias
/// registers, and the debug flag.
pub struct PatchContext<'a> {
    root: &'a mut Value,
    path: Vec<PathStep>,
    registers: IndexMap<String, Value>,
    debug: bool,
}

fn navigate<'v>(root: &'v Value, path: &[PathStep]) -> Result<&'v Value, PatchError> {
    let mut cursor = root;
    for step in path {
        cursor = match (cursor, step) {
            (Value::Object(fields), PathStep::Key(key)) => fields.get(key),
            (Value::Array(elements), PathStep::Index(index)) => elements.get(*index),
            _ => None,
        }
        .ok_or_else(|| PatchError::State(format!("cursor path `{step}` no longer resolves")))?;
    }
    Ok(cursor)
}

fn navigate_mut<'v>(root: &'v mut Value, path: &[PathStep]) -> Result<&'v mut Value, PatchError> {
    let mut cursor = root;
    for step in path {
        cursor = match (cursor, step) {
            (Value::Object(fields), PathStep::Key(key)) => fields.get_mut(key),
            (Value::Array(elements), PathStep::Index(index)) => elements.get_mut(*index),
            _ => None,
        }
        .ok_or_else(|| PatchError::State(format!("cursor path `{step}` no longer resolves")))?;
    }
    Ok(cursor)
}

impl<'a> PatchContext<'a> {
    pub(super) fn new(root: &'a mut Value) -> Self {
        Self {
            root,
            path: Vec::new(),
            registers: IndexMap::new(),
            debug: false,
        }
    }

    /// The value the next step will operate on.
    pub fn cursor(&self) -> Result<&Value, PatchError> {
        navigate(self.root, &self.path)
    }

    pub fn cursor_mut(&mut self) -> Result<&mut Value, PatchError> {
        navigate_mut(self.root, &self.path)
    }

    /// Current ENTER-nesting depth.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, on: bool) {
        self.debug = on;
    }

    /// Reads an alias register.
    pub fn alias(&self, name: &str) -> Option<&Value> {
        self.registers.get(name)
    }

    // ── Appliers ──────────────────────────────────────────────────────────

    pub fn enter(&mut self, index: &StepIndex) -> Result<(), PatchError> {
        for step in index.steps() {
            self.enter_one(step)?;
        }
        Ok(())
    }

    fn enter_one(&mut self, step: &PathStep) -> Result<(), PatchError> {
        let cursor = navigate(self.root, &self.path)?;
        let normalized = match cursor {
            Value::Object(fields) => {
                let key = step.as_key();
                if !fields.contains_key(&key) {
                    return Err(PatchError::State(format!(
                        "cannot enter `{key}`: no such member"
                    )));
                }
                PathStep::Key(key)
            }
            Value::Array(elements) => {
                let index = step.as_array_index().ok_or_else(|| {
                    PatchError::State(format!("cannot enter `{step}`: not an array position"))
                })?;
                if index >= elements.len() {
                    return Err(PatchError::State(format!(
                        "cannot enter `{index}`: no such element"
                    )));
                }
                PathStep::Index(index)
            }
            other => {
                return Err(PatchError::State(format!(
                    "cannot enter `{step}` in a {} value",
                    kind_name(other)
                )))
            }
        };
        self.path.push(normalized);
        Ok(())
    }

    pub fn exit(&mut self, count: usize) -> Result<(), PatchError> {
        if count > self.path.len() {
            return Err(PatchError::State(format!(
                "EXIT of {count} with only {} levels open",
                self.path.len()
            )));
        }
        self.path.truncate(self.path.len() - count);
        Ok(())
    }

    pub fn set_key(&mut self, index: &PathStep, content: Option<&Value>) -> Result<(), PatchError> {
        match self.cursor_mut()? {
            Value::Object(fields) => {
                let key = index.as_key();
                match content {
                    Some(value) => {
                        fields.insert(key, copy(value));
                    }
                    None => {
                        fields.remove(&key);
                    }
                }
                Ok(())
            }
            Value::Array(elements) => {
                let position = index.as_array_index().ok_or_else(|| {
                    PatchError::Value("SET_KEY on an array requires a numeric index".into())
                })?;
                let value = content.ok_or_else(|| {
                    PatchError::Value(
                        "SET_KEY without content cannot delete from an array; use REMOVE_ARRAY_ELEMENT".into(),
                    )
                })?;
                if position < elements.len() {
                    elements[position] = copy(value);
                } else if position == elements.len() {
                    elements.push(copy(value));
                } else {
                    return Err(PatchError::State(format!(
                        "SET_KEY at {position} past the end of a {}-element array",
                        elements.len()
                    )));
                }
                Ok(())
            }
            other => Err(PatchError::Type(format!(
                "SET_KEY requires an object or array cursor, found {}",
                kind_name(other)
            ))),
        }
    }

    pub fn init_key(&mut self, index: &PathStep, content: &Value) -> Result<(), PatchError> {
        let absent = match self.cursor()? {
            Value::Object(fields) => !fields.contains_key(&index.as_key()),
            Value::Array(elements) => index
                .as_array_index()
                .is_some_and(|position| position >= elements.len()),
            other => {
                return Err(PatchError::Type(format!(
                    "INIT_KEY requires an object or array cursor, found {}",
                    kind_name(other)
                )))
            }
        };
        if absent {
            self.set_key(index, Some(content))?;
        }
        Ok(())
    }

    pub fn remove_array_element(&mut self, index: usize) -> Result<(), PatchError> {
        match self.cursor_mut()? {
            Value::Array(elements) => {
                if index >= elements.len() {
                    return Err(PatchError::State(format!(
                        "REMOVE_ARRAY_ELEMENT at {index} past the end of a {}-element array",
                        elements.len()
                    )));
                }
                elements.remove(index);
                Ok(())
            }
            other => Err(PatchError::Type(format!(
                "REMOVE_ARRAY_ELEMENT requires an array cursor, found {}",
                kind_name(other)
            ))),
        }
    }

    pub fn add_array_element(
        &mut self,
        index: Option<usize>,
        content: &Value,
    ) -> Result<(), PatchError> {
        match self.cursor_mut()? {
            Value::Array(elements) => {
                match index {
                    Some(position) => {
                        let position = position.min(elements.len());
                        elements.insert(position, copy(content));
                    }
                    None => elements.push(copy(content)),
                }
                Ok(())
            }
            other => Err(PatchError::Type(format!(
                "ADD_ARRAY_ELEMENT requires an array cursor, found {}",
                kind_name(other)
            ))),
        }
    }

    pub fn copy_alias(&mut self, alias: &str) -> Result<(), PatchError> {
        let snapshot = copy(self.cursor()?);
        self.registers.insert(alias.to_string(), snapshot);
        Ok(())
    }

    pub fn paste_alias(&mut self, alias: &str, index: Option<&PathStep>) -> Result<(), PatchError> {
        let stored = self
            .registers
            .get(alias)
            .ok_or_else(|| PatchError::Value(format!("PASTE of alias `{alias}` before any COPY")))?;
        let content = copy(stored);
        match self.cursor()? {
            Value::Array(_) => {
                let position = match index {
                    Some(step) => Some(step.as_array_index().ok_or_else(|| {
                        PatchError::Value("PASTE into an array requires a numeric index".into())
                    })?),
                    None => None,
                };
                self.add_array_element(position, &content)
            }
            Value::Object(_) => {
                let index = index.cloned().ok_or_else(|| {
                    PatchError::Value("PASTE into an object requires `index`".into())
                })?;
                self.set_key(&index, Some(&content))
            }
            other => Err(PatchError::Type(format!(
                "PASTE requires an object or array cursor, found {}",
                kind_name(other)
            ))),
        }
    }
}

// ── Legacy merge-form documents ───────────────────────────────────────────

/// Applies a legacy mapping-form patch: shallow recursive merge, no step
/// tracing.
pub fn merge_document(root: &mut Value, patch: &Map<String, Value>) -> Result<(), PatchError> {
    match root {
        Value::Object(fields) => {
            merge_fields(fields, patch);
            Ok(())
        }
        other => Err(PatchError::Type(format!(
            "a merge-form patch requires an object target, found {}",
            kind_name(other)
        ))),
    }
}

fn merge_fields(root: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, patch_value) in patch {
        match (root.get_mut(key), patch_value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                merge_fields(existing, nested);
            }
            _ => {
                root.insert(key.clone(), copy(patch_value));
            }
        }
    }
}

// ── FOR_IN substitution ───────────────────────────────────────────────────

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn replace_strings(raw: &Value, substitute: &dyn Fn(&str) -> String) -> Value {
    match raw {
        Value::String(s) => Value::String(substitute(s)),
        Value::Array(elements) => Value::Array(
            elements
                .iter()
                .map(|element| replace_strings(element, substitute))
                .collect(),
        ),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, val)| (key.clone(), replace_strings(val, substitute)))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}

// ── Interpreter ───────────────────────────────────────────────────────────

pub(super) struct Interpreter<'a> {
    pub loader: &'a dyn Loader,
    pub registry: &'a StepRegistry,
}

impl<'a> Interpreter<'a> {
    /// Applies a document to `root`. Step documents get a fresh context
    /// (empty path, empty alias registers, debug flag off).
    pub fn run(
        &self,
        root: &mut Value,
        doc: &PatchDocument,
        debug: &mut DebugState,
    ) -> Result<(), PatchError> {
        match doc {
            PatchDocument::Merge(patch) => merge_document(root, patch),
            PatchDocument::Steps(steps) => {
                let mut ctx = PatchContext::new(root);
                self.run_steps(&mut ctx, steps, debug)
            }
        }
    }

    fn run_steps(
        &self,
        ctx: &mut PatchContext<'_>,
        steps: &[Step],
        debug: &mut DebugState,
    ) -> Result<(), PatchError> {
        for (index, step) in steps.iter().enumerate() {
            debug.add_step(index);
            debug.annotate_last_step(step.name());
            match self.apply_step(ctx, step, debug) {
                Ok(()) => debug.remove_last_step(),
                Err(error) => {
                    debug.record_error(&error);
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    fn apply_step(
        &self,
        ctx: &mut PatchContext<'_>,
        step: &Step,
        debug: &mut DebugState,
    ) -> Result<(), PatchError> {
        match step {
            Step::Enter { index, .. } => ctx.enter(index),
            Step::Exit { count, .. } => ctx.exit(count.unwrap_or(1)),
            Step::SetKey { index, content, .. } => ctx.set_key(index, content.as_ref()),
            Step::RemoveArrayElement { index, .. } => ctx.remove_array_element(*index),
            Step::AddArrayElement { index, content, .. } => {
                ctx.add_array_element(*index, content)
            }
            Step::ForIn {
                values,
                keyword,
                body,
            } => self.apply_for_in(ctx, values, keyword, body, debug),
            Step::Copy { alias } => ctx.copy_alias(alias),
            Step::Paste { alias, index } => ctx.paste_alias(alias, index.as_ref()),
            Step::Import { src, path, index } => self.apply_import(ctx, src, path.as_deref(), index.as_ref()),
            Step::Include { src } => self.apply_include(ctx, src, debug),
            Step::InitKey { index, content } => ctx.init_key(index, content),
            Step::Comment { value } => {
                if ctx.debug() {
                    tracing::debug!("{value}");
                }
                Ok(())
            }
            Step::Debug { value } => {
                ctx.set_debug(*value);
                Ok(())
            }
            Step::Custom { name, fields } => match self.registry.get(name) {
                Some(applier) => applier(ctx, fields),
                None => Err(PatchError::Type(format!("unknown step type `{name}`"))),
            },
        }
    }

    fn apply_for_in(
        &self,
        ctx: &mut PatchContext<'_>,
        values: &[Value],
        keyword: &Keyword,
        body: &[Value],
        debug: &mut DebugState,
    ) -> Result<(), PatchError> {
        let patterns = match keyword {
            Keyword::Literal(_) => Vec::new(),
            Keyword::Patterns(patterns) => patterns
                .iter()
                .map(|(name, pattern)| {
                    Regex::new(pattern).map(|re| (name.clone(), re)).map_err(|e| {
                        PatchError::Value(format!("FOR_IN keyword pattern `{name}`: {e}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        for value in values {
            let substitute: Box<dyn Fn(&str) -> String> = match keyword {
                Keyword::Literal(kw) => {
                    let replacement = stringify(value);
                    let kw = kw.clone();
                    Box::new(move |s: &str| s.replace(&kw, &replacement))
                }
                Keyword::Patterns(_) => {
                    let fields = value.as_object().ok_or_else(|| {
                        PatchError::Value(
                            "FOR_IN values must be objects when keyword is a mapping".into(),
                        )
                    })?;
                    let replacements = patterns
                        .iter()
                        .map(|(name, re)| {
                            let field = fields.get(name).ok_or_else(|| {
                                PatchError::Value(format!(
                                    "FOR_IN value has no field `{name}` named by the keyword"
                                ))
                            })?;
                            Ok((re.clone(), stringify(field)))
                        })
                        .collect::<Result<Vec<_>, PatchError>>()?;
                    Box::new(move |s: &str| {
                        let mut current = s.to_string();
                        for (re, replacement) in &replacements {
                            current = re
                                .replace_all(&current, NoExpand(replacement))
                                .into_owned();
                        }
                        current
                    })
                }
            };

            let steps = body
                .iter()
                .map(|raw| codec::from_json(&replace_strings(raw, substitute.as_ref())))
                .collect::<Result<Vec<_>, _>>()?;
            self.run_steps(ctx, &steps, debug)?;
        }
        Ok(())
    }

    fn apply_import(
        &self,
        ctx: &mut PatchContext<'_>,
        src: &str,
        path: Option<&[PathStep]>,
        index: Option<&PathStep>,
    ) -> Result<(), PatchError> {
        let reference = parse_src(src, Origin::Game);
        let loaded = self.loader.load(&reference.origin, &reference.path)?;
        let target = match path {
            Some(path) => descend(&loaded, path)?,
            None => &loaded,
        };
        match index {
            Some(index) => ctx.set_key(index, Some(target)),
            None => {
                merge(ctx.cursor_mut()?, target)?;
                Ok(())
            }
        }
    }

    fn apply_include(
        &self,
        ctx: &mut PatchContext<'_>,
        src: &str,
        debug: &mut DebugState,
    ) -> Result<(), PatchError> {
        let reference = parse_src(src, Origin::Mod);
        let loaded = self.loader.load(&reference.origin, &reference.path)?;
        let doc = codec::document_from_value(&loaded)?;
        debug.add_file(format!("{}:{}", reference.origin, reference.path));
        let cursor = navigate_mut(ctx.root, &ctx.path)?;
        self.run(cursor, &doc, debug)?;
        debug.remove_last_file();
        Ok(())
    }
}

fn descend<'v>(value: &'v Value, path: &[PathStep]) -> Result<&'v Value, PatchError> {
    let mut cursor = value;
    for step in path {
        cursor = match cursor {
            Value::Object(fields) => fields.get(&step.as_key()),
            Value::Array(elements) => step.as_array_index().and_then(|i| elements.get(i)),
            _ => None,
        }
        .ok_or_else(|| {
            PatchError::State(format!("IMPORT path segment `{step}` not found"))
        })?;
    }
    Ok(cursor)
}

// ── Tests ─────────────────────────────────────────────────────────────────
