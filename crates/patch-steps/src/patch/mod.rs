//! Patch Steps application.
//!
//! # Steps
//!
//! Navigation: `ENTER`, `EXIT`.
//!
//! Mutation: `SET_KEY`, `ADD_ARRAY_ELEMENT`, `REMOVE_ARRAY_ELEMENT`,
//! `INIT_KEY`.
//!
//! Composition: `FOR_IN`, `COPY`, `PASTE`, `IMPORT`, `INCLUDE`.
//!
//! Diagnostics: `COMMENT`, `DEBUG`.
//!
//! A document that is a plain mapping instead of a step array is applied in
//! the legacy shallow-recursive-merge mode.

pub mod apply;
pub mod codec;
pub mod debug;
pub mod source;
pub mod types;

pub use apply::{merge_document, CustomApplier, PatchContext, StepRegistry};
pub use codec::json::{document_from_value, from_json, from_json_steps, to_json, to_json_steps};
pub use debug::DebugState;
pub use source::{parse_src, DenyLoader, LoadError, Loader, Origin, SrcReference};
pub use types::{Keyword, PatchDocument, PatchError, PathStep, Step, StepIndex};

use serde_json::Value;

use apply::Interpreter;

/// Applies patch documents against a loader and a registry of host-defined
/// step appliers.
pub struct Patcher<'a> {
    loader: &'a dyn Loader,
    registry: StepRegistry,
}

impl<'a> Patcher<'a> {
    pub fn new(loader: &'a dyn Loader) -> Self {
        Self {
            loader,
            registry: StepRegistry::new(),
        }
    }

    /// Registers a host-defined applier for the given step type name.
    pub fn register(&mut self, name: impl Into<String>, applier: CustomApplier) {
        self.registry.register(name, applier);
    }

    /// Applies `doc` to `root`. On failure the rendered trace is logged and
    /// the error returned; the document keeps every mutation up to the
    /// failing step, so callers needing atomicity patch a copy and swap it
    /// in on success. `file` names the document in traces.
    pub fn patch(
        &self,
        root: &mut Value,
        doc: &PatchDocument,
        file: &str,
    ) -> Result<(), PatchError> {
        let mut debug = DebugState::new();
        match self.patch_traced(root, doc, file, &mut debug) {
            Ok(()) => Ok(()),
            Err(error) => {
                let rendered = debug.render();
                tracing::error!("{}", rendered);
                Err(error)
            }
        }
    }

    /// Like [`patch`](Self::patch), but records into a caller-supplied
    /// [`DebugState`] and leaves rendering to the caller.
    pub fn patch_traced(
        &self,
        root: &mut Value,
        doc: &PatchDocument,
        file: &str,
        debug: &mut DebugState,
    ) -> Result<(), PatchError> {
        debug.begin_run();
        debug.add_file(file);
        let interpreter = Interpreter {
            loader: self.loader,
            registry: &self.registry,
        };
        let result = interpreter.run(root, doc, debug);
        if result.is_ok() {
            debug.remove_last_file();
        }
        result
    }
}
