//! Call-stack tracking for diagnostic error reporting.
//!
//! A [`DebugState`] records which file is being processed and which step is
//! executing, across nested INCLUDE boundaries. Step entries are pushed
//! before each dispatch and popped on success; a failing step leaves its
//! entry in place and records the error, so [`DebugState::render`] can print
//! the whole nested trace innermost-first.

use super::types::PatchError;

#[derive(Debug, Default)]
pub struct DebugState {
    files: Vec<FileFrame>,
    // One failure aborts the whole run; the first recording wins as the
    // error unwinds through nested INCLUDE/FOR_IN frames.
    error_recorded: bool,
}

#[derive(Debug)]
struct FileFrame {
    path: String,
    trace: Vec<TraceEntry>,
}

#[derive(Debug)]
enum TraceEntry {
    Step {
        index: usize,
        name: Option<String>,
    },
    // The message carries its own taxonomy label (PatchError's Display).
    Error {
        message: String,
    },
}

impl DebugState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a file frame; subsequent step entries land in it.
    pub fn add_file(&mut self, path: impl Into<String>) {
        self.files.push(FileFrame {
            path: path.into(),
            trace: Vec::new(),
        });
    }

    /// Closes the innermost file frame, returning its path.
    pub fn remove_last_file(&mut self) -> Option<String> {
        self.files.pop().map(|frame| frame.path)
    }

    /// Re-arms error recording at the start of a patch run.
    pub(crate) fn begin_run(&mut self) {
        self.error_recorded = false;
    }

    /// Records that the step at `index` is about to execute.
    pub fn add_step(&mut self, index: usize) {
        if let Some(frame) = self.files.last_mut() {
            frame.trace.push(TraceEntry::Step { index, name: None });
        }
    }

    /// Attaches the resolved step-type name to the entry most recently added
    /// by [`add_step`](Self::add_step).
    pub fn annotate_last_step(&mut self, name: &str) {
        if let Some(TraceEntry::Step { name: slot, .. }) =
            self.files.last_mut().and_then(|frame| frame.trace.last_mut())
        {
            *slot = Some(name.to_string());
        }
    }

    /// Pops the innermost step entry after it completed without error.
    pub fn remove_last_step(&mut self) {
        if let Some(frame) = self.files.last_mut() {
            if matches!(frame.trace.last(), Some(TraceEntry::Step { .. })) {
                frame.trace.pop();
            }
        }
    }

    /// Appends an error entry to the innermost file frame. Only the first
    /// recording of a run takes effect; re-recordings while the same error
    /// unwinds are ignored.
    pub fn record_error(&mut self, error: &PatchError) {
        if self.error_recorded {
            return;
        }
        self.error_recorded = true;
        if self.files.is_empty() {
            self.add_file("<patch>");
        }
        if let Some(frame) = self.files.last_mut() {
            frame.trace.push(TraceEntry::Error {
                message: error.to_string(),
            });
        }
    }

    /// Renders the recorded trace as a stack trace, innermost frame first.
    pub fn render(&self) -> String {
        let mut out = String::from("patch failed:\n");
        for frame in self.files.iter().rev() {
            out.push_str(&format!("  in {}:\n", frame.path));
            for entry in frame.trace.iter().rev() {
                match entry {
                    TraceEntry::Error { message } => {
                        out.push_str(&format!("    {message}\n"));
                    }
                    TraceEntry::Step { index, name } => {
                        let name = name.as_deref().unwrap_or("<step>");
                        out.push_str(&format!("    at {name} (step: {index})\n"));
                    }
                }
            }
        }
        out
    }
}
