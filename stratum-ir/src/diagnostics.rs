//! Diagnostics engine with scoped handlers
//!
//! Passes raise diagnostics through a [`DiagnosticEngine`]; whoever drives
//! the pipeline decides what to do with them by installing a handler for
//! the duration of one run. Handlers are strictly scoped resources: the
//! guard returned by [`DiagnosticEngine::buffer_errors`] detaches its
//! handler on drop, on every exit path.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Diagnostic severity.
///
/// Only `Error` records are retained for the aggregated failure report;
/// lower severities are forwarded to handlers and otherwise ignored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Remark,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Remark => "remark",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// A single diagnostic record: severity, primary message, attached notes.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn remark(message: impl Into<String>) -> Self {
        Self::new(Severity::Remark, message)
    }

    /// Attach a note, returning `self` for chaining.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity.as_str(), self.message)?;
        for note in &self.notes {
            write!(f, "\n  note: {}", note)?;
        }
        Ok(())
    }
}

type Handler = Box<dyn Fn(&Diagnostic) + Send>;

struct HandlerEntry {
    id: u64,
    handler: Handler,
}

/// Dispatches diagnostics to the currently installed handlers.
///
/// Handlers are kept in a stack; every handler sees every diagnostic,
/// most recently installed first. The engine itself never buffers
/// anything, so a diagnostic emitted with no handler installed is dropped.
#[derive(Default)]
pub struct DiagnosticEngine {
    handlers: Mutex<Vec<HandlerEntry>>,
    next_id: AtomicU64,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to every installed handler.
    pub fn emit(&self, diagnostic: Diagnostic) {
        let handlers = self.handlers.lock().expect("diagnostic handler lock");
        for entry in handlers.iter().rev() {
            (entry.handler)(&diagnostic);
        }
    }

    /// Install a handler that buffers error-severity diagnostics until the
    /// returned guard is dropped.
    pub fn buffer_errors(self: &Arc<Self>) -> ScopedHandler {
        let buffer: Arc<Mutex<Vec<Diagnostic>>> = Arc::default();
        let sink = buffer.clone();
        let id = self.install(Box::new(move |diagnostic| {
            if diagnostic.severity == Severity::Error {
                sink.lock()
                    .expect("diagnostic buffer lock")
                    .push(diagnostic.clone());
            }
        }));
        ScopedHandler {
            engine: self.clone(),
            id,
            buffer,
        }
    }

    fn install(&self, handler: Handler) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .lock()
            .expect("diagnostic handler lock")
            .push(HandlerEntry { id, handler });
        id
    }

    fn uninstall(&self, id: u64) {
        let mut handlers = self.handlers.lock().expect("diagnostic handler lock");
        if let Some(index) = handlers.iter().position(|entry| entry.id == id) {
            handlers.remove(index);
        }
    }
}

impl fmt::Debug for DiagnosticEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self
            .handlers
            .lock()
            .map(|handlers| handlers.len())
            .unwrap_or(0);
        f.debug_struct("DiagnosticEngine")
            .field("handlers", &count)
            .finish()
    }
}

/// RAII guard for a buffering handler.
///
/// Dropping the guard detaches the handler, whether the run returned
/// normally, failed, or unwound.
pub struct ScopedHandler {
    engine: Arc<DiagnosticEngine>,
    id: u64,
    buffer: Arc<Mutex<Vec<Diagnostic>>>,
}

impl ScopedHandler {
    /// Number of buffered error diagnostics.
    pub fn error_count(&self) -> usize {
        self.buffer.lock().expect("diagnostic buffer lock").len()
    }

    /// Render the buffered diagnostics as one transcript, in emission
    /// order, notes included.
    pub fn transcript(&self) -> String {
        let buffer = self.buffer.lock().expect("diagnostic buffer lock");
        buffer
            .iter()
            .map(|diagnostic| diagnostic.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Drop for ScopedHandler {
    fn drop(&mut self) {
        self.engine.uninstall(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_collects_errors_only() {
        let engine = Arc::new(DiagnosticEngine::new());
        let guard = engine.buffer_errors();

        engine.emit(Diagnostic::remark("resolved 3 tiles"));
        engine.emit(Diagnostic::warning("layout fallback"));
        engine.emit(Diagnostic::error("illegal tile shape").with_note("at tile.load"));

        assert_eq!(guard.error_count(), 1);
        let transcript = guard.transcript();
        assert!(transcript.contains("error: illegal tile shape"));
        assert!(transcript.contains("note: at tile.load"));
        assert!(!transcript.contains("layout fallback"));
    }

    #[test]
    fn test_handler_detached_on_drop() {
        let engine = Arc::new(DiagnosticEngine::new());
        {
            let _guard = engine.buffer_errors();
        }
        // No handler left; emitting must not panic and goes nowhere.
        engine.emit(Diagnostic::error("after drop"));

        let guard = engine.buffer_errors();
        assert_eq!(guard.error_count(), 0);
    }

    #[test]
    fn test_nested_handlers_both_observe() {
        let engine = Arc::new(DiagnosticEngine::new());
        let outer = engine.buffer_errors();
        {
            let inner = engine.buffer_errors();
            engine.emit(Diagnostic::error("seen by both"));
            assert_eq!(inner.error_count(), 1);
        }
        engine.emit(Diagnostic::error("seen by outer"));
        assert_eq!(outer.error_count(), 2);
    }

    #[test]
    fn test_display_format() {
        let diagnostic = Diagnostic::error("pipeline failed")
            .with_note("stage: lowering")
            .with_note("pass: tile-legalize");
        let text = diagnostic.to_string();
        assert_eq!(
            text,
            "error: pipeline failed\n  note: stage: lowering\n  note: pass: tile-legalize"
        );
    }
}
