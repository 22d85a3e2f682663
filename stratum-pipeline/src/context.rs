//! Compiler context facade
//!
//! The outward-facing entry point: owns one schedule and one diagnostics
//! engine, and runs the whole pipeline over a caller-owned module. Two
//! concurrent runs need two contexts; nothing here is process-wide.

use crate::error::{CompilerError, PipelineError};
use crate::registry::PipelineRegistry;
use crate::schedule::Schedule;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use stratum_config::Settings;
use stratum_ir::{DiagnosticEngine, Module};

pub struct CompilerContext {
    schedule: Schedule,
    diagnostics: Arc<DiagnosticEngine>,
    print_sink: Mutex<Box<dyn Write + Send>>,
}

impl CompilerContext {
    /// Build a context from a pipeline description. Selective IR prints go
    /// to stderr; use [`CompilerContext::with_print_sink`] to redirect.
    pub fn new(registry: PipelineRegistry, settings: Settings) -> Result<Self, PipelineError> {
        Self::with_print_sink(registry, settings, Box::new(io::stderr()))
    }

    /// Build a context that sends selective IR prints to `print_sink`.
    pub fn with_print_sink(
        registry: PipelineRegistry,
        settings: Settings,
        print_sink: Box<dyn Write + Send>,
    ) -> Result<Self, PipelineError> {
        let schedule = Schedule::from_registry(registry, &settings)?;
        Ok(Self {
            schedule,
            diagnostics: Arc::new(DiagnosticEngine::new()),
            print_sink: Mutex::new(print_sink),
        })
    }

    /// The diagnostics engine passes raise records through.
    pub fn diagnostics(&self) -> &Arc<DiagnosticEngine> {
        &self.diagnostics
    }

    /// Run the whole pipeline over the module.
    ///
    /// On success the module reflects every stage's mutations and nothing
    /// is reported. On failure the run is all-or-nothing: every buffered
    /// error diagnostic (notes included) plus a dump of the module's
    /// current, partially mutated state is assembled into one fatal
    /// [`CompilerError`]. The buffering handler is installed only for the
    /// duration of this call and detaches on every exit path.
    pub fn run(&self, module: &mut Module) -> Result<(), CompilerError> {
        let guard = self.diagnostics.buffer_errors();

        let result = {
            let mut sink = self.print_sink.lock().expect("print sink lock");
            self.schedule.run(module, &self.diagnostics, &mut **sink)
        };

        match result {
            Ok(()) => Ok(()),
            Err(error) => {
                let mut report = error.to_string();
                let transcript = guard.transcript();
                if !transcript.is_empty() {
                    report.push('\n');
                    report.push_str(&transcript);
                }
                report.push('\n');
                report.push_str(&module.to_text());
                Err(CompilerError::PipelineFailed { report })
            }
        }
    }
}

impl std::fmt::Debug for CompilerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilerContext")
            .field("schedule", &self.schedule)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}
