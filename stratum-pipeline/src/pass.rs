//! Pass trait and per-run pass context
//!
//! A pass is an opaque transformation unit: it mutates the module in place
//! and reports success or failure. Its only other legal side effects are
//! diagnostics raised through the context and markers written on the
//! module's marker set.

use crate::error::PassError;
use stratum_ir::{DiagnosticEngine, Module};

/// Trait for pipeline passes.
pub trait Pass: Send + Sync {
    /// Pass name, used for logging, IR-print allow-lists, and reports.
    fn name(&self) -> &str;

    /// Run the pass on the given module.
    fn run(&self, module: &mut Module, ctx: &PassContext<'_>) -> Result<(), PassError>;
}

/// Context handed to every pass invocation.
pub struct PassContext<'a> {
    diagnostics: &'a DiagnosticEngine,
    serialized: bool,
}

impl<'a> PassContext<'a> {
    pub(crate) fn new(diagnostics: &'a DiagnosticEngine, serialized: bool) -> Self {
        Self {
            diagnostics,
            serialized,
        }
    }

    /// The diagnostics engine for this run.
    pub fn diagnostics(&self) -> &DiagnosticEngine {
        self.diagnostics
    }

    /// Whether IR tracing has downgraded the run to serialized execution.
    ///
    /// Stages themselves are always sequential; this flag tells a pass
    /// with internal parallelism that it must not use it, because tracing
    /// output ordering is only meaningful under serialization.
    pub fn serialized(&self) -> bool {
        self.serialized
    }
}
