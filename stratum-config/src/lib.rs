//! Stratum Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Stratum
//! crates. Settings are passed by value into pipeline construction;
//! two compiler contexts with different settings can coexist freely.

use serde::Deserialize;
use std::collections::BTreeSet;

/// Run-time options applied uniformly to every pass in every stage.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Check the module's structural invariants after each pass.
    pub verify: bool,
    /// Collect per-pass statistics (accounting only, never alters outcomes).
    pub pass_statistics: bool,
    /// Record per-pass wall-clock timings (accounting only).
    pub pass_timings: bool,
    /// Dump the module to stderr after every pass. Forces serialized
    /// pass execution.
    pub ir_dump_stderr: bool,
    /// Selective before/after IR printing. Forces serialized pass execution.
    pub ir_printing: Option<IrPrintingConfig>,
    /// Upper bound on stage-to-stage transitions in one run. `None` means
    /// unbounded; a pipeline with a runaway jump cycle will then never
    /// terminate.
    pub max_stage_transitions: Option<usize>,
}

impl Settings {
    /// Whether the configured options require passes to run serialized.
    ///
    /// IR tracing output ordering is only meaningful when passes cannot
    /// overlap, so either printing option downgrades pass-internal
    /// parallelism for the whole run.
    pub fn serialize_passes(&self) -> bool {
        self.ir_dump_stderr || self.ir_printing.is_some()
    }
}

/// Allow-lists for selective IR printing.
///
/// The output sink is not part of this struct: sinks are live resources,
/// supplied separately when the compiler context is built.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IrPrintingConfig {
    /// Pass names to print the module before.
    pub print_before: BTreeSet<String>,
    /// Pass names to print the module after (only when it changed).
    pub print_after: BTreeSet<String>,
}

impl IrPrintingConfig {
    /// True when `name` is on the print-before list.
    pub fn wants_before(&self, name: &str) -> bool {
        self.print_before.contains(name)
    }

    /// True when `name` is on the print-after list.
    pub fn wants_after(&self, name: &str) -> bool {
        self.print_after.contains(name)
    }
}

/// Execution phase enum for phase-specific log targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Parse,
    Pipeline,
    Stage,
    Print,
}

impl Phase {
    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Parse => "parse",
            Phase::Pipeline => "pipeline",
            Phase::Stage => "stage",
            Phase::Print => "print",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("stratum::{}", self.as_str())
    }
}
