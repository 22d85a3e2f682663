//! A named, ordered group of passes with jump wiring
//!
//! Stages are built once by the schedule and never mutated afterwards.
//! The run-time options fan out uniformly to every pass in the stage:
//! verification, statistics, timings, and IR tracing all apply per pass.

use crate::error::{PassError, PipelineError};
use crate::pass::{Pass, PassContext};
use std::io::Write;
use std::time::Instant;
use stratum_config::Settings;
use stratum_ir::Module;

/// Index of a stage in its schedule's arena.
///
/// Jump edges and default-next links are stored as ids rather than
/// references so backward edges (cycles) need no special handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageId(pub(crate) usize);

pub struct Stage {
    name: String,
    passes: Vec<Box<dyn Pass>>,
    /// Declared jump edges, in resolution priority order.
    jumps: Vec<(String, StageId)>,
    next: Option<StageId>,
    settings: Settings,
}

impl Stage {
    pub(crate) fn new(name: String, passes: Vec<Box<dyn Pass>>, settings: Settings) -> Self {
        Self {
            name,
            passes,
            jumps: Vec::new(),
            next: None,
            settings,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn add_jump(&mut self, marker: String, target: StageId) {
        debug_assert!(!marker.is_empty());
        self.jumps.push((marker, target));
    }

    /// Wire the default successor. Set exactly once, at construction.
    pub(crate) fn set_next_stage(&mut self, next: StageId) {
        debug_assert!(self.next.is_none());
        self.next = Some(next);
    }

    /// Scan the declared jump edges in declaration order and return the
    /// first whose marker name is among `candidates`, along with the
    /// matched name. Declaration order, not candidate order, breaks ties.
    pub fn get_jump(&self, candidates: &[String]) -> Option<(StageId, &str)> {
        for (marker, target) in &self.jumps {
            if candidates.iter().any(|c| c == marker) {
                return Some((*target, marker.as_str()));
            }
        }
        None
    }

    /// The statically wired default successor, absent for the last stage.
    pub fn get_next_stage(&self) -> Option<StageId> {
        self.next
    }

    /// Run the stage's passes in order against the module.
    ///
    /// The first pass failure (or post-pass verification failure) stops
    /// the stage; later passes do not run.
    pub(crate) fn run(
        &self,
        module: &mut Module,
        ctx: &PassContext<'_>,
        print_sink: &mut dyn Write,
    ) -> Result<(), PipelineError> {
        let _span = tracing::debug_span!(
            target: "stratum::stage",
            "stage",
            name = self.name.as_str()
        )
        .entered();

        let printing = self.settings.ir_printing.as_ref();
        for pass in &self.passes {
            let name = pass.name();
            let _pass_span =
                tracing::debug_span!(target: "stratum::stage", "pass", name = name).entered();

            // Change detection for print-after needs the pre-pass text.
            let wants_before = printing.map(|p| p.wants_before(name)).unwrap_or(false);
            let wants_after = printing.map(|p| p.wants_after(name)).unwrap_or(false);
            let before = (wants_before || wants_after).then(|| module.to_text());
            if wants_before {
                if let Some(text) = &before {
                    print_ir(print_sink, "before", name, text);
                }
            }

            let started = self.settings.pass_timings.then(Instant::now);
            pass.run(module, ctx)
                .map_err(|source| self.pass_failed(name, source))?;

            if let Some(started) = started {
                tracing::debug!(
                    target: "stratum::stage",
                    pass = name,
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "pass timing"
                );
            }
            if self.settings.pass_statistics {
                let mut ops = 0usize;
                module.walk(|_| ops += 1);
                tracing::debug!(
                    target: "stratum::stage",
                    pass = name,
                    ops,
                    markers = module.markers.names().len(),
                    "pass statistics"
                );
            }

            if self.settings.verify {
                module
                    .verify()
                    .map_err(|source| PipelineError::VerificationFailed {
                        stage: self.name.clone(),
                        pass: name.to_string(),
                        source,
                    })?;
            }

            if self.settings.ir_dump_stderr {
                eprintln!("// -----// IR after pass '{}' //----- //\n{}", name, module);
            }
            if wants_after {
                let after = module.to_text();
                if before.as_deref() != Some(after.as_str()) {
                    print_ir(print_sink, "after", name, &after);
                }
            }
        }
        Ok(())
    }

    fn pass_failed(&self, pass: &str, source: PassError) -> PipelineError {
        PipelineError::PassFailed {
            stage: self.name.clone(),
            pass: pass.to_string(),
            source,
        }
    }
}

fn print_ir(sink: &mut dyn Write, when: &str, pass: &str, text: &str) {
    if let Err(error) = writeln!(sink, "// -----// IR {} pass '{}' //----- //\n{}", when, pass, text) {
        tracing::warn!(target: "stratum::print", %error, "failed to write IR print");
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("passes", &self.passes.len())
            .field("jumps", &self.jumps)
            .field("next", &self.next)
            .finish()
    }
}
