//! Schedule: the wired, ordered collection of all stages
//!
//! Built once from a [`PipelineRegistry`] and immutable afterwards. The
//! stage set is a directed graph, not a tree: jump edges may point at any
//! declared stage, backward included, so stages live in a `Vec` arena and
//! edges are [`StageId`] indices into it. Execution is an explicit loop,
//! never recursion, so arbitrarily long jump chains cannot grow the call
//! stack.

use crate::error::PipelineError;
use crate::pass::PassContext;
use crate::registry::PipelineRegistry;
use crate::stage::{Stage, StageId};
use std::collections::HashMap;
use std::io::Write;
use stratum_config::Settings;
use stratum_ir::{DiagnosticEngine, Module};

pub struct Schedule {
    /// All stages, in declaration order. The first is the start stage.
    stages: Vec<Stage>,
    max_transitions: Option<usize>,
    serialized: bool,
}

impl Schedule {
    /// Build a schedule from the pipeline description.
    ///
    /// Two phases: first every descriptor becomes a stage and default-next
    /// links are wired to the immediately following stage; then jump names
    /// are resolved, in a separate pass because a jump may reference a
    /// stage declared later. A duplicate stage name or a jump to a name no
    /// stage declares fails construction.
    pub fn from_registry(
        registry: PipelineRegistry,
        settings: &Settings,
    ) -> Result<Self, PipelineError> {
        let descriptors = registry.into_stages();
        if descriptors.is_empty() {
            return Err(PipelineError::EmptyPipeline);
        }

        let mut stages = Vec::with_capacity(descriptors.len());
        let mut ids_by_name: HashMap<String, StageId> = HashMap::new();
        let mut jump_lists = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            let id = StageId(stages.len());
            if ids_by_name.insert(descriptor.name.clone(), id).is_some() {
                return Err(PipelineError::DuplicateStage {
                    name: descriptor.name,
                });
            }
            stages.push(Stage::new(
                descriptor.name,
                descriptor.passes,
                settings.clone(),
            ));
            if id.0 > 0 {
                stages[id.0 - 1].set_next_stage(id);
            }
            jump_lists.push(descriptor.jump_targets);
        }

        for (index, jump_targets) in jump_lists.into_iter().enumerate() {
            for target in jump_targets {
                let target_id = ids_by_name.get(&target).copied().ok_or_else(|| {
                    PipelineError::UnknownJumpTarget {
                        stage: stages[index].name().to_string(),
                        target: target.clone(),
                    }
                })?;
                stages[index].add_jump(target, target_id);
            }
        }

        Ok(Self {
            stages,
            max_transitions: settings.max_stage_transitions,
            serialized: settings.serialize_passes(),
        })
    }

    /// Number of stages in the schedule.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in declaration order.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name())
    }

    /// Run the schedule over the module, stage by stage.
    ///
    /// After each successful stage the module's active markers are matched
    /// against the stage's declared jump edges; on a match, exactly the
    /// matched marker is cleared and control transfers to the jump target,
    /// otherwise to the default successor. The loop ends when a stage has
    /// no successor. The first stage failure aborts the run.
    pub fn run(
        &self,
        module: &mut Module,
        diagnostics: &DiagnosticEngine,
        print_sink: &mut dyn Write,
    ) -> Result<(), PipelineError> {
        let ctx = PassContext::new(diagnostics, self.serialized);
        let mut current = Some(StageId(0));
        let mut transitions = 0usize;

        while let Some(id) = current {
            let stage = &self.stages[id.0];
            tracing::debug!(target: "stratum::pipeline", stage = stage.name(), "running stage");
            stage.run(module, &ctx, print_sink)?;

            let active: Vec<String> = module.markers.names().to_vec();
            let next = match stage.get_jump(&active) {
                Some((target, matched)) => {
                    let matched = matched.to_string();
                    module.markers.clear(&matched);
                    tracing::debug!(
                        target: "stratum::pipeline",
                        from = stage.name(),
                        to = self.stages[target.0].name(),
                        marker = matched.as_str(),
                        "jump"
                    );
                    Some(target)
                }
                None => stage.get_next_stage(),
            };

            if let (Some(next), Some(limit)) = (next, self.max_transitions) {
                transitions += 1;
                if transitions > limit {
                    return Err(PipelineError::TransitionLimit {
                        limit,
                        stage: self.stages[next.0].name().to_string(),
                    });
                }
            }
            current = next;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schedule")
            .field("stages", &self.stages)
            .finish()
    }
}
