//! Pipeline registry
//!
//! The external description a schedule is built from: an ordered sequence
//! of stage descriptors, each naming the stage, its legal jump targets,
//! and its pass list. The registry is consumed whole at schedule
//! construction; stages cannot be added to a built schedule.

use crate::pass::Pass;

/// One stage in the pipeline description.
pub struct StageDescriptor {
    /// Unique stage name.
    pub name: String,
    /// Marker names this stage may jump on, in resolution priority order.
    /// Each must match a declared stage name somewhere in the registry.
    pub jump_targets: Vec<String>,
    /// Ordered pass list for the stage.
    pub passes: Vec<Box<dyn Pass>>,
}

/// Ordered collection of stage descriptors. Declaration order is the
/// schedule's default stage order.
#[derive(Default)]
pub struct PipelineRegistry {
    stages: Vec<StageDescriptor>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stage. Jump targets may reference stages registered
    /// later; they are resolved at schedule construction.
    pub fn register_stage<N, T>(
        &mut self,
        name: N,
        jump_targets: impl IntoIterator<Item = T>,
        passes: Vec<Box<dyn Pass>>,
    ) -> &mut Self
    where
        N: Into<String>,
        T: Into<String>,
    {
        self.stages.push(StageDescriptor {
            name: name.into(),
            jump_targets: jump_targets.into_iter().map(Into::into).collect(),
            passes,
        });
        self
    }

    /// Declared stage names, in registration order.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub(crate) fn into_stages(self) -> Vec<StageDescriptor> {
        self.stages
    }
}

impl std::fmt::Debug for PipelineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRegistry")
            .field("stages", &self.stages.iter().map(|s| &s.name).collect::<Vec<_>>())
            .finish()
    }
}
