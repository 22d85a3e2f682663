//! Error types for the pipeline engine

use stratum_ir::VerifyError;
use thiserror::Error;

/// Error type for pass components.
///
/// Passes are opaque: from the engine's point of view they either succeed
/// or fail, and these variants only shape the failure message. Anything a
/// human should read belongs in a diagnostic, not in the error.
#[derive(Error, Debug)]
pub enum PassError {
    #[error("precondition violated: {message}")]
    Precondition { message: String },

    #[error("transform failed: {0}")]
    TransformFailed(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Main pipeline error type, covering schedule construction and execution.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("empty pipeline description")]
    EmptyPipeline,

    #[error("duplicate stage name '{name}'")]
    DuplicateStage { name: String },

    #[error("stage '{stage}' declares a jump to unknown stage '{target}'")]
    UnknownJumpTarget { stage: String, target: String },

    #[error("pass '{pass}' failed in stage '{stage}': {source}")]
    PassFailed {
        stage: String,
        pass: String,
        #[source]
        source: PassError,
    },

    #[error("verification failed after pass '{pass}' in stage '{stage}': {source}")]
    VerificationFailed {
        stage: String,
        pass: String,
        #[source]
        source: VerifyError,
    },

    #[error("stage transition limit of {limit} exceeded entering stage '{stage}' (jump cycle?)")]
    TransitionLimit { limit: usize, stage: String },
}

/// The single fatal error a compiler context run can produce.
///
/// No partial-success path exists: either every reached stage succeeded,
/// or the caller gets this, carrying the full aggregated transcript plus a
/// dump of the partially mutated module.
#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("pipeline failed\n{report}")]
    PipelineFailed { report: String },
}
