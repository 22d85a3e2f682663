//! Stratum Pipeline
//!
//! Staged pass scheduling with marker-driven jumps.
//!
//! A pipeline is described up front as an ordered sequence of named
//! stages, each carrying a pass list and a set of legal jump targets
//! ([`PipelineRegistry`]). Construction wires the description into a
//! [`Schedule`]: an arena of [`Stage`]s where every stage knows its
//! default successor and its resolved jump edges. Execution walks the
//! arena stage by stage; after each stage the markers passes left on the
//! module decide whether control falls through or jumps, backward edges
//! included.
//!
//! [`CompilerContext`] is the facade external callers use: it owns the
//! schedule and a diagnostics engine, and turns any failure anywhere in
//! the run into one fatal error carrying the aggregated diagnostic
//! transcript and a dump of the module.

pub mod context;
pub mod error;
pub mod pass;
pub mod passes;
pub mod registry;
pub mod schedule;
pub mod stage;

pub use context::CompilerContext;
pub use error::{CompilerError, PassError, PipelineError};
pub use pass::{Pass, PassContext};
pub use passes::{FailPass, MarkerPass, NoOpPass, RenameDialectPass, StripAttrPass};
pub use registry::{PipelineRegistry, StageDescriptor};
pub use schedule::Schedule;
pub use stage::{Stage, StageId};

// The IR crate is half of this crate's vocabulary; re-export it the way
// the config types are re-exported so callers need one dependency.
pub use stratum_config::{IrPrintingConfig, Settings};
pub use stratum_ir as ir;
