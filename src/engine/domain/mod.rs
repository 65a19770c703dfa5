//! Domain model for the scheduling engine.
//!
//! The engine domain models schedulable work: the closed set of task
//! kinds, the per-idea project state the selector reads, the effects
//! handlers produce, and the lifecycle of one run from lock acquisition
//! to report. Board access and inference stay behind ports.

mod effect;
mod error;
mod project_state;
mod run;
mod task;

pub use effect::{TaskEffect, TaskResult};
pub use error::TaskError;
pub use project_state::{ProjectState, UnreviewedArtifact};
pub use run::{
    Checkpoint, RunLock, RunOutcome, RunPhase, RunPolicy, RunReport, TaskDisposition, TaskRecord,
};
pub use task::{Task, TaskId, TaskKind};
