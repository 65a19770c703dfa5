//! Port contracts for the scheduling engine.
//!
//! Ports define infrastructure-agnostic interfaces used by engine
//! services: handler dispatch, text generation, and the run lock and
//! checkpoint storage that coordinate runs.

pub mod generation;
pub mod handler;
pub mod run_coordination;

pub use generation::TextGenerator;
pub use handler::{HandlerContext, TaskHandler};
pub use run_coordination::{
    CheckpointRepository, CoordinationError, CoordinationResult, RunLockRepository,
};
