//! Engine services: analysis, selection, execution, and the run loop.

mod analyzer;
mod executor;
mod orchestrator;
mod selector;

pub use analyzer::StateAnalyzer;
pub use executor::TaskExecutor;
pub use orchestrator::{Orchestrator, OrchestratorError};
pub use selector::TaskSelector;
