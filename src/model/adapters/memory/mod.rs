//! In-memory catalogue adapter for tests.

mod catalog;

pub use catalog::{GenerationCall, ScriptedOutcome, StaticCatalog};
