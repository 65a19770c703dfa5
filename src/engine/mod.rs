//! Task orchestration engine for Vasari.
//!
//! This module owns the run loop that turns board state into work:
//! deriving project states, selecting tasks in priority order, executing
//! handlers against a text-generation backend, and committing effects
//! under version tokens with checkpoints for resumption. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
