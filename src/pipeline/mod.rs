//! Research pipeline state for Vasari.
//!
//! This module owns the idea lifecycle: staged progression across the
//! tracker board, review scoring against stage gates, and artifact commits
//! into the research repository. The module follows hexagonal architecture:
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
