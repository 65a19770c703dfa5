//! Model catalogue and inference access for Vasari.
//!
//! This module owns everything about language models: the catalogue of
//! candidates with their size, tags, and availability; the selection
//! policy that ranks candidates under the local parameter ceiling; and
//! the provider service that loads a model and runs generation with
//! fallback across candidates. The module follows hexagonal architecture:
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
