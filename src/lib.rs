//! Vasari: task orchestration engine for a staged research pipeline.
//!
//! This crate drives research ideas across a staged board, from backlog
//! through review-gated stages to completion, by selecting the next
//! piece of work for each idea, generating artifacts with a local
//! language model, and committing the results to a hosted tracker under
//! optimistic concurrency.
//!
//! # Architecture
//!
//! Vasari follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (REST, in-memory)
//!
//! # Modules
//!
//! - [`pipeline`]: Ideas, stages, reviews, and the repository store
//! - [`model`]: Model catalogue, selection, and generation fallback
//! - [`engine`]: Task selection, handlers, and the run orchestrator
//! - [`config`]: Externally overridable limits and endpoints

pub mod config;
pub mod engine;
pub mod model;
pub mod pipeline;
