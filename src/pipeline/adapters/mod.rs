//! Board adapters for the research pipeline.
//!
//! This module provides concrete implementations of the
//! [`BoardRepository`] port, following hexagonal architecture principles.
//! Adapters handle all transport and storage concerns while the domain
//! remains pure.
//!
//! # Available Adapters
//!
//! - [`memory::InMemoryBoard`]: Thread-safe in-memory board for unit
//!   testing, with scriptable rate limiting
//! - [`rest::RestBoard`]: HTTP client for a hosted tracker exposing
//!   version-guarded writes
//!
//! [`BoardRepository`]: crate::pipeline::ports::board::BoardRepository

pub mod memory;
pub mod rest;
