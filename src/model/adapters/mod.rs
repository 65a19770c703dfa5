//! Catalogue adapters for the model context.
//!
//! This module provides concrete implementations of the [`ModelCatalog`]
//! port, following hexagonal architecture principles. Adapters handle all
//! transport concerns while the domain remains pure.
//!
//! # Available Adapters
//!
//! - [`memory::StaticCatalog`]: In-memory catalogue with scripted
//!   generation outcomes for unit testing
//! - [`rest::ManifestCatalog`]: HTTP client for a model manifest and its
//!   inference endpoint
//!
//! [`ModelCatalog`]: crate::model::ports::catalog::ModelCatalog

pub mod memory;
pub mod rest;
