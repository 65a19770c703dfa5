//! Port contracts for the model catalogue.
//!
//! Ports define infrastructure-agnostic interfaces used by the provider
//! service to list candidate models, load one for serving, and run
//! generation against the loaded session.

pub mod catalog;

pub use catalog::{CatalogError, CatalogResult, InferenceSession, ModelCatalog};
