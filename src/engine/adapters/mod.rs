//! Adapters for the scheduling engine.
//!
//! This module provides concrete implementations of the engine's ports,
//! following hexagonal architecture principles. Handlers live here
//! because they touch prompt templates and the generator; run
//! coordination has one adapter per transport.
//!
//! # Available Adapters
//!
//! - [`handlers::HandlerTable`]: Production handler per task kind
//! - [`generation::ProviderGenerator`]: Text generation through the
//!   catalogue-driven model provider
//! - [`memory::InMemoryRunCoordination`]: Thread-safe lock and
//!   checkpoint storage for unit testing
//! - [`rest::RestRunCoordination`]: HTTP client for the hosted
//!   tracker's coordination API

pub mod generation;
pub mod handlers;
pub mod memory;
pub mod rest;
