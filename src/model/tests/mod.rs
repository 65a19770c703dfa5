//! Unit tests for the model module.
//!
//! Tests are organised by concern: domain validation for identifiers,
//! sizes, and requests; and the provider service's ranking, ceiling, and
//! fallback behaviour.

mod domain_tests;
mod provider_tests;
