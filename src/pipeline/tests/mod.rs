//! Unit tests for the pipeline module.
//!
//! Tests are organised by concern: domain rules for ideas, reviews, and
//! stage gates; the in-memory board adapter; and the state store's
//! review weighing and rate-limit retry behaviour.

mod store_tests;
