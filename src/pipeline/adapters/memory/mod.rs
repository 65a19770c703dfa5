//! In-memory board adapter for tests.

mod board;

pub use board::{CommitRecord, InMemoryBoard};
