//! In-memory coordination adapter for tests.

mod coordination;

pub use coordination::InMemoryRunCoordination;
