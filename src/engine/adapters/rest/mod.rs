//! REST coordination adapter for a hosted tracker.

mod coordination;
mod dto;

pub use coordination::RestRunCoordination;
