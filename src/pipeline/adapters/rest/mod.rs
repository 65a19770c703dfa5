//! REST board adapter for a hosted tracker.

mod board;
mod dto;

pub use board::RestBoard;
