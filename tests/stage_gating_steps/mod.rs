//! Step definitions for stage gating behaviour scenarios.

pub mod world;

pub mod given;
pub mod then;
pub mod when;
