//! Domain model for the model catalogue.
//!
//! The catalogue domain models candidate language models: their validated
//! identifiers, parameter counts, capability tags, and availability, plus
//! the generation request and response types the provider service works
//! with.

mod candidate;
mod error;
mod generation;

pub use candidate::{
    Availability, MAX_MODEL_ID_LENGTH, ModelCandidate, ModelId, ParamCount,
    ParseAvailabilityError,
};
pub use error::ModelDomainError;
pub use generation::{GeneratedText, GenerationRequest};
