//! Error types for model catalogue domain validation.

use thiserror::Error;

/// Errors raised by model catalogue domain validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelDomainError {
    /// The model identifier was empty after trimming.
    #[error("model identifier must not be empty")]
    EmptyModelId,

    /// The model identifier exceeded the maximum length.
    #[error("model identifier is {length} characters long, exceeding the maximum of {max}")]
    ModelIdTooLong {
        /// Number of characters in the rejected identifier.
        length: usize,
        /// Maximum permitted number of characters.
        max: usize,
    },

    /// The model identifier contained characters outside the permitted set.
    #[error(
        "model identifier {actual:?} must contain only alphanumerics and `.`, `-`, `_`, `/`, `:`"
    )]
    InvalidModelId {
        /// The rejected identifier value.
        actual: String,
    },

    /// A parameter count of zero was supplied.
    #[error("model parameter count must be positive")]
    ZeroParamCount,

    /// The generation prompt was empty after trimming.
    #[error("generation prompt must not be empty")]
    EmptyPrompt,

    /// A generation request asked for zero output tokens.
    #[error("generation request must allow at least one output token")]
    ZeroMaxTokens,
}
