//! Error types for pipeline domain validation.

use thiserror::Error;

use super::artifact::ArtifactKind;
use super::ids::IdeaId;
use super::points::Points;
use super::stage::Stage;

/// Errors raised by pipeline domain validation and state transitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineDomainError {
    /// The idea identifier was empty after trimming.
    #[error("idea identifier must not be empty")]
    EmptyIdeaId,

    /// The idea identifier exceeded the maximum slug length.
    #[error("idea identifier is {length} characters long, exceeding the maximum of {max}")]
    IdeaIdTooLong {
        /// Number of characters in the rejected identifier.
        length: usize,
        /// Maximum permitted number of characters.
        max: usize,
    },

    /// The idea identifier contained characters outside the slug charset.
    #[error("idea identifier {actual:?} must contain only lowercase letters, digits, and interior hyphens")]
    InvalidIdeaId {
        /// The rejected identifier value.
        actual: String,
    },

    /// The idea title was empty after trimming.
    #[error("idea title must not be empty")]
    EmptyIdeaTitle,

    /// The review grade fell outside the accepted range.
    #[error("review grade {actual} is outside the accepted range 1..=10")]
    InvalidReviewGrade {
        /// The rejected grade value.
        actual: u8,
    },

    /// The review author name was empty after trimming.
    #[error("review author name must not be empty")]
    EmptyReviewAuthor,

    /// The review body was empty after trimming.
    #[error("review body must not be empty")]
    EmptyReviewBody,

    /// A decimal points value could not be represented in half-point units.
    #[error("points value {value} is not a non-negative multiple of 0.5")]
    InvalidPointsValue {
        /// The rejected decimal value.
        value: f64,
    },

    /// An artifact file path was empty after trimming.
    #[error("artifact file path must not be empty")]
    EmptyArtifactPath,

    /// An artifact file path escaped the artifact directory.
    #[error("artifact file path {actual:?} must be relative and must not traverse upwards")]
    InvalidArtifactPath {
        /// The rejected path value.
        actual: String,
    },

    /// A commit message was empty after trimming.
    #[error("commit message must not be empty")]
    EmptyCommitMessage,

    /// A commit request carried no files.
    #[error("commit for idea {idea} contains no files")]
    EmptyCommit {
        /// Idea the commit was addressed to.
        idea: IdeaId,
    },

    /// A stage transition skipped a stage or moved backwards.
    #[error("idea {idea} cannot move from {from} to {to}: stages advance one step at a time")]
    StageNotAdjacent {
        /// Idea whose transition was rejected.
        idea: IdeaId,
        /// Stage the idea currently occupies.
        from: Stage,
        /// Stage the transition requested.
        to: Stage,
    },

    /// A stage transition was attempted before the review gate was met.
    #[error("idea {idea} has {have} {gate} points but entering {to} requires {need}")]
    GateNotMet {
        /// Idea whose transition was rejected.
        idea: IdeaId,
        /// Artifact category whose accumulated points gate the transition.
        gate: ArtifactKind,
        /// Stage the transition requested.
        to: Stage,
        /// Points accumulated so far.
        have: Points,
        /// Points required to enter the stage.
        need: Points,
    },

    /// A transition into the terminal stage lacked a bound paper artifact.
    #[error("idea {idea} cannot enter the done stage without a bound paper artifact")]
    PaperMissing {
        /// Idea whose transition was rejected.
        idea: IdeaId,
    },

    /// A reset was attempted on an idea that already reached the terminal stage.
    #[error("idea {idea} is done and can no longer be reset")]
    IdeaAlreadyDone {
        /// Idea the reset was addressed to.
        idea: IdeaId,
    },
}
