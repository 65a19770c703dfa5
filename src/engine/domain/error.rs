//! Error type for task execution.

use thiserror::Error;

use crate::model::services::ProviderError;
use crate::pipeline::domain::PipelineDomainError;

use super::task::TaskId;

/// Errors raised while a handler executes one task.
///
/// Validation failures describe output the handler could not accept;
/// they are never retried within a run. Generation failures carry the
/// provider's diagnosis and may succeed on a later run.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Generated or analysed output failed the handler's checks.
    #[error("validation failed: {reason}")]
    Validation {
        /// What the handler rejected.
        reason: String,
    },

    /// The model provider could not produce text.
    #[error(transparent)]
    Generation(#[from] ProviderError),

    /// The task was built without the target it needs.
    #[error("task {task} lacks its target")]
    MissingTarget {
        /// Identifier of the malformed task.
        task: TaskId,
    },

    /// The execution context lacked the project state the task needs.
    #[error("task {task} was executed without its project state")]
    MissingState {
        /// Identifier of the affected task.
        task: TaskId,
    },

    /// A prompt template failed to render.
    #[error("prompt template {name} failed to render: {reason}")]
    Template {
        /// Template the handler tried to render.
        name: String,
        /// Rendering failure description.
        reason: String,
    },

    /// A domain rule rejected the handler's output.
    #[error(transparent)]
    Domain(#[from] PipelineDomainError),
}

impl TaskError {
    /// Reports whether the failure should mark the idea on the board.
    ///
    /// Validation failures and exhausted generation budgets are sticky
    /// conditions a later run would hit again, so the idea gets a
    /// failure label that suppresses reselection until an operator
    /// clears it. Transient conditions leave no mark.
    #[must_use]
    pub const fn marks_idea(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::Generation(
                    ProviderError::AttemptsExhausted { .. } | ProviderError::NoEligibleModel { .. }
                )
        )
    }
}
