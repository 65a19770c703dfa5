//! Effects produced by task handlers.

use crate::pipeline::domain::{ArtifactFile, ArtifactKind, IdeaId, Review, Stage};

use super::task::Task;

/// One board mutation a completed task asks for.
///
/// Handlers never touch the board directly; they return an effect and
/// the orchestrator applies it under the idea's version token, retrying
/// on conflict. Keeping effects as data keeps handlers pure and makes
/// every write path go through the same conflict handling.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEffect {
    /// Register a brand-new idea in the backlog.
    RegisterIdea {
        /// Identifier for the new idea.
        id: IdeaId,
        /// Idea title.
        title: String,
        /// One-paragraph summary recorded as a tracker note.
        summary: String,
    },

    /// Commit artifact files and bind the result to the idea.
    CommitArtifact {
        /// Artifact category being committed.
        kind: ArtifactKind,
        /// Files to write, relative to the artifact directory.
        files: Vec<ArtifactFile>,
        /// Commit message.
        message: String,
    },

    /// Append a review to the idea's reviewed artifact.
    AppendReview {
        /// The review to record.
        review: Review,
    },

    /// Move the idea one stage forward.
    AdvanceStage {
        /// Stage the idea occupied when the task was selected.
        from: Stage,
        /// Stage to enter.
        to: Stage,
    },

    /// Mark the idea's paper references as validated.
    MarkValidated,
}

/// Outcome of one successfully executed task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    task: Task,
    effect: TaskEffect,
}

impl TaskResult {
    /// Pairs a task with the effect it produced.
    #[must_use]
    pub const fn new(task: Task, effect: TaskEffect) -> Self {
        Self { task, effect }
    }

    /// Returns the task that produced the effect.
    #[must_use]
    pub const fn task(&self) -> &Task {
        &self.task
    }

    /// Returns the requested board mutation.
    #[must_use]
    pub const fn effect(&self) -> &TaskEffect {
        &self.effect
    }

    /// Consumes the result, returning the task and effect.
    #[must_use]
    pub fn into_parts(self) -> (Task, TaskEffect) {
        (self.task, self.effect)
    }
}
