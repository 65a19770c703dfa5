//! Port contract for the tracker board and research repository.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::pipeline::domain::{
    ArtifactFile, ArtifactKind, CommitId, Idea, IdeaId, PipelineDomainError, Points, Review, Stage,
    VersionToken,
};

/// Result alias for board operations.
pub type BoardResult<T> = Result<T, BoardError>;

/// Errors surfaced by board adapters.
#[derive(Debug, Clone, Error)]
pub enum BoardError {
    /// The idea does not exist on the board.
    #[error("idea {0} was not found on the board")]
    IdeaNotFound(IdeaId),

    /// An idea with the same identifier already exists.
    #[error("idea {0} already exists on the board")]
    DuplicateIdea(IdeaId),

    /// The supplied version token no longer matches the stored state.
    #[error("stale version for idea {idea}: supplied {supplied}, current {current}")]
    Conflict {
        /// Idea whose write was rejected.
        idea: IdeaId,
        /// Token the caller supplied.
        supplied: VersionToken,
        /// Token of the state currently stored.
        current: VersionToken,
    },

    /// The board throttled the request and signalled when to retry.
    #[error("rate limited during {operation}; retry after {retry_after:?}")]
    RateLimited {
        /// Operation that was throttled.
        operation: String,
        /// Delay the board asked the caller to honour.
        retry_after: Duration,
    },

    /// The board rejected the caller's credentials.
    #[error("board access denied: {reason}")]
    AccessDenied {
        /// Reason reported by the board.
        reason: String,
    },

    /// The requested artifact is not bound to the idea.
    #[error("artifact {kind} for idea {idea} is not bound")]
    ArtifactMissing {
        /// Idea the artifact was requested for.
        idea: IdeaId,
        /// Requested artifact category.
        kind: ArtifactKind,
    },

    /// A domain rule rejected the recorded event.
    #[error(transparent)]
    Domain(#[from] PipelineDomainError),

    /// The board returned a payload that could not be decoded.
    #[error("failed to decode board response: {reason}")]
    Decode {
        /// Description of the decoding failure.
        reason: String,
    },

    /// The board answered with an unexpected status.
    #[error("board request failed with status {status}: {reason}")]
    Upstream {
        /// HTTP status code returned by the board.
        status: u16,
        /// Response body or status text.
        reason: String,
    },

    /// The adapter's shared state lock was poisoned.
    #[error("board state lock was poisoned")]
    LockPoisoned,

    /// The underlying transport failed.
    #[error("board persistence failed: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl BoardError {
    /// Wraps an arbitrary transport error as a persistence failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// An idea snapshot paired with the optimistic-concurrency token that
/// guards writes against it.
#[derive(Debug, Clone)]
pub struct VersionedIdea {
    /// The idea state as read from the board.
    pub idea: Idea,
    /// Token to present with the next conditional write.
    pub version: VersionToken,
}

/// Receipt returned after a review is appended.
#[derive(Debug, Clone)]
pub struct ReviewReceipt {
    /// New point total for the reviewed category.
    pub total: Points,
    /// Version token of the updated idea.
    pub version: VersionToken,
    /// Whether the review triggered a clarification reset.
    pub reset: bool,
}

/// Request to commit artifact files for an idea.
#[derive(Debug, Clone)]
pub struct CommitRequest {
    idea: IdeaId,
    version: VersionToken,
    kind: ArtifactKind,
    files: Vec<ArtifactFile>,
    message: String,
    committed_at: DateTime<Utc>,
}

impl CommitRequest {
    /// Creates a commit request after validating message and file list.
    ///
    /// File paths are relative to the artifact's conventional directory;
    /// the board resolves them against the repository layout.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::EmptyCommitMessage`] when the
    /// message is empty after trimming and
    /// [`PipelineDomainError::EmptyCommit`] when no files are supplied.
    pub fn new(
        idea: IdeaId,
        version: VersionToken,
        kind: ArtifactKind,
        files: Vec<ArtifactFile>,
        message: &str,
        committed_at: DateTime<Utc>,
    ) -> Result<Self, PipelineDomainError> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(PipelineDomainError::EmptyCommitMessage);
        }
        if files.is_empty() {
            return Err(PipelineDomainError::EmptyCommit { idea });
        }
        Ok(Self {
            idea,
            version,
            kind,
            files,
            message: trimmed.to_owned(),
            committed_at,
        })
    }

    /// Returns the idea the commit is addressed to.
    #[must_use]
    pub const fn idea(&self) -> &IdeaId {
        &self.idea
    }

    /// Returns the version token guarding the write.
    #[must_use]
    pub const fn version(&self) -> &VersionToken {
        &self.version
    }

    /// Returns the artifact category being committed.
    #[must_use]
    pub const fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Returns the files carried by the commit.
    #[must_use]
    pub fn files(&self) -> &[ArtifactFile] {
        &self.files
    }

    /// Returns the commit message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the instant the commit was assembled.
    #[must_use]
    pub const fn committed_at(&self) -> DateTime<Utc> {
        self.committed_at
    }
}

/// Receipt returned after artifact files are committed.
#[derive(Debug, Clone)]
pub struct CommitReceipt {
    /// Identifier of the recorded commit.
    pub commit: CommitId,
    /// Repository directory the files were committed under.
    pub location: String,
    /// Version token of the updated idea.
    pub version: VersionToken,
}

/// Repository abstraction over the tracker board and the research
/// repository behind it.
///
/// Every write that mutates an idea takes the version token from a prior
/// read; adapters reject stale tokens with [`BoardError::Conflict`] and
/// never merge concurrent writes. Semantic gate checks happen in the
/// domain before a write is issued; adapters enforce only version
/// freshness.
#[async_trait]
pub trait BoardRepository: Send + Sync {
    /// Lists ideas, optionally restricted to a single stage.
    async fn list_ideas(&self, stage: Option<Stage>) -> BoardResult<Vec<VersionedIdea>>;

    /// Fetches one idea by identifier.
    async fn get_idea(&self, id: &IdeaId) -> BoardResult<VersionedIdea>;

    /// Registers a new idea and returns its initial version token.
    async fn register_idea(&self, idea: &Idea) -> BoardResult<VersionToken>;

    /// Replaces an idea's state conditionally on the supplied version.
    async fn update_idea(
        &self,
        id: &IdeaId,
        version: &VersionToken,
        idea: &Idea,
    ) -> BoardResult<VersionToken>;

    /// Appends a review: records the review file, folds the given weight
    /// into the target category's score, and applies any clarification
    /// reset, all as one conditional write.
    async fn append_review(
        &self,
        id: &IdeaId,
        version: &VersionToken,
        review: &Review,
        weight: Points,
    ) -> BoardResult<ReviewReceipt>;

    /// Commits artifact files and binds the resulting artifact reference
    /// to the idea as one conditional write.
    async fn commit_artifacts(&self, request: &CommitRequest) -> BoardResult<CommitReceipt>;

    /// Reads the primary content of a bound artifact.
    async fn read_artifact(&self, id: &IdeaId, kind: ArtifactKind) -> BoardResult<String>;

    /// Attaches a free-form note to the idea's tracker issue.
    async fn annotate(&self, id: &IdeaId, note: &str) -> BoardResult<()>;
}
