//! State store mediating every read and write against the board.
//!
//! The store wraps a [`BoardRepository`] with the behaviour all callers
//! rely on: human review weighing through the qualification policy,
//! rate-limit honouring with bounded retries, and small fetch-mutate-save
//! loops for label bookkeeping. Version conflicts are never resolved
//! here; they surface to the caller, which re-reads and re-validates
//! before retrying.

use std::future::Future;
use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::pipeline::domain::{
    ArtifactFile, ArtifactKind, Idea, IdeaId, PipelineDomainError, Points, Review, Stage,
    VersionToken, labels,
};
use crate::pipeline::ports::board::{
    BoardError, BoardRepository, BoardResult, CommitReceipt, CommitRequest, ReviewReceipt,
    VersionedIdea,
};
use crate::pipeline::ports::review_policy::HumanReviewPolicy;

/// Default number of attempts for a rate-limited operation before the
/// store gives up on it.
pub const DEFAULT_RATE_LIMIT_ATTEMPTS: u32 = 3;

const LABEL_CONFLICT_ATTEMPTS: u32 = 3;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the state store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The idea does not exist on the board.
    #[error("idea {0} was not found on the board")]
    IdeaNotFound(IdeaId),

    /// An idea with the same identifier already exists.
    #[error("idea {0} already exists on the board")]
    DuplicateIdea(IdeaId),

    /// A conditional write lost the race; re-read and retry.
    #[error("version conflict on idea {idea}")]
    Conflict {
        /// Idea whose write was rejected.
        idea: IdeaId,
    },

    /// Rate-limit retries were exhausted for one operation.
    #[error("rate limit budget exhausted after {attempts} attempts of {operation}")]
    RateLimitExhausted {
        /// Operation that kept being throttled.
        operation: String,
        /// Number of attempts made.
        attempts: u32,
    },

    /// The requested artifact is not bound to the idea.
    #[error("artifact {kind} for idea {idea} is not bound")]
    ArtifactMissing {
        /// Idea the artifact was requested for.
        idea: IdeaId,
        /// Requested artifact category.
        kind: ArtifactKind,
    },

    /// The board rejected the caller's credentials.
    #[error("board access denied: {reason}")]
    AccessDenied {
        /// Reason reported by the board.
        reason: String,
    },

    /// A domain rule rejected the recorded event.
    #[error(transparent)]
    Domain(#[from] PipelineDomainError),

    /// The board failed in a way the store does not interpret.
    #[error("board request failed: {0}")]
    Board(BoardError),
}

fn map_board_error(source: BoardError) -> StoreError {
    match source {
        BoardError::IdeaNotFound(id) => StoreError::IdeaNotFound(id),
        BoardError::DuplicateIdea(id) => StoreError::DuplicateIdea(id),
        BoardError::Conflict { idea, .. } => StoreError::Conflict { idea },
        BoardError::AccessDenied { reason } => StoreError::AccessDenied { reason },
        BoardError::ArtifactMissing { idea, kind } => StoreError::ArtifactMissing { idea, kind },
        BoardError::Domain(domain) => StoreError::Domain(domain),
        other => StoreError::Board(other),
    }
}

/// Store service owning board access for the whole engine.
#[derive(Debug)]
pub struct RepositoryStateStore<B, P, C> {
    board: Arc<B>,
    policy: Arc<P>,
    clock: Arc<C>,
    rate_limit_attempts: u32,
}

impl<B, P, C> RepositoryStateStore<B, P, C>
where
    B: BoardRepository,
    P: HumanReviewPolicy,
    C: Clock + Send + Sync,
{
    /// Creates a store over the given board, review policy, and clock.
    #[must_use]
    pub const fn new(board: Arc<B>, policy: Arc<P>, clock: Arc<C>) -> Self {
        Self {
            board,
            policy,
            clock,
            rate_limit_attempts: DEFAULT_RATE_LIMIT_ATTEMPTS,
        }
    }

    /// Overrides the number of attempts allowed for a rate-limited
    /// operation.
    #[must_use]
    pub const fn with_rate_limit_attempts(mut self, attempts: u32) -> Self {
        self.rate_limit_attempts = attempts;
        self
    }

    /// Lists ideas, optionally restricted to one stage.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the board cannot be read.
    pub async fn list_ideas(&self, stage: Option<Stage>) -> StoreResult<Vec<VersionedIdea>> {
        self.with_rate_limit_retries("list_ideas", || self.board.list_ideas(stage))
            .await
    }

    /// Fetches one idea with its version token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IdeaNotFound`] when the idea is unknown.
    pub async fn get_idea(&self, id: &IdeaId) -> StoreResult<VersionedIdea> {
        self.with_rate_limit_retries("get_idea", || self.board.get_idea(id))
            .await
    }

    /// Registers a new idea on the board.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateIdea`] when the identifier is taken.
    pub async fn register_idea(&self, idea: &Idea) -> StoreResult<VersionToken> {
        debug!(idea = %idea.id(), "registering idea");
        self.with_rate_limit_retries("register_idea", || self.board.register_idea(idea))
            .await
    }

    /// Saves an idea's state conditionally on the supplied version.
    ///
    /// Callers validate stage adjacency and gating through the domain
    /// before saving; the board checks version freshness only.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the version is stale.
    pub async fn save_idea(
        &self,
        id: &IdeaId,
        version: &VersionToken,
        idea: &Idea,
    ) -> StoreResult<VersionToken> {
        self.with_rate_limit_retries("update_idea", || self.board.update_idea(id, version, idea))
            .await
    }

    /// Appends a review, weighing it through the qualification policy.
    ///
    /// Model reviews always earn their weight; human reviews earn theirs
    /// only when the policy deems them substantive.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the version is stale and
    /// [`StoreError::RateLimitExhausted`] when throttling persisted
    /// beyond the retry budget.
    pub async fn append_review(
        &self,
        id: &IdeaId,
        version: &VersionToken,
        review: &Review,
    ) -> StoreResult<ReviewReceipt> {
        let weight = self.weigh(review);
        debug!(
            idea = %id,
            target = review.target().as_str(),
            author = %review.author(),
            weight = %weight,
            "appending review"
        );
        self.with_rate_limit_retries("append_review", || {
            self.board.append_review(id, version, review, weight)
        })
        .await
    }

    /// Commits artifact files for an idea and binds the result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Domain`] when the commit request fails
    /// validation and [`StoreError::Conflict`] when the version is stale.
    pub async fn commit_artifact(
        &self,
        id: &IdeaId,
        version: &VersionToken,
        kind: ArtifactKind,
        files: Vec<ArtifactFile>,
        message: &str,
    ) -> StoreResult<CommitReceipt> {
        let request = CommitRequest::new(
            id.clone(),
            version.clone(),
            kind,
            files,
            message,
            self.clock.utc(),
        )?;
        debug!(idea = %id, kind = kind.as_str(), "committing artifact");
        self.with_rate_limit_retries("commit_artifacts", || self.board.commit_artifacts(&request))
            .await
    }

    /// Reads the primary content of a bound artifact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ArtifactMissing`] when nothing is bound.
    pub async fn read_artifact(&self, id: &IdeaId, kind: ArtifactKind) -> StoreResult<String> {
        self.with_rate_limit_retries("read_artifact", || self.board.read_artifact(id, kind))
            .await
    }

    /// Attaches a free-form note to the idea's tracker issue.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the board rejects the note.
    pub async fn annotate(&self, id: &IdeaId, note: &str) -> StoreResult<()> {
        self.with_rate_limit_retries("annotate", || self.board.annotate(id, note))
            .await
    }

    /// Records a task failure: attaches the failure marker label and
    /// leaves a note explaining what went wrong.
    ///
    /// The marker keeps the selector from re-issuing the failed task kind
    /// for this idea until an operator clears it.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when neither the label nor the note could
    /// be recorded.
    pub async fn record_task_failure(
        &self,
        id: &IdeaId,
        kind_slug: &str,
        reason: &str,
    ) -> StoreResult<()> {
        warn!(idea = %id, kind = kind_slug, reason, "recording task failure");
        self.apply_label(id, &labels::task_failure(kind_slug)).await?;
        self.annotate(id, &format!("Task {kind_slug} failed: {reason}"))
            .await
    }

    /// Marks the idea's paper references as validated.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the marker could not be recorded.
    pub async fn mark_references_validated(&self, id: &IdeaId) -> StoreResult<()> {
        self.apply_label(id, labels::REFERENCES_VALIDATED).await
    }

    fn weigh(&self, review: &Review) -> Points {
        if review.author().is_human() && !self.policy.qualifies(review) {
            return Points::ZERO;
        }
        review.weight()
    }

    /// Fetch-mutate-save loop for label changes, retrying lost races a
    /// bounded number of times.
    async fn apply_label(&self, id: &IdeaId, label: &str) -> StoreResult<()> {
        let mut attempt: u32 = 1;
        loop {
            let mut fetched = self.get_idea(id).await?;
            if fetched.idea.has_label(label) {
                return Ok(());
            }
            fetched.idea.add_label(label, self.clock.utc());
            match self
                .save_idea(id, &fetched.version, &fetched.idea)
                .await
            {
                Ok(_) => return Ok(()),
                Err(StoreError::Conflict { .. }) if attempt < LABEL_CONFLICT_ATTEMPTS => {
                    debug!(idea = %id, label, attempt, "label write lost the race; retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Runs a board call, honouring rate-limit signals by sleeping
    /// exactly the requested delay, up to the configured attempt budget.
    async fn with_rate_limit_retries<T, F, Fut>(
        &self,
        operation: &str,
        mut call: F,
    ) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = BoardResult<T>>,
    {
        let mut attempt: u32 = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(BoardError::RateLimited { retry_after, .. }) => {
                    if attempt >= self.rate_limit_attempts {
                        return Err(StoreError::RateLimitExhausted {
                            operation: operation.to_owned(),
                            attempts: attempt,
                        });
                    }
                    warn!(
                        operation,
                        attempt,
                        retry_after = ?retry_after,
                        "board rate limited; honouring retry-after"
                    );
                    sleep(retry_after).await;
                    attempt += 1;
                }
                Err(other) => return Err(map_board_error(other)),
            }
        }
    }
}
