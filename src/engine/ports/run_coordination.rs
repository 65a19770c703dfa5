//! Port contracts for run locking and resume checkpoints.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::engine::domain::{Checkpoint, RunLock};

/// Result alias for coordination operations.
pub type CoordinationResult<T> = Result<T, CoordinationError>;

/// Errors surfaced by coordination adapters.
#[derive(Debug, Clone, Error)]
pub enum CoordinationError {
    /// Another run holds an unexpired lock.
    #[error("run lock is held by {holder}")]
    LockHeld {
        /// Identity of the run holding the lock.
        holder: String,
    },

    /// The adapter's shared state lock was poisoned.
    #[error("coordination state lock was poisoned")]
    LockPoisoned,

    /// The coordination store rejected the caller's credentials.
    #[error("coordination access denied: {reason}")]
    AccessDenied {
        /// Reason reported by the store.
        reason: String,
    },

    /// The store returned a payload that could not be decoded.
    #[error("failed to decode coordination response: {reason}")]
    Decode {
        /// Description of the decoding failure.
        reason: String,
    },

    /// The store answered with an unexpected status.
    #[error("coordination request failed with status {status}: {reason}")]
    Upstream {
        /// HTTP status code returned by the store.
        status: u16,
        /// Response body or status text.
        reason: String,
    },

    /// The underlying transport failed.
    #[error("coordination persistence failed: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl CoordinationError {
    /// Wraps an arbitrary transport error as a persistence failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// Advisory single-run lock storage.
///
/// The orchestrator builds the lock it wants to hold; the repository
/// stores it atomically. An existing lock blocks acquisition unless it
/// expired before the candidate was created, in which case the stale
/// lock is replaced.
#[async_trait]
pub trait RunLockRepository: Send + Sync {
    /// Stores the lock, failing when another holder's lock is live.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::LockHeld`] when an unexpired lock
    /// with a different holder exists.
    async fn acquire_lock(&self, lock: &RunLock) -> CoordinationResult<()>;

    /// Removes the lock if the stored holder matches.
    ///
    /// Releasing a lock that was already replaced or removed is not an
    /// error; the release simply has no effect.
    ///
    /// # Errors
    ///
    /// Returns a [`CoordinationError`] when the store cannot be
    /// reached.
    async fn release_lock(&self, lock: &RunLock) -> CoordinationResult<()>;
}

/// Resume checkpoint storage.
#[async_trait]
pub trait CheckpointRepository: Send + Sync {
    /// Loads the most recent checkpoint, if one exists.
    ///
    /// # Errors
    ///
    /// Returns a [`CoordinationError`] when the store cannot be read.
    async fn load_checkpoint(&self) -> CoordinationResult<Option<Checkpoint>>;

    /// Persists the checkpoint, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns a [`CoordinationError`] when the write fails.
    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> CoordinationResult<()>;

    /// Removes the stored checkpoint after a run completes cleanly.
    ///
    /// # Errors
    ///
    /// Returns a [`CoordinationError`] when the removal fails.
    async fn clear_checkpoint(&self) -> CoordinationResult<()>;
}
