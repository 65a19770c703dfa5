//! Thread-safe in-memory lock and checkpoint storage.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::engine::domain::{Checkpoint, RunLock};
use crate::engine::ports::run_coordination::{
    CheckpointRepository, CoordinationError, CoordinationResult, RunLockRepository,
};

/// Thread-safe in-memory run coordination.
///
/// Holds at most one lock and one checkpoint. Tests may seed a lock to
/// simulate a concurrent run, and may read both slots directly for
/// assertions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRunCoordination {
    state: Arc<RwLock<CoordinationState>>,
}

#[derive(Debug, Default)]
struct CoordinationState {
    lock: Option<RunLock>,
    checkpoint: Option<Checkpoint>,
}

impl InMemoryRunCoordination {
    /// Creates empty coordination storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a lock directly, simulating a run already in flight.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::LockPoisoned`] when the state lock
    /// is poisoned.
    pub fn seed_lock(&self, lock: RunLock) -> CoordinationResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| CoordinationError::LockPoisoned)?;
        state.lock = Some(lock);
        Ok(())
    }

    /// Returns the currently stored lock, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::LockPoisoned`] when the state lock
    /// is poisoned.
    pub fn held_lock(&self) -> CoordinationResult<Option<RunLock>> {
        let state = self
            .state
            .read()
            .map_err(|_| CoordinationError::LockPoisoned)?;
        Ok(state.lock.clone())
    }

    /// Returns the stored checkpoint, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::LockPoisoned`] when the state lock
    /// is poisoned.
    pub fn stored_checkpoint(&self) -> CoordinationResult<Option<Checkpoint>> {
        let state = self
            .state
            .read()
            .map_err(|_| CoordinationError::LockPoisoned)?;
        Ok(state.checkpoint.clone())
    }
}

#[async_trait]
impl RunLockRepository for InMemoryRunCoordination {
    async fn acquire_lock(&self, lock: &RunLock) -> CoordinationResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| CoordinationError::LockPoisoned)?;
        let blocking_holder = state.lock.as_ref().and_then(|existing| {
            let live =
                existing.holder() != lock.holder() && !existing.is_expired(lock.acquired_at());
            live.then(|| existing.holder().to_owned())
        });
        if let Some(holder) = blocking_holder {
            return Err(CoordinationError::LockHeld { holder });
        }
        state.lock = Some(lock.clone());
        Ok(())
    }

    async fn release_lock(&self, lock: &RunLock) -> CoordinationResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| CoordinationError::LockPoisoned)?;
        let held_by_caller = state
            .lock
            .as_ref()
            .is_some_and(|existing| existing.holder() == lock.holder());
        if held_by_caller {
            state.lock = None;
        }
        Ok(())
    }
}

#[async_trait]
impl CheckpointRepository for InMemoryRunCoordination {
    async fn load_checkpoint(&self) -> CoordinationResult<Option<Checkpoint>> {
        let state = self
            .state
            .read()
            .map_err(|_| CoordinationError::LockPoisoned)?;
        Ok(state.checkpoint.clone())
    }

    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> CoordinationResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| CoordinationError::LockPoisoned)?;
        state.checkpoint = Some(checkpoint.clone());
        Ok(())
    }

    async fn clear_checkpoint(&self) -> CoordinationResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| CoordinationError::LockPoisoned)?;
        state.checkpoint = None;
        Ok(())
    }
}
