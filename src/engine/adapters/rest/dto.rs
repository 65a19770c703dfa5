//! Wire types for the tracker's run coordination API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::domain::{Checkpoint, RunLock, TaskId};
use crate::pipeline::domain::RunId;

/// Run lock payload on the wire.
#[derive(Debug, Serialize, Deserialize)]
pub struct LockDto {
    pub holder: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Holder payload carried by 409 responses.
#[derive(Debug, Deserialize)]
pub struct LockHolderDto {
    pub holder: String,
}

/// Lock release request.
#[derive(Debug, Serialize)]
pub struct ReleaseDto {
    pub holder: String,
}

/// Resume checkpoint on the wire.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckpointDto {
    pub run: Uuid,
    pub last_completed: Option<String>,
    pub tasks_completed: u32,
    pub updated_at: DateTime<Utc>,
}

impl LockDto {
    pub fn from_lock(lock: &RunLock) -> Self {
        Self {
            holder: lock.holder().to_owned(),
            acquired_at: lock.acquired_at(),
            expires_at: lock.expires_at(),
        }
    }
}

impl CheckpointDto {
    pub fn from_checkpoint(checkpoint: &Checkpoint) -> Self {
        Self {
            run: *checkpoint.run().as_uuid(),
            last_completed: checkpoint
                .last_completed()
                .map(|task| task.as_str().to_owned()),
            tasks_completed: checkpoint.tasks_completed(),
            updated_at: checkpoint.updated_at(),
        }
    }

    pub fn into_checkpoint(self) -> Checkpoint {
        Checkpoint::new(
            RunId::from(self.run),
            self.last_completed.map(TaskId::new),
            self.tasks_completed,
            self.updated_at,
        )
    }
}
