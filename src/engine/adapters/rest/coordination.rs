//! HTTP client for the tracker's run coordination API.
//!
//! The tracker stores one advisory run lock and one resume checkpoint
//! per board. Lock acquisition answers `409` with the current holder
//! when a live lock is in the way; checkpoint reads answer `404` when
//! no run has checkpointed yet.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::engine::domain::{Checkpoint, RunLock};
use crate::engine::ports::run_coordination::{
    CheckpointRepository, CoordinationError, CoordinationResult, RunLockRepository,
};

use super::dto::{CheckpointDto, LockDto, LockHolderDto, ReleaseDto};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Coordination adapter speaking the hosted tracker's REST API.
#[derive(Debug, Clone)]
pub struct RestRunCoordination {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl RestRunCoordination {
    /// Creates a coordination client for the given base URL, optionally
    /// presenting a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::Persistence`] when the HTTP client
    /// cannot be constructed.
    pub fn new(base_url: &str, token: Option<String>) -> CoordinationResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(CoordinationError::persistence)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    #[expect(
        clippy::option_if_let_else,
        reason = "the request builder moves through both arms"
    )]
    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> CoordinationResult<Response> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(CoordinationError::persistence)?;
        check_common(response).await
    }
}

/// Maps the statuses every endpoint shares; operation-specific statuses
/// (404, 409) are handled by the callers.
async fn check_common(response: Response) -> CoordinationResult<Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(CoordinationError::AccessDenied {
            reason: format!("tracker answered {status}"),
        });
    }
    if status.is_server_error() {
        let reason = response.text().await.unwrap_or_default();
        return Err(CoordinationError::Upstream {
            status: status.as_u16(),
            reason,
        });
    }
    Ok(response)
}

async fn unexpected(response: Response) -> CoordinationError {
    let status = response.status().as_u16();
    let reason = response.text().await.unwrap_or_default();
    CoordinationError::Upstream { status, reason }
}

async fn decode_json<T: serde::de::DeserializeOwned>(response: Response) -> CoordinationResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|err| CoordinationError::Decode {
            reason: err.to_string(),
        })
}

#[async_trait]
impl RunLockRepository for RestRunCoordination {
    async fn acquire_lock(&self, lock: &RunLock) -> CoordinationResult<()> {
        let builder = self
            .client
            .post(self.url("/run-lock"))
            .json(&LockDto::from_lock(lock));
        let response = self.send(builder).await?;
        match response.status() {
            StatusCode::CONFLICT => {
                let holder: LockHolderDto = decode_json(response).await?;
                Err(CoordinationError::LockHeld {
                    holder: holder.holder,
                })
            }
            status if status.is_success() => Ok(()),
            _ => Err(unexpected(response).await),
        }
    }

    async fn release_lock(&self, lock: &RunLock) -> CoordinationResult<()> {
        let body = ReleaseDto {
            holder: lock.holder().to_owned(),
        };
        let builder = self.client.delete(self.url("/run-lock")).json(&body);
        let response = self.send(builder).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            _ => Err(unexpected(response).await),
        }
    }
}

#[async_trait]
impl CheckpointRepository for RestRunCoordination {
    async fn load_checkpoint(&self) -> CoordinationResult<Option<Checkpoint>> {
        let builder = self.client.get(self.url("/checkpoint"));
        let response = self.send(builder).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let dto: CheckpointDto = decode_json(response).await?;
                Ok(Some(dto.into_checkpoint()))
            }
            _ => Err(unexpected(response).await),
        }
    }

    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> CoordinationResult<()> {
        let builder = self
            .client
            .put(self.url("/checkpoint"))
            .json(&CheckpointDto::from_checkpoint(checkpoint));
        let response = self.send(builder).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(unexpected(response).await)
        }
    }

    async fn clear_checkpoint(&self) -> CoordinationResult<()> {
        let builder = self.client.delete(self.url("/checkpoint"));
        let response = self.send(builder).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            _ => Err(unexpected(response).await),
        }
    }
}
