//! HTTP client for a hosted tracker exposing version-guarded writes.
//!
//! The tracker models ideas as issues on a staged board and the research
//! repository behind them. Every mutating endpoint takes the version
//! token from a prior read and answers `409` with the current token when
//! the write is stale. Throttled requests answer `429` with a
//! `Retry-After` header, which callers are expected to honour.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::pipeline::domain::{
    ArtifactKind, CommitId, Idea, IdeaId, Points, Review, Stage, VersionToken,
};
use crate::pipeline::ports::board::{
    BoardError, BoardRepository, BoardResult, CommitReceipt, CommitRequest, ReviewReceipt,
    VersionedIdea,
};

use super::dto::{
    AppendReviewDto, CommitDto, CommitFileDto, CommitReceiptDto, ConflictDto, IdeaDto,
    IdeaEnvelopeDto, NoteDto, ReviewDto, ReviewReceiptDto, UpdateIdeaDto, VersionDto,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fallback delay applied when a throttled response omits `Retry-After`.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Board adapter speaking the hosted tracker's REST API.
#[derive(Debug, Clone)]
pub struct RestBoard {
    client: Client,
    base_url: String,
    token: Option<String>,
}

fn retry_after_hint(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map_or(DEFAULT_RETRY_AFTER, Duration::from_secs)
}

impl RestBoard {
    /// Creates a board client for the given base URL, optionally
    /// presenting a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Persistence`] when the HTTP client cannot be
    /// constructed.
    pub fn new(base_url: &str, token: Option<String>) -> BoardResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(BoardError::persistence)?;
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

    async fn send(&self, operation: &str, builder: RequestBuilder) -> BoardResult<Response> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(BoardError::persistence)?;
        check_common(operation, response).await
    }
}

/// Maps the statuses every endpoint shares; operation-specific statuses
/// (404, 409) are handled by the callers.
async fn check_common(operation: &str, response: Response) -> BoardResult<Response> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(BoardError::RateLimited {
            operation: operation.to_owned(),
            retry_after: retry_after_hint(response.headers()),
        });
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(BoardError::AccessDenied {
            reason: format!("tracker answered {status}"),
        });
    }
    if status.is_server_error() {
        let reason = response.text().await.unwrap_or_default();
        return Err(BoardError::Upstream {
            status: status.as_u16(),
            reason,
        });
    }
    Ok(response)
}

async fn conflict_from(
    response: Response,
    idea: &IdeaId,
    supplied: &VersionToken,
) -> BoardError {
    let decoded: Result<ConflictDto, _> = response.json().await;
    match decoded {
        Ok(dto) => BoardError::Conflict {
            idea: idea.clone(),
            supplied: supplied.clone(),
            current: VersionToken::new(dto.current_version),
        },
        Err(err) => BoardError::Decode {
            reason: err.to_string(),
        },
    }
}

async fn unexpected(response: Response) -> BoardError {
    let status = response.status().as_u16();
    let reason = response.text().await.unwrap_or_default();
    BoardError::Upstream { status, reason }
}

async fn decode_json<T: serde::de::DeserializeOwned>(response: Response) -> BoardResult<T> {
    response.json::<T>().await.map_err(|err| BoardError::Decode {
        reason: err.to_string(),
    })
}

#[async_trait]
impl BoardRepository for RestBoard {
    async fn list_ideas(&self, stage: Option<Stage>) -> BoardResult<Vec<VersionedIdea>> {
        let mut builder = self.client.get(self.url("/ideas"));
        if let Some(wanted) = stage {
            builder = builder.query(&[("stage", wanted.as_str())]);
        }
        let response = self.send("list_ideas", builder).await?;
        if !response.status().is_success() {
            return Err(unexpected(response).await);
        }
        let envelopes: Vec<IdeaEnvelopeDto> = decode_json(response).await?;
        envelopes
            .into_iter()
            .map(IdeaEnvelopeDto::into_versioned)
            .collect()
    }

    async fn get_idea(&self, id: &IdeaId) -> BoardResult<VersionedIdea> {
        let builder = self.client.get(self.url(&format!("/ideas/{id}")));
        let response = self.send("get_idea", builder).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(BoardError::IdeaNotFound(id.clone()));
        }
        if !response.status().is_success() {
            return Err(unexpected(response).await);
        }
        let envelope: IdeaEnvelopeDto = decode_json(response).await?;
        envelope.into_versioned()
    }

    async fn register_idea(&self, idea: &Idea) -> BoardResult<VersionToken> {
        let builder = self
            .client
            .post(self.url("/ideas"))
            .json(&IdeaDto::from_idea(idea));
        let response = self.send("register_idea", builder).await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(BoardError::DuplicateIdea(idea.id().clone()));
        }
        if !response.status().is_success() {
            return Err(unexpected(response).await);
        }
        let version: VersionDto = decode_json(response).await?;
        Ok(VersionToken::new(version.version))
    }

    async fn update_idea(
        &self,
        id: &IdeaId,
        version: &VersionToken,
        idea: &Idea,
    ) -> BoardResult<VersionToken> {
        let body = UpdateIdeaDto {
            idea: IdeaDto::from_idea(idea),
            expected_version: version.as_str().to_owned(),
        };
        let builder = self
            .client
            .put(self.url(&format!("/ideas/{id}")))
            .json(&body);
        let response = self.send("update_idea", builder).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(BoardError::IdeaNotFound(id.clone())),
            StatusCode::CONFLICT => Err(conflict_from(response, id, version).await),
            status if status.is_success() => {
                let updated: VersionDto = decode_json(response).await?;
                Ok(VersionToken::new(updated.version))
            }
            _ => Err(unexpected(response).await),
        }
    }

    async fn append_review(
        &self,
        id: &IdeaId,
        version: &VersionToken,
        review: &Review,
        weight: Points,
    ) -> BoardResult<ReviewReceipt> {
        let body = AppendReviewDto {
            review: ReviewDto::from_review(review),
            weight: weight.as_f64(),
            expected_version: version.as_str().to_owned(),
        };
        let builder = self
            .client
            .post(self.url(&format!("/ideas/{id}/reviews")))
            .json(&body);
        let response = self.send("append_review", builder).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(BoardError::IdeaNotFound(id.clone())),
            StatusCode::CONFLICT => Err(conflict_from(response, id, version).await),
            status if status.is_success() => {
                let receipt: ReviewReceiptDto = decode_json(response).await?;
                let total = Points::try_from_f64(receipt.total).map_err(|err| {
                    BoardError::Decode {
                        reason: err.to_string(),
                    }
                })?;
                Ok(ReviewReceipt {
                    total,
                    version: VersionToken::new(receipt.version),
                    reset: receipt.reset,
                })
            }
            _ => Err(unexpected(response).await),
        }
    }

    async fn commit_artifacts(&self, request: &CommitRequest) -> BoardResult<CommitReceipt> {
        let body = CommitDto {
            kind: request.kind().as_str(),
            message: request.message().to_owned(),
            files: request
                .files()
                .iter()
                .map(|file| CommitFileDto {
                    path: file.path().to_owned(),
                    contents: file.contents().to_owned(),
                })
                .collect(),
            committed_at: request.committed_at(),
            expected_version: request.version().as_str().to_owned(),
        };
        let builder = self
            .client
            .post(self.url(&format!("/ideas/{}/artifacts", request.idea())))
            .json(&body);
        let response = self.send("commit_artifacts", builder).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(BoardError::IdeaNotFound(request.idea().clone())),
            StatusCode::CONFLICT => {
                Err(conflict_from(response, request.idea(), request.version()).await)
            }
            status if status.is_success() => {
                let receipt: CommitReceiptDto = decode_json(response).await?;
                Ok(CommitReceipt {
                    commit: CommitId::new(receipt.commit),
                    location: receipt.location,
                    version: VersionToken::new(receipt.version),
                })
            }
            _ => Err(unexpected(response).await),
        }
    }

    async fn read_artifact(&self, id: &IdeaId, kind: ArtifactKind) -> BoardResult<String> {
        let builder = self
            .client
            .get(self.url(&format!("/ideas/{id}/artifacts/{}", kind.as_str())));
        let response = self.send("read_artifact", builder).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(BoardError::ArtifactMissing {
                idea: id.clone(),
                kind,
            }),
            status if status.is_success() => {
                response.text().await.map_err(BoardError::persistence)
            }
            _ => Err(unexpected(response).await),
        }
    }

    async fn annotate(&self, id: &IdeaId, note: &str) -> BoardResult<()> {
        let body = NoteDto {
            body: note.to_owned(),
        };
        let builder = self
            .client
            .post(self.url(&format!("/ideas/{id}/notes")))
            .json(&body);
        let response = self.send("annotate", builder).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(BoardError::IdeaNotFound(id.clone())),
            status if status.is_success() => Ok(()),
            _ => Err(unexpected(response).await),
        }
    }
}
