//! HTTP client for a model manifest and its inference endpoint.
//!
//! The endpoint serves a manifest of candidate models, a per-model health
//! resource consulted before loading, and a generation route. One model is
//! served at a time; a health state of `busy` means another model holds
//! the serving slot.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::model::domain::{Availability, ModelCandidate, ModelId};
use crate::model::ports::catalog::{
    CatalogError, CatalogResult, InferenceSession, ModelCatalog,
};

use super::dto::{GenerateDto, GeneratedDto, HealthDto, ManifestDto, ModelEntryDto};

/// Generation calls run long on local hardware; reads stay snappy.
const MANIFEST_TIMEOUT: Duration = Duration::from_secs(30);
const GENERATION_TIMEOUT: Duration = Duration::from_secs(600);

/// Catalogue adapter speaking the inference endpoint's REST API.
#[derive(Debug, Clone)]
pub struct ManifestCatalog {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ManifestCatalog {
    /// Creates a catalogue client for the given base URL, optionally
    /// presenting a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Transport`] when the HTTP client cannot be
    /// constructed.
    pub fn new(base_url: &str, token: Option<String>) -> CatalogResult<Self> {
        let client = Client::builder()
            .timeout(MANIFEST_TIMEOUT)
            .build()
            .map_err(CatalogError::transport)?;
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

    async fn send(&self, builder: RequestBuilder) -> CatalogResult<Response> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(CatalogError::transport)?;
        check_common(response).await
    }
}

/// Maps the statuses every route shares; route-specific statuses are
/// handled by the callers.
async fn check_common(response: Response) -> CatalogResult<Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(CatalogError::AccessDenied {
            reason: format!("endpoint answered {status}"),
        });
    }
    if status.is_server_error() {
        let reason = response.text().await.unwrap_or_default();
        return Err(CatalogError::Upstream {
            status: status.as_u16(),
            reason,
        });
    }
    Ok(response)
}

async fn unexpected(response: Response) -> CatalogError {
    let status = response.status().as_u16();
    let reason = response.text().await.unwrap_or_default();
    CatalogError::Upstream { status, reason }
}

async fn decode_json<T: serde::de::DeserializeOwned>(response: Response) -> CatalogResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|err| CatalogError::Decode {
            reason: err.to_string(),
        })
}

struct HttpSession {
    client: Client,
    base_url: String,
    token: Option<String>,
    model: ModelId,
}

impl HttpSession {
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
}

#[async_trait]
impl InferenceSession for HttpSession {
    fn model(&self) -> &ModelId {
        &self.model
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> CatalogResult<String> {
        let body = GenerateDto {
            model: self.model.as_str(),
            prompt,
            max_tokens,
        };
        let builder = self
            .client
            .post(format!("{}/generate", self.base_url))
            .timeout(GENERATION_TIMEOUT)
            .json(&body);
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(CatalogError::transport)?;
        let response = check_common(response).await?;
        match response.status() {
            StatusCode::TOO_MANY_REQUESTS | StatusCode::CONFLICT => {
                let reason = response.text().await.unwrap_or_default();
                Err(CatalogError::Generation {
                    model: self.model.clone(),
                    reason: format!("endpoint refused the call: {reason}"),
                })
            }
            status if status.is_success() => {
                let generated: GeneratedDto = decode_json(response).await?;
                Ok(generated.text)
            }
            _ => Err(unexpected(response).await),
        }
    }
}

#[async_trait]
impl ModelCatalog for ManifestCatalog {
    async fn list_models(&self) -> CatalogResult<Vec<ModelCandidate>> {
        let builder = self.client.get(self.url("/models"));
        let response = self.send(builder).await?;
        if !response.status().is_success() {
            return Err(unexpected(response).await);
        }
        let manifest: ManifestDto = decode_json(response).await?;
        manifest
            .models
            .into_iter()
            .map(ModelEntryDto::into_candidate)
            .collect()
    }

    async fn load(&self, id: &ModelId) -> CatalogResult<Box<dyn InferenceSession>> {
        let builder = self
            .client
            .get(self.url(&format!("/models/{id}/health")));
        let response = self.send(builder).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CatalogError::ModelUnavailable {
                model: id.clone(),
                reason: "not in the manifest".to_owned(),
            });
        }
        if !response.status().is_success() {
            return Err(unexpected(response).await);
        }
        let health: HealthDto = decode_json(response).await?;
        let availability =
            Availability::try_from(health.state.as_str()).map_err(|err| CatalogError::Decode {
                reason: err.to_string(),
            })?;
        match availability {
            Availability::Available => Ok(Box::new(HttpSession {
                client: self.client.clone(),
                base_url: self.base_url.clone(),
                token: self.token.clone(),
                model: id.clone(),
            })),
            Availability::Busy => Err(CatalogError::ModelUnavailable {
                model: id.clone(),
                reason: "another model holds the serving slot".to_owned(),
            }),
            Availability::Offline => Err(CatalogError::ModelUnavailable {
                model: id.clone(),
                reason: "offline".to_owned(),
            }),
        }
    }
}
