//! Port contract for the model catalogue and inference endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::domain::{ModelCandidate, ModelId};

/// Result alias for catalogue operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors surfaced by catalogue adapters.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// The model cannot be loaded right now.
    #[error("model {model} is unavailable: {reason}")]
    ModelUnavailable {
        /// Model that could not be loaded.
        model: ModelId,
        /// Reason reported by the catalogue.
        reason: String,
    },

    /// The inference call failed after the model loaded.
    #[error("generation on {model} failed: {reason}")]
    Generation {
        /// Model the generation ran on.
        model: ModelId,
        /// Reason reported by the endpoint.
        reason: String,
    },

    /// The catalogue rejected the caller's credentials.
    #[error("catalogue access denied: {reason}")]
    AccessDenied {
        /// Reason reported by the catalogue.
        reason: String,
    },

    /// The catalogue returned a payload that could not be decoded.
    #[error("failed to decode catalogue response: {reason}")]
    Decode {
        /// Description of the decoding failure.
        reason: String,
    },

    /// The catalogue answered with an unexpected status.
    #[error("catalogue request failed with status {status}: {reason}")]
    Upstream {
        /// HTTP status code returned by the catalogue.
        status: u16,
        /// Response body or status text.
        reason: String,
    },

    /// The adapter's shared state lock was poisoned.
    #[error("catalogue state lock was poisoned")]
    LockPoisoned,

    /// The underlying transport failed.
    #[error("catalogue transport failed: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl CatalogError {
    /// Wraps an arbitrary transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}

/// A loaded model ready to serve generation calls.
#[async_trait]
pub trait InferenceSession: Send + Sync {
    /// Returns the model this session serves.
    fn model(&self) -> &ModelId;

    /// Generates text for the prompt within the output token budget.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> CatalogResult<String>;
}

/// Catalogue of candidate models and the serving endpoint behind them.
///
/// Loading checks current availability; a model listed as available may
/// still refuse to load when its serving slot was taken in the meantime,
/// which surfaces as [`CatalogError::ModelUnavailable`].
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    /// Lists every candidate model the catalogue knows about.
    async fn list_models(&self) -> CatalogResult<Vec<ModelCandidate>>;

    /// Loads a model for serving and returns the session to generate
    /// through.
    async fn load(&self, id: &ModelId) -> CatalogResult<Box<dyn InferenceSession>>;
}
