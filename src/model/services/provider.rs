//! Provider service selecting and driving models from the catalogue.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::model::domain::{
    GeneratedText, GenerationRequest, ModelCandidate, ModelDomainError, ModelId, ParamCount,
};
use crate::model::ports::catalog::{CatalogError, ModelCatalog};

/// Default number of generation calls allowed per request across
/// candidate models.
pub const DEFAULT_GENERATION_ATTEMPTS: u32 = 3;

/// Result alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors surfaced by the provider service.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// No candidate could be loaded at all.
    #[error("no eligible model could be loaded for tags {tags:?}")]
    NoEligibleModel {
        /// Tags the request required.
        tags: Vec<String>,
    },

    /// Every attempted generation call failed.
    #[error("generation attempts exhausted after {attempts} tries")]
    AttemptsExhausted {
        /// Number of generation calls made.
        attempts: u32,
    },

    /// The catalogue failed in a way fallback cannot fix.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The generation request itself was malformed.
    #[error(transparent)]
    Request(#[from] ModelDomainError),
}

/// Selection policy for choosing which model serves a request.
///
/// The policy carries the local hardware's parameter ceiling, the
/// fallback model used when ranking produces nothing, and the per-request
/// generation attempt budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPolicy {
    fallback: ModelId,
    param_ceiling: ParamCount,
    generation_attempts: u32,
}

impl ModelPolicy {
    /// Creates a policy with the given ceiling and fallback model.
    #[must_use]
    pub const fn new(fallback: ModelId, param_ceiling: ParamCount) -> Self {
        Self {
            fallback,
            param_ceiling,
            generation_attempts: DEFAULT_GENERATION_ATTEMPTS,
        }
    }

    /// Overrides the per-request generation attempt budget.
    #[must_use]
    pub const fn with_generation_attempts(mut self, attempts: u32) -> Self {
        self.generation_attempts = attempts;
        self
    }

    /// Returns the fallback model.
    #[must_use]
    pub const fn fallback(&self) -> &ModelId {
        &self.fallback
    }

    /// Returns the parameter ceiling.
    #[must_use]
    pub const fn param_ceiling(&self) -> ParamCount {
        self.param_ceiling
    }

    /// Returns the generation attempt budget.
    #[must_use]
    pub const fn generation_attempts(&self) -> u32 {
        self.generation_attempts
    }
}

/// Service that picks a model for each request and drives generation
/// with fallback across ranked candidates.
#[derive(Debug)]
pub struct ModelProvider<C> {
    catalog: Arc<C>,
    policy: ModelPolicy,
}

impl<C> ModelProvider<C>
where
    C: ModelCatalog,
{
    /// Creates a provider over the given catalogue and policy.
    #[must_use]
    pub const fn new(catalog: Arc<C>, policy: ModelPolicy) -> Self {
        Self { catalog, policy }
    }

    /// Returns the policy the provider selects with.
    #[must_use]
    pub const fn policy(&self) -> &ModelPolicy {
        &self.policy
    }

    /// Picks the model that would serve a request with the given tags.
    ///
    /// Selection never fails: candidates are ranked by trending rank and
    /// identifier after filtering out offline models, models over the
    /// parameter ceiling, and models missing a required tag. When ranking
    /// produces nothing, or the catalogue cannot be listed at all, the
    /// policy's fallback model is chosen.
    pub async fn select_model(&self, tags: &BTreeSet<String>) -> ModelId {
        self.shortlist(tags)
            .await
            .into_iter()
            .next()
            .unwrap_or_else(|| self.policy.fallback.clone())
    }

    /// Generates text for the request, falling through ranked candidates.
    ///
    /// A candidate that cannot be loaded is skipped without consuming an
    /// attempt. A generation call that fails, or returns an empty body,
    /// consumes one attempt and moves on to the next candidate.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NoEligibleModel`] when no candidate could
    /// be loaded, [`ProviderError::AttemptsExhausted`] when every
    /// generation call failed, and [`ProviderError::Catalog`] when the
    /// catalogue failed in a way fallback cannot fix.
    pub async fn generate(&self, request: &GenerationRequest) -> ProviderResult<GeneratedText> {
        let shortlist = self.shortlist(request.tags()).await;
        let budget = self.policy.generation_attempts;
        let mut attempts: u32 = 0;
        for model in shortlist {
            if attempts >= budget {
                break;
            }
            let session = match self.catalog.load(&model).await {
                Ok(session) => session,
                Err(CatalogError::ModelUnavailable { reason, .. }) => {
                    debug!(model = %model, reason, "model unavailable; trying the next candidate");
                    continue;
                }
                Err(other) => return Err(other.into()),
            };
            attempts += 1;
            match session.generate(request.prompt(), request.max_tokens()).await {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(model = %model, attempts, "generation succeeded");
                    return Ok(GeneratedText::new(model, text));
                }
                Ok(_) => {
                    warn!(model = %model, "generation returned an empty body");
                }
                Err(CatalogError::Generation { reason, .. }) => {
                    warn!(model = %model, reason, "generation failed; trying the next candidate");
                }
                Err(other) => return Err(other.into()),
            }
        }
        if attempts == 0 {
            return Err(ProviderError::NoEligibleModel {
                tags: request.tags().iter().cloned().collect(),
            });
        }
        Err(ProviderError::AttemptsExhausted { attempts })
    }

    /// Ranks eligible candidates: trending rank descending, identifier
    /// ascending, with the fallback model appended when absent.
    async fn shortlist(&self, tags: &BTreeSet<String>) -> Vec<ModelId> {
        let mut candidates = match self.catalog.list_models().await {
            Ok(listed) => listed,
            Err(err) => {
                warn!(error = %err, "catalogue listing failed; using the fallback model");
                Vec::new()
            }
        };
        candidates.retain(|candidate| {
            !candidate.availability().is_offline()
                && candidate.fits_within(self.policy.param_ceiling)
                && candidate.supports(tags)
        });
        candidates.sort_by(|a, b| {
            b.trending()
                .cmp(&a.trending())
                .then_with(|| a.id().cmp(b.id()))
        });
        let mut ranked: Vec<ModelId> = candidates.into_iter().map(ModelCandidate::into_id).collect();
        if !ranked.contains(&self.policy.fallback) {
            ranked.push(self.policy.fallback.clone());
        }
        ranked
    }
}
