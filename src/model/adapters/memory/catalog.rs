//! Thread-safe in-memory catalogue with scripted generation outcomes.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::model::domain::{Availability, ModelCandidate, ModelId};
use crate::model::ports::catalog::{
    CatalogError, CatalogResult, InferenceSession, ModelCatalog,
};

/// Scripted outcome for one generation call against a model.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// The model answers with the given text.
    Text(String),
    /// The inference call fails after the model loads.
    Failure(String),
}

/// One generation call recorded by the catalogue, kept for assertions.
#[derive(Debug, Clone)]
pub struct GenerationCall {
    /// Model the call was served by.
    pub model: ModelId,
    /// Prompt that was submitted.
    pub prompt: String,
    /// Output token budget of the call.
    pub max_tokens: u32,
}

/// Thread-safe in-memory catalogue.
///
/// Candidates are registered up front; generation outcomes are scripted
/// per model and consumed in order. Loading an offline or busy model
/// fails the way the serving endpoint would, so provider fallback paths
/// can be exercised without a network.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    state: Arc<RwLock<CatalogState>>,
}

#[derive(Debug, Default)]
struct CatalogState {
    candidates: Vec<ModelCandidate>,
    scripts: BTreeMap<ModelId, VecDeque<ScriptedOutcome>>,
    default_response: Option<String>,
    calls: Vec<GenerationCall>,
}

impl StaticCatalog {
    /// Creates an empty catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a candidate model.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::LockPoisoned`] when the state lock is
    /// poisoned.
    pub fn add_model(&self, candidate: ModelCandidate) -> CatalogResult<()> {
        let mut state = self.state.write().map_err(|_| CatalogError::LockPoisoned)?;
        state.candidates.push(candidate);
        Ok(())
    }

    /// Scripts the outcome of the next generation call on the given
    /// model. Outcomes queue up and are consumed in order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::LockPoisoned`] when the state lock is
    /// poisoned.
    pub fn script(&self, model: &ModelId, outcome: ScriptedOutcome) -> CatalogResult<()> {
        let mut state = self.state.write().map_err(|_| CatalogError::LockPoisoned)?;
        state
            .scripts
            .entry(model.clone())
            .or_default()
            .push_back(outcome);
        Ok(())
    }

    /// Sets the text returned by generation calls that have no scripted
    /// outcome queued.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::LockPoisoned`] when the state lock is
    /// poisoned.
    pub fn set_default_response(&self, text: &str) -> CatalogResult<()> {
        let mut state = self.state.write().map_err(|_| CatalogError::LockPoisoned)?;
        state.default_response = Some(text.to_owned());
        Ok(())
    }

    /// Returns every generation call recorded so far, in order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::LockPoisoned`] when the state lock is
    /// poisoned.
    pub fn calls(&self) -> CatalogResult<Vec<GenerationCall>> {
        let state = self.state.read().map_err(|_| CatalogError::LockPoisoned)?;
        Ok(state.calls.clone())
    }
}

struct ScriptedSession {
    model: ModelId,
    state: Arc<RwLock<CatalogState>>,
}

#[async_trait]
impl InferenceSession for ScriptedSession {
    fn model(&self) -> &ModelId {
        &self.model
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> CatalogResult<String> {
        let mut state = self.state.write().map_err(|_| CatalogError::LockPoisoned)?;
        state.calls.push(GenerationCall {
            model: self.model.clone(),
            prompt: prompt.to_owned(),
            max_tokens,
        });
        let scripted = state
            .scripts
            .get_mut(&self.model)
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(ScriptedOutcome::Text(text)) => Ok(text),
            Some(ScriptedOutcome::Failure(reason)) => Err(CatalogError::Generation {
                model: self.model.clone(),
                reason,
            }),
            None => state
                .default_response
                .clone()
                .ok_or_else(|| CatalogError::Generation {
                    model: self.model.clone(),
                    reason: "no scripted response".to_owned(),
                }),
        }
    }
}

#[async_trait]
impl ModelCatalog for StaticCatalog {
    async fn list_models(&self) -> CatalogResult<Vec<ModelCandidate>> {
        let state = self.state.read().map_err(|_| CatalogError::LockPoisoned)?;
        Ok(state.candidates.clone())
    }

    async fn load(&self, id: &ModelId) -> CatalogResult<Box<dyn InferenceSession>> {
        let state = self.state.read().map_err(|_| CatalogError::LockPoisoned)?;
        let candidate = state
            .candidates
            .iter()
            .find(|candidate| candidate.id() == id)
            .ok_or_else(|| CatalogError::ModelUnavailable {
                model: id.clone(),
                reason: "not in the catalogue".to_owned(),
            })?;
        match candidate.availability() {
            Availability::Available => Ok(Box::new(ScriptedSession {
                model: id.clone(),
                state: Arc::clone(&self.state),
            })),
            Availability::Busy => Err(CatalogError::ModelUnavailable {
                model: id.clone(),
                reason: "serving slot is busy".to_owned(),
            }),
            Availability::Offline => Err(CatalogError::ModelUnavailable {
                model: id.clone(),
                reason: "offline".to_owned(),
            }),
        }
    }
}
