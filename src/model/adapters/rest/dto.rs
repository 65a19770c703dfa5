//! Wire types for the model manifest and inference endpoint.

use serde::{Deserialize, Serialize};

use crate::model::domain::{
    Availability, ModelCandidate, ModelId, ParamCount,
};
use crate::model::ports::catalog::{CatalogError, CatalogResult};

fn decode_err(reason: impl ToString) -> CatalogError {
    CatalogError::Decode {
        reason: reason.to_string(),
    }
}

/// Manifest payload listing every served model.
#[derive(Debug, Deserialize)]
pub struct ManifestDto {
    pub models: Vec<ModelEntryDto>,
}

/// One model entry in the manifest.
#[derive(Debug, Deserialize)]
pub struct ModelEntryDto {
    pub id: String,
    pub parameters_m: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub trending: u32,
    #[serde(default)]
    pub availability: Option<String>,
}

impl ModelEntryDto {
    pub fn into_candidate(self) -> CatalogResult<ModelCandidate> {
        let id = ModelId::new(&self.id).map_err(decode_err)?;
        let parameters = ParamCount::from_millions(self.parameters_m).map_err(decode_err)?;
        let availability = match self.availability.as_deref() {
            Some(raw) => Availability::try_from(raw).map_err(decode_err)?,
            None => Availability::Available,
        };
        let mut candidate = ModelCandidate::new(id, parameters)
            .with_availability(availability)
            .with_trending(self.trending);
        for tag in &self.tags {
            candidate = candidate.with_tag(tag);
        }
        Ok(candidate)
    }
}

/// Health payload for a single model.
#[derive(Debug, Deserialize)]
pub struct HealthDto {
    pub state: String,
}

/// Generation request on the wire.
#[derive(Debug, Serialize)]
pub struct GenerateDto<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub max_tokens: u32,
}

/// Generation response on the wire.
#[derive(Debug, Deserialize)]
pub struct GeneratedDto {
    pub text: String,
}
