//! Candidate language models and their catalogue attributes.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use super::error::ModelDomainError;

/// Maximum length of a model identifier in characters.
pub const MAX_MODEL_ID_LENGTH: usize = 128;

/// Validated identifier of a language model in the catalogue.
///
/// Identifiers follow registry conventions such as `hermes-7b` or
/// `lab/qwen2.5-coder:3b`, so the charset admits alphanumerics plus a
/// small set of separators. Case is preserved; registries treat it as
/// significant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId(String);

impl ModelId {
    /// Creates a model identifier from a raw registry name.
    ///
    /// # Errors
    ///
    /// Returns [`ModelDomainError::EmptyModelId`] when the trimmed input
    /// is empty, [`ModelDomainError::ModelIdTooLong`] when it exceeds
    /// [`MAX_MODEL_ID_LENGTH`] characters, and
    /// [`ModelDomainError::InvalidModelId`] when it contains characters
    /// outside the permitted set.
    pub fn new(raw: &str) -> Result<Self, ModelDomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ModelDomainError::EmptyModelId);
        }
        let length = trimmed.chars().count();
        if length > MAX_MODEL_ID_LENGTH {
            return Err(ModelDomainError::ModelIdTooLong {
                length,
                max: MAX_MODEL_ID_LENGTH,
            });
        }
        let charset_ok = trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '/' | ':'));
        if !charset_ok {
            return Err(ModelDomainError::InvalidModelId {
                actual: trimmed.to_owned(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ModelId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model size measured in millions of parameters.
///
/// Catalogue sizes are whole millions, which keeps ceiling comparisons
/// exact for fractional-billion models such as a 1.5B variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParamCount(u64);

impl ParamCount {
    /// Creates a parameter count from a number of millions.
    ///
    /// # Errors
    ///
    /// Returns [`ModelDomainError::ZeroParamCount`] when the count is
    /// zero.
    pub const fn from_millions(millions: u64) -> Result<Self, ModelDomainError> {
        if millions == 0 {
            return Err(ModelDomainError::ZeroParamCount);
        }
        Ok(Self(millions))
    }

    /// Creates a parameter count from a whole number of billions.
    ///
    /// # Errors
    ///
    /// Returns [`ModelDomainError::ZeroParamCount`] when the count is
    /// zero.
    pub const fn from_billions(billions: u64) -> Result<Self, ModelDomainError> {
        Self::from_millions(billions.saturating_mul(1000))
    }

    /// Returns the count in millions of parameters.
    #[must_use]
    pub const fn millions(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ParamCount {
    #[expect(
        clippy::integer_division,
        clippy::integer_division_remainder_used,
        reason = "whole-billion sizes render in billions, the rest in millions"
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 1000 == 0 {
            write!(f, "{}b", self.0 / 1000)
        } else {
            write!(f, "{}m", self.0)
        }
    }
}

/// Availability of a model as reported by the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Availability {
    /// The model can be loaded now.
    Available,
    /// The model exists but its serving slot is occupied.
    Busy,
    /// The model is not being served.
    Offline,
}

impl Availability {
    /// Returns the canonical storage form of the availability.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Busy => "busy",
            Self::Offline => "offline",
        }
    }

    /// Reports whether the model is not being served at all.
    #[must_use]
    pub const fn is_offline(self) -> bool {
        matches!(self, Self::Offline)
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an availability string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown availability: {0:?}")]
pub struct ParseAvailabilityError(String);

impl TryFrom<&str> for Availability {
    type Error = ParseAvailabilityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "available" | "ready" => Ok(Self::Available),
            "busy" | "loading" => Ok(Self::Busy),
            "offline" => Ok(Self::Offline),
            other => Err(ParseAvailabilityError(other.to_owned())),
        }
    }
}

/// A candidate model in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCandidate {
    id: ModelId,
    parameters: ParamCount,
    tags: BTreeSet<String>,
    availability: Availability,
    trending: u32,
}

impl ModelCandidate {
    /// Creates a candidate that is available, untagged, and not trending.
    #[must_use]
    pub const fn new(id: ModelId, parameters: ParamCount) -> Self {
        Self {
            id,
            parameters,
            tags: BTreeSet::new(),
            availability: Availability::Available,
            trending: 0,
        }
    }

    /// Adds a capability tag.
    #[must_use]
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag.to_owned());
        self
    }

    /// Replaces the availability reported by the catalogue.
    #[must_use]
    pub const fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    /// Replaces the trending rank; higher ranks sort earlier.
    #[must_use]
    pub const fn with_trending(mut self, trending: u32) -> Self {
        self.trending = trending;
        self
    }

    /// Returns the model identifier.
    #[must_use]
    pub const fn id(&self) -> &ModelId {
        &self.id
    }

    /// Consumes the candidate, returning its identifier.
    #[must_use]
    pub fn into_id(self) -> ModelId {
        self.id
    }

    /// Returns the parameter count.
    #[must_use]
    pub const fn parameters(&self) -> ParamCount {
        self.parameters
    }

    /// Returns the capability tags.
    #[must_use]
    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Returns the reported availability.
    #[must_use]
    pub const fn availability(&self) -> Availability {
        self.availability
    }

    /// Returns the trending rank.
    #[must_use]
    pub const fn trending(&self) -> u32 {
        self.trending
    }

    /// Reports whether the candidate fits under the given parameter
    /// ceiling.
    #[must_use]
    pub fn fits_within(&self, ceiling: ParamCount) -> bool {
        self.parameters <= ceiling
    }

    /// Reports whether the candidate carries every required tag.
    #[must_use]
    pub fn supports(&self, required: &BTreeSet<String>) -> bool {
        required.iter().all(|tag| self.tags.contains(tag))
    }
}
