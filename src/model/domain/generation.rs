//! Generation requests and the text they produce.

use std::collections::BTreeSet;

use super::candidate::ModelId;
use super::error::ModelDomainError;

/// A request for text generation, carrying the prompt, the output budget,
/// and the capability tags the serving model must support.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    max_tokens: u32,
    tags: BTreeSet<String>,
}

impl GenerationRequest {
    /// Creates a generation request.
    ///
    /// # Errors
    ///
    /// Returns [`ModelDomainError::EmptyPrompt`] when the prompt is empty
    /// after trimming and [`ModelDomainError::ZeroMaxTokens`] when no
    /// output tokens are allowed.
    pub fn new(prompt: &str, max_tokens: u32) -> Result<Self, ModelDomainError> {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            return Err(ModelDomainError::EmptyPrompt);
        }
        if max_tokens == 0 {
            return Err(ModelDomainError::ZeroMaxTokens);
        }
        Ok(Self {
            prompt: trimmed.to_owned(),
            max_tokens,
            tags: BTreeSet::new(),
        })
    }

    /// Adds a capability tag the serving model must carry.
    #[must_use]
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag.to_owned());
        self
    }

    /// Returns the prompt text.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Returns the output token budget.
    #[must_use]
    pub const fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Returns the required capability tags.
    #[must_use]
    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }
}

/// Text produced by a generation call, tagged with the model that wrote
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedText {
    model: ModelId,
    text: String,
}

impl GeneratedText {
    /// Creates a generation result.
    #[must_use]
    pub const fn new(model: ModelId, text: String) -> Self {
        Self { model, text }
    }

    /// Returns the model that produced the text.
    #[must_use]
    pub const fn model(&self) -> &ModelId {
        &self.model
    }

    /// Returns the generated text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consumes the result, returning the generated text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}
