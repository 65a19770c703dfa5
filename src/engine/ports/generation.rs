//! Port contract for prompt-driven text generation.

use async_trait::async_trait;

use crate::model::domain::GeneratedText;
use crate::model::services::ProviderResult;

/// Text generation as the engine's handlers see it.
///
/// Handlers hand over a prompt and a token cap and get back text with
/// the identity of the model that produced it. Model selection,
/// fallback, and retry live behind this port.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates text for the prompt, capped at `max_tokens`.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::model::services::ProviderError`] when no
    /// model could serve the request or every attempt failed.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> ProviderResult<GeneratedText>;
}
