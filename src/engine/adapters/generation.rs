//! Generator adapter backed by the model provider.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::engine::ports::generation::TextGenerator;
use crate::model::domain::{GeneratedText, GenerationRequest};
use crate::model::ports::catalog::ModelCatalog;
use crate::model::services::{ModelProvider, ProviderResult};

/// [`TextGenerator`] backed by the catalogue-driven model provider.
///
/// Every prompt is stamped with the same capability tags, so the
/// provider only considers models the engine's prompts were written
/// for.
#[derive(Debug)]
pub struct ProviderGenerator<C> {
    provider: ModelProvider<C>,
    tags: BTreeSet<String>,
}

impl<C> ProviderGenerator<C>
where
    C: ModelCatalog,
{
    /// Creates a generator over the given provider and capability tags.
    #[must_use]
    pub const fn new(provider: ModelProvider<C>, tags: BTreeSet<String>) -> Self {
        Self { provider, tags }
    }
}

#[async_trait]
impl<C> TextGenerator for ProviderGenerator<C>
where
    C: ModelCatalog + Send + Sync,
{
    async fn generate(&self, prompt: &str, max_tokens: u32) -> ProviderResult<GeneratedText> {
        let mut request = GenerationRequest::new(prompt, max_tokens)?;
        for tag in &self.tags {
            request = request.with_tag(tag);
        }
        self.provider.generate(&request).await
    }
}
