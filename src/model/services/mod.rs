//! Application services for the model context.

mod provider;

pub use provider::{
    DEFAULT_GENERATION_ATTEMPTS, ModelPolicy, ModelProvider, ProviderError, ProviderResult,
};
