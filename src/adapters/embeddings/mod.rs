//! Embedding provider adapters.

pub mod mock;
pub mod openai;

pub use mock::{MockEmbedding, MockEmbeddingProvider};
pub use openai::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};

use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::EmbeddingConfig;
use crate::domain::ports::EmbeddingProvider;

/// Build the provider named in configuration.
pub fn provider_from_config(config: &EmbeddingConfig) -> DomainResult<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig::from(config))?)),
        "mock" => Ok(Arc::new(MockEmbeddingProvider::new(config.dimension))),
        other => Err(DomainError::ValidationFailed(format!(
            "unknown embedding provider: {other}"
        ))),
    }
}
