//! Embedding Providers
//!
//! Maps text to fixed-length vectors. Providers are selected by
//! [`EmbeddingConfig`](crate::config::EmbeddingConfig) and shared behind
//! `Arc<dyn EmbeddingProvider>`:
//! - `openai`: any OpenAI-compatible `/embeddings` endpoint (reqwest)
//! - `local`: fastembed ONNX model, no network access (feature `embeddings`)
//!
//! Either can be wrapped in an LRU cache for repeated queries.

mod cache;
#[cfg(feature = "embeddings")]
mod local;
mod openai;
mod similarity;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{EmbeddingConfig, ProviderKind};
use crate::error::Result;

pub use cache::CachedEmbeddings;
#[cfg(feature = "embeddings")]
pub use local::{LocalEmbeddings, BATCH_SIZE, MAX_TEXT_LENGTH};
pub use openai::{OpenAiEmbeddings, DEFAULT_BASE_URL};
pub use similarity::{cosine_similarity, matryoshka_truncate, normalize};

// ============================================================================
// PROVIDER TRAIT
// ============================================================================

/// Text embedding provider
///
/// `embed_batch` must be equivalent to calling `embed` on each input in order,
/// even when it is served by a single upstream request. An empty batch is a
/// [`Provider`](crate::ExegeteError::Provider) error.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, one vector per input, order preserved
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Output dimensionality
    fn dimensions(&self) -> usize;

    /// Model identifier
    fn model_name(&self) -> &str;
}

// ============================================================================
// FACTORY
// ============================================================================

/// Build the provider named by the configuration
///
/// Missing credentials are reported here, at startup, rather than on the first
/// request.
pub fn build_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        ProviderKind::OpenAi => Arc::new(OpenAiEmbeddings::from_config(config)?),
        ProviderKind::Local => local_provider(config)?,
    };

    tracing::info!(
        provider = %config.provider,
        model = provider.model_name(),
        dimensions = provider.dimensions(),
        "Embedding provider ready"
    );

    if config.query_cache_size == 0 {
        return Ok(provider);
    }
    Ok(Arc::new(CachedEmbeddings::new(provider, config.query_cache_size)))
}

#[cfg(feature = "embeddings")]
fn local_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    Ok(Arc::new(LocalEmbeddings::from_config(config)?))
}

#[cfg(not(feature = "embeddings"))]
fn local_provider(_config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    Err(crate::ExegeteError::Configuration(
        "the local embedding provider requires the `embeddings` feature".to_string(),
    ))
}
