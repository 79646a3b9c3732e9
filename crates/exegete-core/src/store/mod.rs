//! Document Stores
//!
//! Every backend implements the same [`DocumentStore`] capability set and is
//! selected at startup by [`open_store`]:
//! - `memory`: insertion-ordered in-process map, lost on restart
//! - `local-index`: SQLite persistence plus a USearch HNSW index (feature `vector-search`)
//! - `managed-search`: not implemented; fails closed

mod managed;
mod memory;

#[cfg(feature = "vector-search")]
mod local_index;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StoreConfig, VectorStoreKind};
use crate::document::{Document, SearchResult};
use crate::embeddings::EmbeddingProvider;
use crate::error::{ExegeteError, Result};

pub use managed::ManagedSearchStore;
pub use memory::MemoryStore;

#[cfg(feature = "vector-search")]
pub use local_index::LocalIndexStore;

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Persistence and similarity search over documents
///
/// # Contract
///
/// - Adds are upserts by id; re-adding an id overwrites it.
/// - Both searches return at most `k` results, highest score first. Ties keep
///   the store's iteration order.
/// - `similarity_search_by_vector` scores by cosine similarity. A query of the
///   wrong dimensionality scores 0 (or matches nothing) rather than erroring.
/// - `health` never errors; failures read as `false`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert or overwrite a single document
    async fn add_document(&self, document: Document) -> Result<()>;

    /// Insert or overwrite several documents
    async fn add_documents(&self, documents: Vec<Document>) -> Result<()>;

    /// Search by query text
    ///
    /// Vector-backed stores embed the query first. Stores without an embedder
    /// fall back to a lexical heuristic over stored content.
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>>;

    /// Search by cosine similarity to `vector`
    async fn similarity_search_by_vector(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Remove a document; no-op if absent
    async fn delete_document(&self, id: &str) -> Result<()>;

    /// Fetch a document by id
    async fn get_document(&self, id: &str) -> Result<Option<Document>>;

    /// Page through documents in a stable order
    async fn list_documents(&self, limit: usize, offset: usize) -> Result<Vec<Document>>;

    /// Cheap liveness check
    async fn health(&self) -> bool;
}

// ============================================================================
// FACTORY
// ============================================================================

/// Open the store named by the configuration
///
/// `embeddings` is handed to backends that must embed text queries themselves.
pub fn open_store(
    config: &StoreConfig,
    embeddings: Arc<dyn EmbeddingProvider>,
) -> Result<Arc<dyn DocumentStore>> {
    match config.kind {
        VectorStoreKind::Memory => {
            tracing::info!("Using in-memory document store");
            Ok(Arc::new(MemoryStore::new()))
        }
        VectorStoreKind::ManagedSearch => {
            let store = ManagedSearchStore::new(config.endpoint.clone());
            store.connect()?;
            Ok(Arc::new(store))
        }
        VectorStoreKind::LocalIndex => open_local_index(config, embeddings),
    }
}

#[cfg(feature = "vector-search")]
fn open_local_index(
    config: &StoreConfig,
    embeddings: Arc<dyn EmbeddingProvider>,
) -> Result<Arc<dyn DocumentStore>> {
    if embeddings.dimensions() != config.dimensions {
        return Err(ExegeteError::Configuration(format!(
            "store expects {}-dimensional embeddings but {} produces {}",
            config.dimensions,
            embeddings.model_name(),
            embeddings.dimensions()
        )));
    }
    let store = LocalIndexStore::open(config.data_dir.clone(), config.dimensions, embeddings)?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "vector-search"))]
fn open_local_index(
    _config: &StoreConfig,
    _embeddings: Arc<dyn EmbeddingProvider>,
) -> Result<Arc<dyn DocumentStore>> {
    Err(ExegeteError::StoreUnavailable(
        "local-index requires the vector-search feature".to_string(),
    ))
}

// ============================================================================
// RANKING HELPERS
// ============================================================================

/// Stable descending sort by score, then truncate to `k`
pub(crate) fn top_k(mut results: Vec<SearchResult>, k: usize) -> Vec<SearchResult> {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(k);
    results
}
