//! Test Store Manager
//!
//! Provides isolated store instances for testing:
//! - In-memory stores
//! - Temporary on-disk local-index stores, deleted on drop
//! - Reopening a local-index store to check persistence
//! - Pre-seeded stores built from the fixture corpus

use std::path::PathBuf;
use std::sync::Arc;

use exegete_core::config::RetrievalConfig;
use exegete_core::{
    DocumentStore, EmbeddingProvider, HybridRetriever, Ingestor, LocalIndexStore, MemoryStore,
    SeedReport,
};
use tempfile::TempDir;

use crate::mocks::{CONCEPT_DIMENSIONS, ConceptEmbeddings, TestDataFactory};

/// Manager for test stores
///
/// ```rust,ignore
/// let db = TestStoreManager::new_local_index();
/// db.seed_fixtures().await;
/// let hits = db.retriever().retrieve("agape", 3).await?;
/// // temporary directory is removed when `db` goes out of scope
/// ```
pub struct TestStoreManager {
    /// The store under test
    pub store: Arc<dyn DocumentStore>,
    /// Deterministic embedder shared by seeding and retrieval
    pub embeddings: Arc<ConceptEmbeddings>,
    /// Temporary directory (kept alive to prevent premature deletion)
    temp_dir: Option<TempDir>,
}

impl TestStoreManager {
    /// Fresh in-memory store
    pub fn new_memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            embeddings: Arc::new(ConceptEmbeddings::new()),
            temp_dir: None,
        }
    }

    /// Fresh local-index store in a temporary directory
    pub fn new_local_index() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let embeddings = Arc::new(ConceptEmbeddings::new());
        let store = Self::open_local_index(temp_dir.path().to_path_buf(), embeddings.clone());
        Self {
            store,
            embeddings,
            temp_dir: Some(temp_dir),
        }
    }

    fn open_local_index(
        dir: PathBuf,
        embeddings: Arc<ConceptEmbeddings>,
    ) -> Arc<dyn DocumentStore> {
        Arc::new(
            LocalIndexStore::open(Some(dir), CONCEPT_DIMENSIONS, embeddings)
                .expect("Failed to open local-index store"),
        )
    }

    /// Close and reopen the on-disk store; panics for memory stores
    pub fn reopen(&mut self) {
        let dir = self
            .temp_dir
            .as_ref()
            .expect("only local-index stores can be reopened")
            .path()
            .to_path_buf();
        self.store = Self::open_local_index(dir, self.embeddings.clone());
    }

    /// Data directory of an on-disk store
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| d.path().to_path_buf())
    }

    pub fn provider(&self) -> Arc<dyn EmbeddingProvider> {
        self.embeddings.clone()
    }

    pub fn retriever(&self) -> HybridRetriever {
        HybridRetriever::new(self.store.clone(), self.provider(), RetrievalConfig::default())
    }

    pub fn ingestor(&self) -> Ingestor {
        Ingestor::new(self.store.clone(), self.provider())
    }

    // ========================================================================
    // SEEDING METHODS
    // ========================================================================

    /// Seed every fixture record through the NDJSON ingestion path
    pub async fn seed_fixtures(&self) -> SeedReport {
        let ndjson = TestDataFactory::to_ndjson(&TestDataFactory::all());
        self.ingestor()
            .seed_reader(ndjson.as_bytes())
            .await
            .expect("Failed to seed fixtures")
    }

    /// Number of documents visible through listing
    pub async fn document_count(&self) -> usize {
        self.store
            .list_documents(usize::MAX, 0)
            .await
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}
