//! Managed full-text + vector search backend
//!
//! Not implemented. [`open_store`](super::open_store) refuses it at startup
//! through [`ManagedSearchStore::connect`], and every operation fails closed so
//! a misconfigured deployment reports the problem instead of silently serving
//! from an empty store.

use async_trait::async_trait;

use super::DocumentStore;
use crate::document::{Document, SearchResult};
use crate::error::{ExegeteError, Result};

/// Placeholder for a hosted search cluster
#[derive(Debug, Clone, Default)]
pub struct ManagedSearchStore {
    endpoint: Option<String>,
}

impl ManagedSearchStore {
    pub fn new(endpoint: Option<String>) -> Self {
        Self { endpoint }
    }

    /// Check the cluster is reachable before first use
    pub fn connect(&self) -> Result<()> {
        self.unavailable("connect")
    }

    fn unavailable<T>(&self, operation: &str) -> Result<T> {
        Err(ExegeteError::StoreUnavailable(format!(
            "managed-search backend is not implemented ({} against {})",
            operation,
            self.endpoint.as_deref().unwrap_or("unconfigured endpoint")
        )))
    }
}

#[async_trait]
impl DocumentStore for ManagedSearchStore {
    async fn add_document(&self, _document: Document) -> Result<()> {
        self.unavailable("add_document")
    }

    async fn add_documents(&self, _documents: Vec<Document>) -> Result<()> {
        self.unavailable("add_documents")
    }

    async fn similarity_search(&self, _query: &str, _k: usize) -> Result<Vec<SearchResult>> {
        self.unavailable("similarity_search")
    }

    async fn similarity_search_by_vector(
        &self,
        _vector: &[f32],
        _k: usize,
    ) -> Result<Vec<SearchResult>> {
        self.unavailable("similarity_search_by_vector")
    }

    async fn delete_document(&self, _id: &str) -> Result<()> {
        self.unavailable("delete_document")
    }

    async fn get_document(&self, _id: &str) -> Result<Option<Document>> {
        self.unavailable("get_document")
    }

    async fn list_documents(&self, _limit: usize, _offset: usize) -> Result<Vec<Document>> {
        self.unavailable("list_documents")
    }

    async fn health(&self) -> bool {
        false
    }
}
