//! In-memory document store
//!
//! Pure in-process map. Nothing is persisted; a restart loses every document.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::{DocumentStore, top_k};
use crate::document::{Document, SearchResult};
use crate::embeddings::cosine_similarity;
use crate::error::{ExegeteError, Result};

#[derive(Default)]
struct Inner {
    /// Ids in first-insertion order
    order: Vec<String>,
    documents: HashMap<String, Document>,
}

impl Inner {
    fn upsert(&mut self, document: Document) {
        if !self.documents.contains_key(&document.id) {
            self.order.push(document.id.clone());
        }
        self.documents.insert(document.id.clone(), document);
    }

    fn iter(&self) -> impl Iterator<Item = &Document> {
        self.order.iter().filter_map(|id| self.documents.get(id))
    }
}

/// Insertion-ordered store behind a `RwLock`
///
/// Overwriting an id keeps its original position. `similarity_search` does not
/// embed the query; it scores by whole-word overlap with the stored content.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.order.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| ExegeteError::StoreUnavailable("Memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| ExegeteError::StoreUnavailable("Memory store lock poisoned".into()))
    }
}

/// Fraction of query words (longer than two chars) found as whole words in `content`
fn text_similarity(query_words: &[String], content: &str) -> f32 {
    if query_words.is_empty() {
        return 0.0;
    }
    let content = content.to_lowercase();
    let content_words: Vec<&str> = content.split_whitespace().collect();
    let matches = query_words
        .iter()
        .filter(|word| content_words.contains(&word.as_str()))
        .count();
    matches as f32 / query_words.len() as f32
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn add_document(&self, document: Document) -> Result<()> {
        self.write()?.upsert(document);
        Ok(())
    }

    async fn add_documents(&self, documents: Vec<Document>) -> Result<()> {
        let mut inner = self.write()?;
        for document in documents {
            inner.upsert(document);
        }
        Ok(())
    }

    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let query_words: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .filter(|word| word.chars().count() > 2)
            .map(str::to_string)
            .collect();
        if query_words.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let inner = self.read()?;
        let hits = inner
            .iter()
            .filter_map(|doc| {
                let score = text_similarity(&query_words, &doc.content);
                (score > 0.0).then(|| SearchResult::new(doc.clone(), score))
            })
            .collect();
        Ok(top_k(hits, k))
    }

    async fn similarity_search_by_vector(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let inner = self.read()?;
        let hits = inner
            .iter()
            .map(|doc| SearchResult::new(doc.clone(), cosine_similarity(vector, &doc.embedding)))
            .collect();
        Ok(top_k(hits, k))
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        let mut inner = self.write()?;
        if inner.documents.remove(id).is_some() {
            inner.order.retain(|existing| existing != id);
        }
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.read()?.documents.get(id).cloned())
    }

    async fn list_documents(&self, limit: usize, offset: usize) -> Result<Vec<Document>> {
        Ok(self
            .read()?
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn health(&self) -> bool {
        self.inner.read().is_ok()
    }
}
