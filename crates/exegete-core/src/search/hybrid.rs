//! Hybrid Retrieval (Vector + Keyword)
//!
//! Runs dense vector search and lexical keyword search concurrently, then
//! merges by document id with a discounted keyword score:
//!
//! | found by      | method    | score                          |
//! |---------------|-----------|--------------------------------|
//! | vector only   | `vector`  | vector score                   |
//! | keyword only  | `keyword` | keyword × 0.6                  |
//! | both          | `hybrid`  | max(vector, keyword × 0.8)     |
//!
//! Raw scores from the two paths are never compared before the discount.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::KeywordScorer;
use crate::config::RetrievalConfig;
use crate::document::{RetrievalMethod, RetrievalResult, SearchResult};
use crate::embeddings::EmbeddingProvider;
use crate::error::Result;
use crate::store::DocumentStore;

// ============================================================================
// MERGE
// ============================================================================

/// Merge vector and keyword hits into a single ranked list of at most `k`
///
/// Documents keep first-seen order (vector hits, then keyword-only hits) so
/// equal scores rank stably.
pub fn merge_results(
    vector: Vec<SearchResult>,
    keyword: Vec<SearchResult>,
    k: usize,
    config: &RetrievalConfig,
) -> Vec<RetrievalResult> {
    let mut merged: Vec<RetrievalResult> = Vec::with_capacity(vector.len() + keyword.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for hit in vector {
        if positions.contains_key(&hit.document.id) {
            continue;
        }
        positions.insert(hit.document.id.clone(), merged.len());
        merged.push(RetrievalResult {
            document: hit.document,
            score: hit.score,
            retrieval_method: RetrievalMethod::Vector,
        });
    }

    for hit in keyword {
        match positions.get(&hit.document.id) {
            Some(&at) => {
                let entry = &mut merged[at];
                if entry.retrieval_method == RetrievalMethod::Vector {
                    entry.score = entry.score.max(hit.score * config.hybrid_keyword_factor);
                    entry.retrieval_method = RetrievalMethod::Hybrid;
                }
            }
            None => {
                positions.insert(hit.document.id.clone(), merged.len());
                merged.push(RetrievalResult {
                    document: hit.document,
                    score: hit.score * config.keyword_only_factor,
                    retrieval_method: RetrievalMethod::Keyword,
                });
            }
        }
    }

    merged.sort_by(|a, b| b.score.total_cmp(&a.score));
    merged.truncate(k);
    merged
}

// ============================================================================
// RETRIEVER
// ============================================================================

/// Sub-path that failed during a degraded retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path", content = "error", rename_all = "lowercase")]
pub enum DegradedPath {
    Vector(String),
    Keyword(String),
}

/// Ranked results plus any sub-path failure that was absorbed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Retrieval {
    pub results: Vec<RetrievalResult>,
    pub degraded: Option<DegradedPath>,
}

/// Orchestrates vector and keyword search over a [`DocumentStore`]
#[derive(Clone)]
pub struct HybridRetriever {
    store: Arc<dyn DocumentStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    config: RetrievalConfig,
}

impl HybridRetriever {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embeddings,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn embeddings(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embeddings
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Top `k` results for `query`
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        Ok(self.retrieve_detailed(query, k).await?.results)
    }

    /// Like [`retrieve`](Self::retrieve), also reporting an absorbed sub-path failure
    ///
    /// If exactly one path fails the other's results are merged alone. If both
    /// fail, the vector-path error is returned.
    pub async fn retrieve_detailed(&self, query: &str, k: usize) -> Result<Retrieval> {
        if query.trim().is_empty() || k == 0 {
            return Ok(Retrieval::default());
        }

        let (vector, keyword) = tokio::join!(self.vector_path(query, k), self.keyword_path(query, k));

        let (vector, keyword, degraded) = match (vector, keyword) {
            (Ok(vector), Ok(keyword)) => (vector, keyword, None),
            (Ok(vector), Err(e)) => {
                tracing::warn!(error = %e, kind = e.kind(), "Keyword path failed, using vector results only");
                (vector, Vec::new(), Some(DegradedPath::Keyword(e.to_string())))
            }
            (Err(e), Ok(keyword)) => {
                tracing::warn!(error = %e, kind = e.kind(), "Vector path failed, using keyword results only");
                (Vec::new(), keyword, Some(DegradedPath::Vector(e.to_string())))
            }
            (Err(vector_err), Err(keyword_err)) => {
                tracing::warn!(error = %keyword_err, "Keyword path failed");
                return Err(vector_err);
            }
        };

        tracing::debug!(
            vector_hits = vector.len(),
            keyword_hits = keyword.len(),
            k,
            "Merging retrieval paths"
        );

        Ok(Retrieval {
            results: merge_results(vector, keyword, k, &self.config),
            degraded,
        })
    }

    /// Vector path only; every result is tagged `vector`
    pub async fn retrieve_by_vector(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        Ok(self
            .store
            .similarity_search_by_vector(vector, k)
            .await?
            .into_iter()
            .map(|hit| RetrievalResult {
                document: hit.document,
                score: hit.score,
                retrieval_method: RetrievalMethod::Vector,
            })
            .collect())
    }

    async fn vector_path(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let vector = self.embeddings.embed(query).await?;
        self.store.similarity_search_by_vector(&vector, k).await
    }

    async fn keyword_path(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let scorer = KeywordScorer::new(query);
        if scorer.is_empty() {
            return Ok(Vec::new());
        }
        let documents = self
            .store
            .list_documents(self.config.keyword_scan_limit, 0)
            .await?;
        Ok(scorer.rank(&documents, k))
    }
}
