//! # Exegete Core
//!
//! Hybrid retrieval engine for scripture passages and original-language word
//! studies. Dense vector similarity and lexical keyword matching are combined
//! into one ranked list over a pluggable document store:
//!
//! - **Document stores**: in-memory map, or SQLite + USearch HNSW on disk
//! - **Embeddings**: any OpenAI-compatible endpoint, or local fastembed models
//! - **Keyword scoring**: exact-term recall for Strong's numbers and proper nouns
//! - **Hybrid merge**: keyword scores discounted before they compete with cosine scores
//! - **Graceful degradation**: one failed search path never sinks the other
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use exegete_core::prelude::*;
//!
//! let config = Config::from_env()?;
//! let embeddings = build_provider(&config.embedding)?;
//! let store = open_store(&config.store, embeddings.clone())?;
//!
//! Ingestor::new(store.clone(), embeddings.clone())
//!     .seed_file(Path::new("data/seed/verses.jsonl"))
//!     .await?;
//!
//! let retriever = HybridRetriever::new(store, embeddings, config.retrieval);
//! for hit in retriever.retrieve("agape love", 5).await? {
//!     println!("{} {:.3} {}", hit.document.id, hit.score, hit.retrieval_method);
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `embeddings` (default): local embedding generation with fastembed
//! - `vector-search` (default): USearch HNSW index behind the `local-index` store
//! - `bundled-sqlite` (default): compile SQLite in rather than linking the system library

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod context;
pub mod document;
pub mod embeddings;
pub mod error;
pub mod ingest;
pub mod search;
pub mod store;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use config::{
    Config, EmbeddingConfig, ProviderKind, RetrievalConfig, StoreConfig, VectorStoreKind,
};
pub use context::{ContextSnippet, assemble_context};
pub use document::{Document, Metadata, RetrievalMethod, RetrievalResult, SearchResult};
pub use embeddings::{
    CachedEmbeddings, EmbeddingProvider, OpenAiEmbeddings, build_provider, cosine_similarity,
};
pub use error::{ExegeteError, Result};
pub use ingest::{Ingestor, SeedRecord, SeedReport};
pub use search::{DegradedPath, HybridRetriever, KeywordScorer, Retrieval, merge_results};
pub use store::{DocumentStore, ManagedSearchStore, MemoryStore, open_store};

#[cfg(feature = "embeddings")]
pub use embeddings::LocalEmbeddings;

#[cfg(feature = "vector-search")]
pub use store::LocalIndexStore;

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of results returned by a retrieval
pub const DEFAULT_TOP_K: usize = 5;

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        Config, Document, DocumentStore, EmbeddingProvider, ExegeteError, HybridRetriever,
        Ingestor, Result, RetrievalMethod, RetrievalResult, SearchResult, assemble_context,
        build_provider, open_store,
    };
}
