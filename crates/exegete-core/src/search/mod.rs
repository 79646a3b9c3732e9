//! Search Module
//!
//! - Keyword scoring over stored content and metadata
//! - HNSW vector index (feature `vector-search`)
//! - Hybrid retriever merging both paths

mod hybrid;
mod keyword;

#[cfg(feature = "vector-search")]
mod vector;

pub use hybrid::{DegradedPath, HybridRetriever, Retrieval, merge_results};
pub use keyword::{CONTENT_WEIGHT, KeywordScorer, METADATA_WEIGHT, MIN_KEYWORD_LEN};

#[cfg(feature = "vector-search")]
pub use vector::{
    DEFAULT_CONNECTIVITY, DEFAULT_EXPANSION_ADD, DEFAULT_EXPANSION_SEARCH, VectorIndex,
    VectorIndexConfig,
};
