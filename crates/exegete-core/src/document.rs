//! Document model
//!
//! Documents are created by the ingestion step and are immutable afterwards;
//! an update is a delete followed by an add.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// DOCUMENT
// ============================================================================

/// Free-form annotations (book, chapter, verse, strongs, ...)
pub type Metadata = Map<String, Value>;

/// A passage or word-study document with its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier
    pub id: String,
    /// Text that is embedded and keyword-matched
    pub content: String,
    /// Arbitrary key-value annotations
    #[serde(default)]
    pub metadata: Metadata,
    /// Embedding vector; dimensionality is fixed per store
    #[serde(default)]
    pub embedding: Vec<f32>,
}

impl Document {
    /// Create a document without metadata
    pub fn new(id: impl Into<String>, content: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: Metadata::new(),
            embedding,
        }
    }

    /// Builder-style metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Metadata flattened to a single lower-cased string for lexical matching
    pub fn metadata_text(&self) -> String {
        Value::Object(self.metadata.clone())
            .to_string()
            .to_lowercase()
    }
}

// ============================================================================
// SEARCH RESULTS
// ============================================================================

/// A store-level hit. The score domain depends on which search produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: Document,
    pub score: f32,
}

impl SearchResult {
    pub fn new(document: Document, score: f32) -> Self {
        Self { document, score }
    }
}

/// Which retrieval path produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMethod {
    /// Dense embedding similarity only
    Vector,
    /// Lexical overlap only
    Keyword,
    /// Found by both paths
    Hybrid,
}

impl std::fmt::Display for RetrievalMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrievalMethod::Vector => write!(f, "vector"),
            RetrievalMethod::Keyword => write!(f, "keyword"),
            RetrievalMethod::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// A ranked result returned by the hybrid retriever
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResult {
    pub document: Document,
    pub score: f32,
    pub retrieval_method: RetrievalMethod,
}

// ============================================================================
// TESTS
// ============================================================================
