//! Mock Embedding Providers
//!
//! Deterministic stand-ins for hosted or ONNX models:
//! - [`ConceptEmbeddings`]: bag-of-concepts vectors, so synonyms land close together
//! - [`FailingEmbeddings`]: every call is a provider error
//! - [`FlakyEmbeddings`]: batch calls fail, single calls succeed

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use exegete_core::{EmbeddingProvider, ExegeteError, Result};

/// Concept axes and the words that load onto them
const CONCEPTS: &[&[&str]] = &[
    &["love", "loved", "loves", "agape", "phileo", "charity"],
    &["shepherd", "flock", "sheep", "pasture", "raah"],
    &["light", "lamp", "shine"],
    &["word", "logos", "saying", "scripture"],
    &["faith", "believe", "believes", "pistis", "trust", "belief"],
    &["beginning", "created", "heavens", "earth", "bara"],
    &["grace", "mercy", "charis", "saved"],
    &["god", "lord", "elohim", "theos"],
];

/// Dimensionality of [`ConceptEmbeddings`]
pub const CONCEPT_DIMENSIONS: usize = CONCEPTS.len();

/// Counts concept words per axis
#[derive(Debug, Default)]
pub struct ConceptEmbeddings {
    calls: AtomicUsize,
}

impl ConceptEmbeddings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `embed` + `embed_batch` calls served
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Synchronous embedding, for building fixtures
    pub fn vector_for(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; CONCEPT_DIMENSIONS];
        let lower = text.to_lowercase();
        for token in lower.split(|c: char| !c.is_alphanumeric()) {
            for (axis, words) in CONCEPTS.iter().enumerate() {
                if words.contains(&token) {
                    vector[axis] += 1.0;
                }
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for ConceptEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(ExegeteError::Provider("cannot embed an empty batch".into()));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }

    fn dimensions(&self) -> usize {
        CONCEPT_DIMENSIONS
    }

    fn model_name(&self) -> &str {
        "concept-bag"
    }
}

/// Always fails, like an upstream outage
#[derive(Debug, Clone)]
pub struct FailingEmbeddings {
    dimensions: usize,
}

impl FailingEmbeddings {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for FailingEmbeddings {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(ExegeteError::Provider("embedding API returned 503".into()))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(ExegeteError::Provider("embedding API returned 503".into()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "unavailable"
    }
}

/// Batch endpoint broken, single-text endpoint healthy
#[derive(Debug, Default)]
pub struct FlakyEmbeddings {
    batch_attempts: AtomicUsize,
    single_calls: AtomicUsize,
}

impl FlakyEmbeddings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_attempts(&self) -> usize {
        self.batch_attempts.load(Ordering::SeqCst)
    }

    pub fn single_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ConceptEmbeddings::vector_for(text))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batch_attempts.fetch_add(1, Ordering::SeqCst);
        Err(ExegeteError::Provider("batch request timed out".into()))
    }

    fn dimensions(&self) -> usize {
        CONCEPT_DIMENSIONS
    }

    fn model_name(&self) -> &str {
        "flaky"
    }
}
