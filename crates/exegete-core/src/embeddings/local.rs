//! Local Embeddings
//!
//! Uses fastembed v5 for in-process ONNX inference. No API key, no network
//! access after the first model download.
//!
//! ## Models
//!
//! - **Default**: BGE Small EN v1.5 (384d)
//! - BGE Base EN v1.5 (768d), all-MiniLM-L6-v2 (384d)
//! - Nomic Embed Text v1.5 (768d, Matryoshka; may be truncated via `dimensions`)

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::{EmbeddingProvider, matryoshka_truncate};
use crate::config::{DEFAULT_LOCAL_MODEL, EmbeddingConfig};
use crate::error::{ExegeteError, Result};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Maximum text length for embedding (truncated if longer)
pub const MAX_TEXT_LENGTH: usize = 8192;

/// Batch size for efficient embedding generation
pub const BATCH_SIZE: usize = 32;

/// Resolve a configured model name to a fastembed model and its native size
fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize)> {
    match name.trim().to_lowercase().as_str() {
        "bge-small-en-v1.5" | "baai/bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" | "baai/bge-base-en-v1.5" => Ok((EmbeddingModel::BGEBaseENV15, 768)),
        "all-minilm-l6-v2" | "sentence-transformers/all-minilm-l6-v2" => {
            Ok((EmbeddingModel::AllMiniLML6V2, 384))
        }
        "nomic-embed-text-v1.5" | "nomic-ai/nomic-embed-text-v1.5" => {
            Ok((EmbeddingModel::NomicEmbedTextV15, 768))
        }
        other => Err(ExegeteError::Configuration(format!(
            "Unsupported local embedding model: {} (try {})",
            other, DEFAULT_LOCAL_MODEL
        ))),
    }
}

/// Get the default cache directory for fastembed models
/// Uses FASTEMBED_CACHE_PATH env var, or falls back to platform cache directory
fn get_cache_dir() -> PathBuf {
    if let Ok(path) = std::env::var("FASTEMBED_CACHE_PATH") {
        return PathBuf::from(path);
    }

    // Linux: ~/.cache/exegete/fastembed
    if let Some(proj_dirs) = directories::ProjectDirs::from("rs", "exegete", "exegete") {
        return proj_dirs.cache_dir().join("fastembed");
    }

    if let Some(base_dirs) = directories::BaseDirs::new() {
        return base_dirs.home_dir().join(".cache/exegete/fastembed");
    }

    PathBuf::from(".fastembed_cache")
}

/// Same rules for `embed` and `embed_batch`: no empty batch, no empty text
fn check_inputs(texts: &[String]) -> Result<()> {
    if texts.is_empty() {
        return Err(ExegeteError::Provider(
            "cannot embed an empty batch".to_string(),
        ));
    }
    if let Some(position) = texts.iter().position(|t| t.is_empty()) {
        return Err(ExegeteError::Provider(format!(
            "Text cannot be empty (batch position {})",
            position
        )));
    }
    Ok(())
}

fn truncate_text(text: &str) -> &str {
    if text.len() <= MAX_TEXT_LENGTH {
        return text;
    }
    let mut end = MAX_TEXT_LENGTH;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

// ============================================================================
// LOCAL PROVIDER
// ============================================================================

/// fastembed-backed provider; inference runs on the blocking thread pool
pub struct LocalEmbeddings {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    native_dimensions: usize,
    dimensions: usize,
}

impl LocalEmbeddings {
    /// Load (downloading if needed) the configured model
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let (model, native_dimensions) = resolve_model(&config.model)?;
        let dimensions = config
            .dimensions
            .unwrap_or(native_dimensions)
            .min(native_dimensions);

        let cache_dir = get_cache_dir();
        if let Err(e) = std::fs::create_dir_all(&cache_dir) {
            tracing::warn!("Failed to create cache directory {:?}: {}", cache_dir, e);
        }

        let options = InitOptions::new(model)
            .with_show_download_progress(false)
            .with_cache_dir(cache_dir);

        let embedding = TextEmbedding::try_new(options).map_err(|e| {
            ExegeteError::Configuration(format!(
                "Failed to initialize {} embedding model: {}. \
                Ensure ONNX runtime is available and model files can be downloaded.",
                config.model, e
            ))
        })?;

        Ok(Self {
            model: Arc::new(Mutex::new(embedding)),
            model_name: config.model.clone(),
            native_dimensions,
            dimensions,
        })
    }

    async fn run(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.model);
        let expected = texts.len();

        let raw = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|e| ExegeteError::Provider(format!("Lock poisoned: {}", e)))?;
            let inputs: Vec<&str> = texts.iter().map(|t| truncate_text(t)).collect();
            model
                .embed(inputs, Some(BATCH_SIZE))
                .map_err(|e| ExegeteError::Provider(format!("Embedding generation failed: {}", e)))
        })
        .await
        .map_err(|e| ExegeteError::Provider(format!("Embedding task failed: {}", e)))??;

        if raw.len() != expected || raw.iter().any(|v| v.is_empty()) {
            return Err(ExegeteError::Provider(format!(
                "expected {} embeddings from {}, got {}",
                expected,
                self.model_name,
                raw.len()
            )));
        }

        if self.dimensions == self.native_dimensions {
            return Ok(raw);
        }
        Ok(raw
            .into_iter()
            .map(|v| matryoshka_truncate(v, self.dimensions))
            .collect())
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let texts = vec![text.to_string()];
        check_inputs(&texts)?;
        let mut vectors = self.run(texts).await?;
        vectors
            .pop()
            .ok_or_else(|| ExegeteError::Provider("No embedding generated".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        check_inputs(texts)?;
        self.run(texts.to_vec()).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
