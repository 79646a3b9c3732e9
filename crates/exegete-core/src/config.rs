//! Runtime configuration
//!
//! A single [`Config`] value is built once at startup (from the environment or
//! a JSON file) and handed to the constructors that need it. Nothing else in
//! the crate reads process environment.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ExegeteError, Result};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default hosted embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Output dimensions of `text-embedding-3-small`
pub const DEFAULT_DIMENSIONS: usize = 1536;

/// Default fastembed model when the `local` provider is selected
pub const DEFAULT_LOCAL_MODEL: &str = "bge-small-en-v1.5";

/// Output dimensions of [`DEFAULT_LOCAL_MODEL`]
pub const DEFAULT_LOCAL_DIMENSIONS: usize = 384;

/// How many documents the keyword path scans per query
pub const DEFAULT_KEYWORD_SCAN_LIMIT: usize = 1000;

/// Keyword score discount when a document is found by both paths
pub const DEFAULT_HYBRID_KEYWORD_FACTOR: f32 = 0.8;

/// Keyword score penalty when a document lacks a semantic match
pub const DEFAULT_KEYWORD_ONLY_FACTOR: f32 = 0.6;

// ============================================================================
// OPTION ENUMS
// ============================================================================

/// Embedding provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// OpenAI-compatible `/embeddings` HTTP endpoint
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    /// fastembed ONNX model running in-process
    Local,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Local => write!(f, "local"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ExegeteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "open-ai" => Ok(ProviderKind::OpenAi),
            "local" | "fastembed" => Ok(ProviderKind::Local),
            other => Err(ExegeteError::Configuration(format!(
                "Unsupported embedding provider: {}",
                other
            ))),
        }
    }
}

/// Document store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VectorStoreKind {
    /// Pure in-process map with cosine / keyword fallback
    #[default]
    Memory,
    /// Full-text + vector search service (not implemented, fails closed)
    ManagedSearch,
    /// On-disk SQLite documents with an HNSW index
    LocalIndex,
}

impl std::fmt::Display for VectorStoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorStoreKind::Memory => write!(f, "memory"),
            VectorStoreKind::ManagedSearch => write!(f, "managed-search"),
            VectorStoreKind::LocalIndex => write!(f, "local-index"),
        }
    }
}

impl FromStr for VectorStoreKind {
    type Err = ExegeteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(VectorStoreKind::Memory),
            "managed-search" | "opensearch" => Ok(VectorStoreKind::ManagedSearch),
            "local-index" | "local" | "lancedb" => Ok(VectorStoreKind::LocalIndex),
            other => Err(ExegeteError::Configuration(format!(
                "Unknown vector store type: {}",
                other
            ))),
        }
    }
}

// ============================================================================
// CONFIG SECTIONS
// ============================================================================

/// Embedding provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: ProviderKind,
    pub model: String,
    /// Required for the `openai` provider
    pub api_key: Option<String>,
    /// Override for OpenAI-compatible gateways
    pub base_url: Option<String>,
    /// Expected output dimensions; `None` uses the model default
    pub dimensions: Option<usize>,
    /// Extra attempts after a failed HTTP call (0 = no retry)
    pub max_retries: u32,
    /// Query embedding LRU capacity (0 disables the cache)
    pub query_cache_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_key: None,
            base_url: None,
            dimensions: None,
            max_retries: 2,
            query_cache_size: 100,
        }
    }
}

/// Document store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: VectorStoreKind,
    /// Where `local-index` keeps its database; platform data dir when unset
    pub data_dir: Option<PathBuf>,
    /// Embedding dimensionality enforced by `local-index`
    pub dimensions: usize,
    /// Cluster URL for `managed-search`
    pub endpoint: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: VectorStoreKind::Memory,
            data_dir: None,
            dimensions: DEFAULT_DIMENSIONS,
            endpoint: None,
        }
    }
}

/// Hybrid merge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Upper bound on documents scanned by the keyword path
    pub keyword_scan_limit: usize,
    /// Multiplier on the keyword score for documents found by both paths
    pub hybrid_keyword_factor: f32,
    /// Multiplier on the keyword score for keyword-only documents
    pub keyword_only_factor: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            keyword_scan_limit: DEFAULT_KEYWORD_SCAN_LIMIT,
            hybrid_keyword_factor: DEFAULT_HYBRID_KEYWORD_FACTOR,
            keyword_only_factor: DEFAULT_KEYWORD_ONLY_FACTOR,
        }
    }
}

// ============================================================================
// CONFIG
// ============================================================================

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub store: StoreConfig,
    pub retrieval: RetrievalConfig,
}

impl Config {
    /// Build configuration from process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unset keys keep their defaults; set-but-invalid keys are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(provider) = get("EMBEDDING_PROVIDER") {
            config.embedding.provider = provider.parse()?;
        }
        match get("EMBEDDING_MODEL") {
            Some(model) => config.embedding.model = model,
            None if config.embedding.provider == ProviderKind::Local => {
                config.embedding.model = DEFAULT_LOCAL_MODEL.to_string();
                config.store.dimensions = DEFAULT_LOCAL_DIMENSIONS;
            }
            None => {}
        }
        config.embedding.api_key = get("OPENAI_API_KEY");
        config.embedding.base_url = get("OPENAI_BASE_URL");
        if let Some(dims) = get("EMBEDDING_DIMENSIONS") {
            let dims = parse_number::<usize>("EMBEDDING_DIMENSIONS", &dims)?;
            config.embedding.dimensions = Some(dims);
            config.store.dimensions = dims;
        }

        if let Some(kind) = get("VECTOR_STORE") {
            config.store.kind = kind.parse()?;
        }
        config.store.data_dir = get("EXEGETE_DATA_DIR").map(PathBuf::from);
        config.store.endpoint = get("OPENSEARCH_ENDPOINT");

        if let Some(limit) = get("KEYWORD_SCAN_LIMIT") {
            config.retrieval.keyword_scan_limit = parse_number("KEYWORD_SCAN_LIMIT", &limit)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no component could run with
    pub fn validate(&self) -> Result<()> {
        if self.store.dimensions == 0 {
            return Err(ExegeteError::Configuration(
                "store dimensions must be greater than zero".to_string(),
            ));
        }
        if self.embedding.dimensions == Some(0) {
            return Err(ExegeteError::Configuration(
                "embedding dimensions must be greater than zero".to_string(),
            ));
        }
        if self.embedding.model.trim().is_empty() {
            return Err(ExegeteError::Configuration(
                "embedding model must not be empty".to_string(),
            ));
        }
        if self.retrieval.keyword_scan_limit == 0 {
            return Err(ExegeteError::Configuration(
                "keyword scan limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        ExegeteError::Configuration(format!("{} must be a positive integer, got '{}'", key, value))
    })
}

// ============================================================================
// TESTS
// ============================================================================
