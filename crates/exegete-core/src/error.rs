//! Error types shared by every layer of the retrieval engine.

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Retrieval engine error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ExegeteError {
    /// Missing or invalid configuration (raised at construction, never per call)
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Upstream embedding call failed or returned malformed data
    #[error("Provider error: {0}")]
    Provider(String),
    /// Backing store unreachable or not implemented
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    /// Caller supplied input the store cannot accept
    #[error("Validation error: {0}")]
    Validation(String),
    /// SQLite error from the local-index store
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, ExegeteError>;

impl ExegeteError {
    /// Short label used in logs and degraded-path reports
    pub fn kind(&self) -> &'static str {
        match self {
            ExegeteError::Configuration(_) => "configuration",
            ExegeteError::Provider(_) => "provider",
            ExegeteError::StoreUnavailable(_) => "store_unavailable",
            ExegeteError::Validation(_) => "validation",
            ExegeteError::Database(_) => "database",
            ExegeteError::Io(_) => "io",
            ExegeteError::Serialization(_) => "serialization",
        }
    }
}
