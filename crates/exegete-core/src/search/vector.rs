//! HNSW Vector Index
//!
//! USearch index keyed by the store's row sequence numbers. Scores are
//! approximate; callers that need exact cosine values re-score the candidates.

use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::error::{ExegeteError, Result};

// ============================================================================
// CONSTANTS
// ============================================================================

/// HNSW connectivity parameter (higher = better recall, more memory)
pub const DEFAULT_CONNECTIVITY: usize = 16;

/// HNSW expansion factor for index building
pub const DEFAULT_EXPANSION_ADD: usize = 128;

/// HNSW expansion factor for search (higher = better recall, slower)
pub const DEFAULT_EXPANSION_SEARCH: usize = 64;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for vector index
#[derive(Debug, Clone)]
pub struct VectorIndexConfig {
    pub dimensions: usize,
    pub connectivity: usize,
    pub expansion_add: usize,
    pub expansion_search: usize,
}

impl VectorIndexConfig {
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            connectivity: DEFAULT_CONNECTIVITY,
            expansion_add: DEFAULT_EXPANSION_ADD,
            expansion_search: DEFAULT_EXPANSION_SEARCH,
        }
    }
}

// ============================================================================
// VECTOR INDEX
// ============================================================================

/// Cosine HNSW index over `u64` keys
pub struct VectorIndex {
    index: Index,
    config: VectorIndexConfig,
}

impl VectorIndex {
    pub fn new(config: VectorIndexConfig) -> Result<Self> {
        let options = IndexOptions {
            dimensions: config.dimensions,
            metric: MetricKind::Cos,
            quantization: ScalarKind::F32,
            connectivity: config.connectivity,
            expansion_add: config.expansion_add,
            expansion_search: config.expansion_search,
            multi: false,
        };

        let index = Index::new(&options)
            .map_err(|e| ExegeteError::StoreUnavailable(format!("Index creation failed: {}", e)))?;

        Ok(Self { index, config })
    }

    pub fn len(&self) -> usize {
        self.index.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    /// Reserve room for `capacity` vectors; usearch requires this before `add`
    pub fn reserve(&self, capacity: usize) -> Result<()> {
        self.index.reserve(capacity).map_err(|e| {
            ExegeteError::StoreUnavailable(format!("Failed to reserve capacity: {}", e))
        })
    }

    /// Insert or replace the vector stored under `key`
    pub fn upsert(&mut self, key: u64, vector: &[f32]) -> Result<()> {
        if vector.len() != self.config.dimensions {
            return Err(ExegeteError::Validation(format!(
                "Invalid dimensions: expected {}, got {}",
                self.config.dimensions,
                vector.len()
            )));
        }

        if self.index.contains(key) {
            self.index
                .remove(key)
                .map_err(|e| ExegeteError::StoreUnavailable(format!("Failed to remove vector: {}", e)))?;
        }

        let capacity = self.index.capacity();
        if self.index.size() >= capacity {
            self.reserve(std::cmp::max(capacity * 2, 16))?;
        }

        self.index
            .add(key, vector)
            .map_err(|e| ExegeteError::StoreUnavailable(format!("Failed to add vector: {}", e)))
    }

    /// Remove a key; returns whether it was present
    pub fn remove(&mut self, key: u64) -> Result<bool> {
        if !self.index.contains(key) {
            return Ok(false);
        }
        self.index
            .remove(key)
            .map_err(|e| ExegeteError::StoreUnavailable(format!("Failed to remove vector: {}", e)))?;
        Ok(true)
    }

    pub fn contains(&self, key: u64) -> bool {
        self.index.contains(key)
    }

    /// Nearest keys with similarity `1 - cosine distance`, best first
    pub fn search(&self, query: &[f32], limit: usize) -> Result<Vec<(u64, f32)>> {
        if query.len() != self.config.dimensions {
            return Err(ExegeteError::Validation(format!(
                "Invalid dimensions: expected {}, got {}",
                self.config.dimensions,
                query.len()
            )));
        }
        if self.is_empty() || limit == 0 {
            return Ok(vec![]);
        }

        let matches = self
            .index
            .search(query, limit)
            .map_err(|e| ExegeteError::StoreUnavailable(format!("Search failed: {}", e)))?;

        Ok(matches
            .keys
            .iter()
            .zip(matches.distances.iter())
            .map(|(&key, &distance)| (key, 1.0 - distance))
            .collect())
    }
}
