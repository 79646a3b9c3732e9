//! LRU memo of embeddings keyed by input text

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lru::LruCache;

use super::EmbeddingProvider;
use crate::error::{ExegeteError, Result};

/// Wraps a provider so repeated queries skip the upstream call
pub struct CachedEmbeddings {
    inner: Arc<dyn EmbeddingProvider>,
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl CachedEmbeddings {
    /// Create with room for `capacity` entries (minimum 1)
    pub fn new(inner: Arc<dyn EmbeddingProvider>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lookup(&self, text: &str) -> Result<Option<Vec<f32>>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| ExegeteError::Provider("Query cache lock poisoned".to_string()))?;
        Ok(cache.get(text).cloned())
    }

    fn remember(&self, text: &str, vector: &[f32]) -> Result<()> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| ExegeteError::Provider("Query cache lock poisoned".to_string()))?;
        cache.put(text.to_string(), vector.to_vec());
        Ok(())
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EmbeddingProvider for CachedEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(hit) = self.lookup(text)? {
            return Ok(hit);
        }
        let vector = self.inner.embed(text).await?;
        self.remember(text, &vector)?;
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return self.inner.embed_batch(texts).await;
        }

        let mut slots: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut missing: Vec<String> = Vec::new();
        for text in texts {
            let hit = self.lookup(text)?;
            if hit.is_none() {
                missing.push(text.clone());
            }
            slots.push(hit);
        }

        if !missing.is_empty() {
            let fresh = self.inner.embed_batch(&missing).await?;
            if fresh.len() != missing.len() {
                return Err(ExegeteError::Provider(format!(
                    "expected {} embeddings, got {}",
                    missing.len(),
                    fresh.len()
                )));
            }
            let mut fresh = fresh.into_iter();
            for (slot, text) in slots.iter_mut().zip(texts) {
                if slot.is_none() {
                    if let Some(vector) = fresh.next() {
                        self.remember(text, &vector)?;
                        *slot = Some(vector);
                    }
                }
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
