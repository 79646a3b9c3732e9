//! OpenAI-compatible embedding provider
//!
//! Posts `{model, input}` to `{base_url}/embeddings` with bearer auth.
//! Transient failures (network errors, 429, 5xx) are retried with exponential
//! backoff up to `max_retries` extra attempts; everything else surfaces
//! immediately as a provider error. Returned vectors must have the configured
//! dimensionality.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::config::{DEFAULT_DIMENSIONS, EmbeddingConfig};
use crate::error::{ExegeteError, Result};

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Backoff before the first retry; doubles on each further attempt
const BASE_BACKOFF_MS: u64 = 100;

/// Ceiling on a single backoff
const MAX_BACKOFF_MS: u64 = 10_000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Output size of the hosted models, when the request does not shorten it
fn native_dimensions(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-small" | "text-embedding-ada-002" => Some(DEFAULT_DIMENSIONS),
        "text-embedding-3-large" => Some(3072),
        _ => None,
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt);
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    #[serde(default)]
    embedding: Vec<f32>,
    index: Option<usize>,
}

/// Outcome of a single HTTP attempt
enum Attempt {
    Done(Vec<Vec<f32>>),
    Retryable(ExegeteError),
    Fatal(ExegeteError),
}

/// Embedding provider for OpenAI and compatible gateways
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
    /// Sent upstream only when the caller asked for a non-default size
    requested_dimensions: Option<usize>,
    max_retries: u32,
}

impl OpenAiEmbeddings {
    /// Build from configuration; fails when no API key is configured
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ExegeteError::Configuration(
                    "OPENAI_API_KEY is required for the openai embedding provider".to_string(),
                )
            })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExegeteError::Configuration(format!("HTTP client: {}", e)))?;

        let dimensions = config
            .dimensions
            .or_else(|| native_dimensions(&config.model))
            .ok_or_else(|| {
                ExegeteError::Configuration(format!(
                    "unknown output size for embedding model {}; set EMBEDDING_DIMENSIONS",
                    config.model
                ))
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            dimensions,
            requested_dimensions: config.dimensions,
            max_retries: config.max_retries,
        })
    }

    /// Full URL requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(ExegeteError::Provider(
                "cannot embed an empty batch".to_string(),
            ));
        }

        let mut attempt = 0u32;
        loop {
            match self.send_once(texts).await {
                Attempt::Done(vectors) => return Ok(vectors),
                Attempt::Fatal(e) => return Err(e),
                Attempt::Retryable(e) if attempt >= self.max_retries => return Err(e),
                Attempt::Retryable(e) => {
                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Embedding request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn send_once(&self, texts: &[String]) -> Attempt {
        let body = EmbedRequest {
            model: &self.model,
            input: texts,
            dimensions: self.requested_dimensions,
        };

        let response = match self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return Attempt::Retryable(ExegeteError::Provider(format!("HTTP error: {}", e))),
        };

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let err = ExegeteError::Provider(format!("API returned {}: {}", status, detail));
            if status.as_u16() == 429 || status.is_server_error() {
                return Attempt::Retryable(err);
            }
            return Attempt::Fatal(err);
        }

        let parsed: EmbedResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                return Attempt::Fatal(ExegeteError::Provider(format!(
                    "Invalid response from embeddings API: {}",
                    e
                )));
            }
        };

        match order_embeddings(parsed, texts.len(), self.dimensions) {
            Ok(vectors) => Attempt::Done(vectors),
            Err(e) => Attempt::Fatal(e),
        }
    }
}

/// Put response rows back in input order and reject malformed payloads
fn order_embeddings(
    response: EmbedResponse,
    expected: usize,
    dimensions: usize,
) -> Result<Vec<Vec<f32>>> {
    if response.data.len() != expected {
        return Err(ExegeteError::Provider(format!(
            "Invalid response from embeddings API: expected {} embeddings, got {}",
            expected,
            response.data.len()
        )));
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for (position, row) in response.data.into_iter().enumerate() {
        let index = row.index.unwrap_or(position);
        if index >= expected || slots[index].is_some() {
            return Err(ExegeteError::Provider(format!(
                "Invalid response from embeddings API: bad index {}",
                index
            )));
        }
        if row.embedding.is_empty() {
            return Err(ExegeteError::Provider(format!(
                "Invalid response from embeddings API: empty embedding at {}",
                index
            )));
        }
        if row.embedding.len() != dimensions {
            return Err(ExegeteError::Provider(format!(
                "Invalid response from embeddings API: {}-dimensional embedding at {}, expected {}",
                row.embedding.len(),
                index,
                dimensions
            )));
        }
        slots[index] = Some(row.embedding);
    }

    // Every slot is filled: `expected` rows with distinct in-range indices
    Ok(slots.into_iter().flatten().collect())
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request_embeddings(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| ExegeteError::Provider("No embedding generated".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.request_embeddings(texts).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// TESTS
// ============================================================================
