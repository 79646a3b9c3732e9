//! Ingestion
//!
//! Loads newline-delimited JSON seed files (`{id, content, metadata}` per line),
//! embeds the content and upserts the documents. Also re-embeds an existing
//! store after a model change.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::document::{Document, Metadata};
use crate::embeddings::EmbeddingProvider;
use crate::error::{ExegeteError, Result};
use crate::store::DocumentStore;

/// Records embedded per provider call
pub const SEED_BATCH_SIZE: usize = 32;

/// One line of a seed file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRecord {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Outcome of a seed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    /// Lines that parsed as records
    pub parsed: usize,
    /// Documents written to the store
    pub added: usize,
    /// Records dropped because embedding failed
    pub skipped: usize,
    /// Lines that were not valid records
    pub malformed: usize,
}

impl SeedReport {
    fn absorb(&mut self, other: SeedReport) {
        self.parsed += other.parsed;
        self.added += other.added;
        self.skipped += other.skipped;
        self.malformed += other.malformed;
    }
}

/// Seeds and re-embeds a [`DocumentStore`]
pub struct Ingestor {
    store: Arc<dyn DocumentStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl Ingestor {
    pub fn new(store: Arc<dyn DocumentStore>, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embeddings }
    }

    /// Seed from an NDJSON file
    pub async fn seed_file(&self, path: &Path) -> Result<SeedReport> {
        tracing::info!("Seeding {}", path.display());
        let file = tokio::fs::File::open(path).await?;
        let report = self.seed_reader(BufReader::new(file)).await?;
        tracing::info!(
            file = %path.display(),
            parsed = report.parsed,
            added = report.added,
            skipped = report.skipped,
            malformed = report.malformed,
            "Seed file complete"
        );
        Ok(report)
    }

    /// Seed from any buffered NDJSON source
    ///
    /// Fails up front with `StoreUnavailable` if the store is not healthy.
    /// Blank lines are ignored; malformed lines and records that cannot be
    /// embedded are counted and skipped.
    pub async fn seed_reader<R>(&self, reader: R) -> Result<SeedReport>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        if !self.store.health().await {
            return Err(ExegeteError::StoreUnavailable(
                "store failed its health check; refusing to seed".to_string(),
            ));
        }

        let mut report = SeedReport::default();
        let mut pending: Vec<SeedRecord> = Vec::with_capacity(SEED_BATCH_SIZE);
        let mut lines = reader.lines();
        let mut line_no = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<SeedRecord>(line) {
                Ok(record) => {
                    report.parsed += 1;
                    pending.push(record);
                }
                Err(e) => {
                    tracing::warn!("Skipping malformed seed line {}: {}", line_no, e);
                    report.malformed += 1;
                }
            }

            if pending.len() >= SEED_BATCH_SIZE {
                let batch = std::mem::take(&mut pending);
                report.absorb(self.ingest_batch(batch).await?);
                tracing::info!("Processed {} documents...", report.parsed);
            }
        }

        if !pending.is_empty() {
            report.absorb(self.ingest_batch(pending).await?);
        }
        Ok(report)
    }

    /// Embed and upsert one batch of records
    async fn ingest_batch(&self, records: Vec<SeedRecord>) -> Result<SeedReport> {
        let texts: Vec<String> = records.iter().map(|r| r.content.clone()).collect();
        let embedded = self.embed_with_fallback(&texts).await;

        let mut report = SeedReport::default();
        let mut documents = Vec::with_capacity(records.len());
        for (record, embedding) in records.into_iter().zip(embedded) {
            match embedding {
                Ok(embedding) => documents.push(Document {
                    id: record.id,
                    content: record.content,
                    metadata: record.metadata,
                    embedding,
                }),
                Err(e) => {
                    tracing::warn!("Error processing document {}: {}", record.id, e);
                    report.skipped += 1;
                }
            }
        }

        report.added = documents.len();
        if !documents.is_empty() {
            self.store.add_documents(documents).await?;
        }
        Ok(report)
    }

    /// One batch call; on failure, embed each text on its own
    async fn embed_with_fallback(&self, texts: &[String]) -> Vec<Result<Vec<f32>>> {
        match self.embeddings.embed_batch(texts).await {
            Ok(vectors) if vectors.len() == texts.len() => vectors.into_iter().map(Ok).collect(),
            Ok(vectors) => {
                tracing::warn!(
                    "Batch returned {} embeddings for {} texts, retrying one by one",
                    vectors.len(),
                    texts.len()
                );
                self.embed_each(texts).await
            }
            Err(e) => {
                tracing::warn!("Batch embedding failed ({}), retrying one by one", e);
                self.embed_each(texts).await
            }
        }
    }

    async fn embed_each(&self, texts: &[String]) -> Vec<Result<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embeddings.embed(text).await);
        }
        out
    }

    /// Re-embed every stored document with the current provider
    ///
    /// Pages through the store in listing order. Documents whose embedding
    /// fails keep their old vector and are counted as skipped.
    pub async fn reindex(&self, page_size: usize) -> Result<SeedReport> {
        if page_size == 0 {
            return Err(ExegeteError::Validation(
                "page size must be greater than zero".to_string(),
            ));
        }

        let mut report = SeedReport::default();
        let mut offset = 0;
        loop {
            let page = self.store.list_documents(page_size, offset).await?;
            if page.is_empty() {
                break;
            }
            let fetched = page.len();
            let records = page
                .into_iter()
                .map(|doc| SeedRecord {
                    id: doc.id,
                    content: doc.content,
                    metadata: doc.metadata,
                })
                .collect::<Vec<_>>();
            report.parsed += records.len();
            report.absorb(self.ingest_batch(records).await?);
            tracing::info!("Re-embedded {} documents...", report.added);

            if fetched < page_size {
                break;
            }
            offset += fetched;
        }
        Ok(report)
    }
}
