//! Local Index Store
//!
//! Documents live in SQLite (WAL mode) under the data directory. Embeddings are
//! additionally loaded into an in-memory HNSW index at open, keyed by the row
//! sequence number, which also defines listing order.
//!
//! Candidates from the HNSW index are re-scored with exact cosine similarity so
//! scores are comparable with the in-memory store. Small stores, and candidate
//! lists that end in a tie, are answered by an exact scan so equal scores
//! always rank in insertion order.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use directories::ProjectDirs;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::DocumentStore;
use crate::document::{Document, Metadata, SearchResult};
use crate::embeddings::{EmbeddingProvider, cosine_similarity};
use crate::error::{ExegeteError, Result};
use crate::search::{VectorIndex, VectorIndexConfig};

/// Extra HNSW candidates fetched per requested result before exact re-scoring
const OVERSAMPLE: usize = 4;

/// Stores this small are scanned exactly instead of going through HNSW
const EXACT_SCAN_LIMIT: usize = 256;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    content TEXT NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}',
    embedding BLOB NOT NULL
);
CREATE TABLE IF NOT EXISTS store_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

const SELECT_COLUMNS: &str = "SELECT seq, id, content, metadata, embedding FROM documents";

// ============================================================================
// ENCODING
// ============================================================================

fn embedding_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn embedding_from_bytes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<(u64, Document)> {
    let seq: i64 = row.get(0)?;
    let metadata_json: String = row.get(3)?;
    let metadata: Metadata = serde_json::from_str(&metadata_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    let embedding: Vec<u8> = row.get(4)?;

    Ok((
        seq as u64,
        Document {
            id: row.get(1)?,
            content: row.get(2)?,
            metadata,
            embedding: embedding_from_bytes(&embedding),
        },
    ))
}

fn to_sql_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

// ============================================================================
// STORE
// ============================================================================

/// SQLite-backed store with an HNSW index over embeddings
pub struct LocalIndexStore {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    index: Mutex<VectorIndex>,
    embeddings: Arc<dyn EmbeddingProvider>,
    dimensions: usize,
    path: PathBuf,
}

impl LocalIndexStore {
    /// Open (or create) the store
    ///
    /// `data_dir` defaults to the platform data directory. Reopening a database
    /// created with a different dimensionality is a configuration error.
    pub fn open(
        data_dir: Option<PathBuf>,
        dimensions: usize,
        embeddings: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        if dimensions == 0 {
            return Err(ExegeteError::Configuration(
                "local-index dimensions must be greater than zero".to_string(),
            ));
        }

        let dir = match data_dir {
            Some(dir) => dir,
            None => ProjectDirs::from("rs", "exegete", "exegete")
                .ok_or_else(|| {
                    ExegeteError::Configuration(
                        "Could not determine project directories".to_string(),
                    )
                })?
                .data_dir()
                .to_path_buf(),
        };
        std::fs::create_dir_all(&dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700));
        }
        let path = dir.join("exegete.db");

        let writer = Connection::open(&path)?;
        Self::configure_connection(&writer)?;
        writer.execute_batch(SCHEMA)?;
        Self::check_dimensions(&writer, dimensions)?;

        let reader = Connection::open(&path)?;
        Self::configure_connection(&reader)?;

        let index = VectorIndex::new(VectorIndexConfig::with_dimensions(dimensions))?;

        let store = Self {
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
            index: Mutex::new(index),
            embeddings,
            dimensions,
            path,
        };
        let loaded = store.load_embeddings_into_index()?;
        tracing::info!(
            path = %store.path.display(),
            documents = loaded,
            dimensions,
            "Opened local-index store"
        );
        Ok(store)
    }

    /// Database file location
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Number of persisted documents
    pub fn count(&self) -> Result<usize> {
        let reader = self.reader()?;
        let n: i64 = reader.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    fn check_dimensions(conn: &Connection, dimensions: usize) -> Result<()> {
        let recorded: Option<String> = conn
            .query_row(
                "SELECT value FROM store_meta WHERE key = 'dimensions'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match recorded {
            Some(value) if value != dimensions.to_string() => Err(ExegeteError::Configuration(
                format!(
                    "index was built with {}-dimensional embeddings, configured for {}",
                    value, dimensions
                ),
            )),
            Some(_) => Ok(()),
            None => {
                conn.execute(
                    "INSERT INTO store_meta (key, value) VALUES ('dimensions', ?1)",
                    params![dimensions.to_string()],
                )?;
                Ok(())
            }
        }
    }

    fn writer(&self) -> Result<MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| ExegeteError::StoreUnavailable("Writer lock poisoned".into()))
    }

    fn reader(&self) -> Result<MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| ExegeteError::StoreUnavailable("Reader lock poisoned".into()))
    }

    fn index(&self) -> Result<MutexGuard<'_, VectorIndex>> {
        self.index
            .lock()
            .map_err(|_| ExegeteError::StoreUnavailable("Vector index lock poisoned".into()))
    }

    /// Rebuild the HNSW index from SQLite
    fn load_embeddings_into_index(&self) -> Result<usize> {
        let rows: Vec<(i64, Vec<u8>)> = {
            let reader = self.reader()?;
            let mut stmt = reader.prepare("SELECT seq, embedding FROM documents ORDER BY seq")?;
            stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<_>>()?
        };

        let mut index = self.index()?;
        index.reserve(rows.len().max(16))?;
        let mut loaded = 0;
        for (seq, bytes) in rows {
            let vector = embedding_from_bytes(&bytes);
            match index.upsert(seq as u64, &vector) {
                Ok(()) => loaded += 1,
                Err(e) => tracing::warn!("Failed to index document seq {}: {}", seq, e),
            }
        }
        Ok(loaded)
    }

    fn validate(&self, document: &Document) -> Result<()> {
        if document.id.is_empty() {
            return Err(ExegeteError::Validation("document id cannot be empty".into()));
        }
        if document.embedding.len() != self.dimensions {
            return Err(ExegeteError::Validation(format!(
                "document {} has {}-dimensional embedding, store expects {}",
                document.id,
                document.embedding.len(),
                self.dimensions
            )));
        }
        Ok(())
    }

    /// Upsert rows in one transaction, then mirror them into the index
    fn upsert_all(&self, documents: &[Document]) -> Result<()> {
        for document in documents {
            self.validate(document)?;
        }

        let mut keyed = Vec::with_capacity(documents.len());
        {
            let mut writer = self.writer()?;
            let tx = writer.transaction()?;
            {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO documents (id, content, metadata, embedding)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(id) DO UPDATE SET
                         content = excluded.content,
                         metadata = excluded.metadata,
                         embedding = excluded.embedding
                     RETURNING seq",
                )?;
                for document in documents {
                    let metadata = serde_json::to_string(&document.metadata)?;
                    let seq: i64 = stmt.query_row(
                        params![
                            document.id,
                            document.content,
                            metadata,
                            embedding_to_bytes(&document.embedding)
                        ],
                        |row| row.get(0),
                    )?;
                    keyed.push((seq as u64, document));
                }
            }
            tx.commit()?;
        }

        let mut index = self.index()?;
        for (seq, document) in keyed {
            index.upsert(seq, &document.embedding)?;
        }
        Ok(())
    }

    fn fetch_by_seq(&self, seqs: &[u64]) -> Result<Vec<(u64, Document)>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare_cached(&format!("{} WHERE seq = ?1", SELECT_COLUMNS))?;
        let mut found = Vec::with_capacity(seqs.len());
        for &seq in seqs {
            if let Some(row) = stmt
                .query_row(params![seq as i64], row_to_document)
                .optional()?
            {
                found.push(row);
            }
        }
        Ok(found)
    }

    /// Score every stored embedding; ties keep insertion order
    fn exact_search(&self, vector: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let mut scored: Vec<(u64, f32)> = {
            let reader = self.reader()?;
            let mut stmt =
                reader.prepare_cached("SELECT seq, embedding FROM documents ORDER BY seq")?;
            stmt.query_map([], |row| {
                let seq: i64 = row.get(0)?;
                let bytes: Vec<u8> = row.get(1)?;
                Ok((seq as u64, cosine_similarity(vector, &embedding_from_bytes(&bytes))))
            })?
            .collect::<rusqlite::Result<_>>()?
        };

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        let seqs: Vec<u64> = scored.iter().map(|(seq, _)| *seq).collect();
        Ok(self
            .fetch_by_seq(&seqs)?
            .into_iter()
            .map(|(_, doc)| {
                let score = cosine_similarity(vector, &doc.embedding);
                SearchResult::new(doc, score)
            })
            .collect())
    }
}

#[async_trait]
impl DocumentStore for LocalIndexStore {
    async fn add_document(&self, document: Document) -> Result<()> {
        self.upsert_all(std::slice::from_ref(&document))
    }

    async fn add_documents(&self, documents: Vec<Document>) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        self.upsert_all(&documents)?;
        tracing::debug!(count = documents.len(), "Upserted documents");
        Ok(())
    }

    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embeddings.embed(query).await?;
        self.similarity_search_by_vector(&vector, k).await
    }

    async fn similarity_search_by_vector(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        if vector.len() != self.dimensions {
            tracing::debug!(
                expected = self.dimensions,
                got = vector.len(),
                "Query vector dimension mismatch, no results"
            );
            return Ok(Vec::new());
        }

        let (limit, candidates) = {
            let index = self.index()?;
            if index.len() <= EXACT_SCAN_LIMIT {
                drop(index);
                return self.exact_search(vector, k);
            }
            let limit = k.saturating_mul(OVERSAMPLE).min(index.len());
            (limit, index.search(vector, limit)?)
        };
        let seqs: Vec<u64> = candidates.into_iter().map(|(seq, _)| seq).collect();

        let mut scored: Vec<(u64, SearchResult)> = self
            .fetch_by_seq(&seqs)?
            .into_iter()
            .map(|(seq, doc)| {
                let score = cosine_similarity(vector, &doc.embedding);
                (seq, SearchResult::new(doc, score))
            })
            .collect();

        scored.sort_by(|(seq_a, a), (seq_b, b)| {
            b.score.total_cmp(&a.score).then(seq_a.cmp(seq_b))
        });

        // a tie at the end of the candidate list may continue past it
        let boundary_tied = scored.len() >= k
            && scored
                .last()
                .is_some_and(|(_, last)| last.score.total_cmp(&scored[k - 1].1.score).is_eq());
        if scored.len() < limit || boundary_tied {
            tracing::debug!(
                candidates = scored.len(),
                limit,
                "HNSW candidates inconclusive, falling back to exact scan"
            );
            return self.exact_search(vector, k);
        }

        scored.truncate(k);
        Ok(scored.into_iter().map(|(_, result)| result).collect())
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        let removed: Option<i64> = {
            let writer = self.writer()?;
            writer
                .query_row(
                    "DELETE FROM documents WHERE id = ?1 RETURNING seq",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?
        };
        if let Some(seq) = removed {
            self.index()?.remove(seq as u64)?;
        }
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare_cached(&format!("{} WHERE id = ?1", SELECT_COLUMNS))?;
        let found = stmt
            .query_row(params![id], row_to_document)
            .optional()?;
        Ok(found.map(|(_, doc)| doc))
    }

    async fn list_documents(&self, limit: usize, offset: usize) -> Result<Vec<Document>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare_cached(&format!(
            "{} ORDER BY seq LIMIT ?1 OFFSET ?2",
            SELECT_COLUMNS
        ))?;
        let documents = stmt
            .query_map(
                params![to_sql_count(limit), to_sql_count(offset)],
                row_to_document,
            )?
            .map(|row| row.map(|(_, doc)| doc))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(documents)
    }

    async fn health(&self) -> bool {
        match self.reader() {
            Ok(reader) => reader
                .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .is_ok(),
            Err(_) => false,
        }
    }
}
