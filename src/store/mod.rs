//! SQLite-backed vector store.
//!
//! Chunks and their embedding vectors live in a single SQLite file under a
//! named collection. Similarity search embeds the query through the same
//! provider used at ingest time and ranks chunks by cosine distance
//! (lower is better) with a brute-force scan, which is plenty for a
//! personal document corpus.

mod schema;

use std::path::Path;
use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use time::OffsetDateTime;

use schema::INITIAL_SCHEMA;

use crate::answerer::ScoredChunk;
use crate::provider::{Embedder, LlmError};

/// Errors from the vector store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite failures.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The embedding backend failed while embedding a query.
    #[error("Embedding failed: {0}")]
    Embedding(#[from] LlmError),

    /// A stored vector and the query vector have different dimensions.
    #[error("Embedding dimension mismatch: query has {query}, stored chunk has {stored}")]
    DimensionMismatch { query: usize, stored: usize },

    /// Upsert was handed mismatched chunk and vector counts.
    #[error("Got {vectors} vectors for {chunks} chunks")]
    EmbeddingCount { chunks: usize, vectors: usize },
}

/// Retrieval capability consumed by the answer pipeline.
///
/// Implementations return hits best-first under their own score semantics;
/// the caller treats scores as opaque. The pipeline is synchronous and
/// single-threaded, so implementations need not be thread-safe (the
/// SQLite-backed store is not).
pub trait Retriever {
    fn search(&self, question: &str, k: usize) -> Result<Vec<ScoredChunk>, StoreError>;
}

/// Database wrapper providing connection management and schema
/// initialization.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens an in-memory SQLite database.
    ///
    /// Automatically initializes the schema on connection open.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Opens a file-based SQLite database at the given path.
    ///
    /// Creates the database file if it does not exist.
    /// Automatically initializes the schema on connection open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute("PRAGMA foreign_keys = ON", [])?;
        self.conn.execute_batch(INITIAL_SCHEMA)?;
        Ok(())
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// A chunk as written at ingest time, before scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    pub content: String,
    pub page: Option<i64>,
    pub source: Option<String>,
}

/// Vector store over one named collection.
///
/// Owns the embedding capability so queries and stored chunks always go
/// through the same backend.
pub struct VectorStore {
    db: Database,
    embedder: Arc<dyn Embedder>,
    collection: String,
}

impl VectorStore {
    /// Creates a store over `db`, scoped to `collection`.
    pub fn new(db: Database, embedder: Arc<dyn Embedder>, collection: impl Into<String>) -> Self {
        Self {
            db,
            embedder,
            collection: collection.into(),
        }
    }

    /// Returns the collection name this store reads and writes.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Inserts `chunks` with their `vectors` into the collection.
    ///
    /// `reset` clears the collection's prior contents first; clearing and
    /// inserting happen in one transaction, so readers never observe a
    /// half-replaced collection.
    pub fn upsert(
        &mut self,
        chunks: &[ChunkRecord],
        vectors: &[Vec<f32>],
        reset: bool,
    ) -> Result<(), StoreError> {
        if chunks.len() != vectors.len() {
            return Err(StoreError::EmbeddingCount {
                chunks: chunks.len(),
                vectors: vectors.len(),
            });
        }

        let now = OffsetDateTime::now_utc().unix_timestamp();
        let tx = self.db.conn.transaction()?;

        tx.execute(
            "INSERT OR IGNORE INTO collections (name) VALUES (?1)",
            params![self.collection],
        )?;
        let collection_id: i64 = tx.query_row(
            "SELECT id FROM collections WHERE name = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;

        if reset {
            tx.execute(
                "DELETE FROM chunks WHERE collection_id = ?1",
                params![collection_id],
            )?;
        }

        {
            let mut insert = tx.prepare(
                "INSERT INTO chunks (collection_id, content, page, source, embedding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (chunk, vector) in chunks.iter().zip(vectors) {
                insert.execute(params![
                    collection_id,
                    chunk.content,
                    chunk.page,
                    chunk.source,
                    encode_embedding(vector),
                    now,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Number of chunks currently stored in the collection.
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self.db.conn.query_row(
            "SELECT COUNT(*) FROM chunks c
             JOIN collections col ON col.id = c.collection_id
             WHERE col.name = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Returns the top-`k` chunks for `query`, best (lowest distance)
    /// first.
    pub fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, StoreError> {
        let collection_id: Option<i64> = self
            .db
            .conn
            .query_row(
                "SELECT id FROM collections WHERE name = ?1",
                params![self.collection],
                |row| row.get(0),
            )
            .optional()?;
        let Some(collection_id) = collection_id else {
            return Ok(Vec::new());
        };

        let query_vector = self
            .embedder
            .embed(std::slice::from_ref(&query.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Api {
                message: "Embedding backend returned no vector for the query".to_string(),
            })?;

        let mut statement = self.db.conn.prepare(
            "SELECT content, page, source, embedding FROM chunks
             WHERE collection_id = ?1 ORDER BY id",
        )?;
        let rows = statement.query_map(params![collection_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Vec<u8>>(3)?,
            ))
        })?;

        let mut scored = Vec::new();
        for row in rows {
            let (content, page, source, blob) = row?;
            let stored = decode_embedding(&blob);
            let distance = cosine_distance(&query_vector, &stored)?;
            scored.push(ScoredChunk {
                content,
                score: distance,
                page,
                source,
            });
        }

        scored.sort_by(|a, b| a.score.total_cmp(&b.score));
        scored.truncate(k);
        Ok(scored)
    }
}

impl Retriever for VectorStore {
    fn search(&self, question: &str, k: usize) -> Result<Vec<ScoredChunk>, StoreError> {
        self.similarity_search(question, k)
    }
}

/// Serializes a vector as little-endian f32 bytes.
fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Deserializes a little-endian f32 byte blob. Trailing partial values
/// are dropped.
fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine distance between two vectors: `1 - cos(a, b)`, in `[0, 2]`.
///
/// A zero-magnitude vector has no direction; its distance is defined as
/// the neutral 1.0 so such chunks rank behind any real match.
fn cosine_distance(a: &[f32], b: &[f32]) -> Result<f64, StoreError> {
    if a.len() != b.len() {
        return Err(StoreError::DimensionMismatch {
            query: a.len(),
            stored: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(1.0);
    }

    Ok(1.0 - dot / (norm_a.sqrt() * norm_b.sqrt()))
}
