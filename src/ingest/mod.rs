//! Document ingestion: load -> split -> embed -> upsert.

mod loader;
mod splitter;

pub use loader::load_pages;
pub use splitter::{CHUNK_OVERLAP, CHUNK_SIZE, split_text};

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::provider::{Embedder, LlmError};
use crate::store::{ChunkRecord, StoreError, VectorStore};

/// Errors from the ingestion pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The document path does not exist. Checked before any work starts.
    #[error("Document not found: {0}")]
    NotFound(PathBuf),

    /// The document exists but could not be parsed into pages.
    #[error("Failed to load document: {0}")]
    Load(String),

    /// The embedding backend failed.
    #[error("Embedding failed: {0}")]
    Embedding(#[from] LlmError),

    /// The vector store rejected the write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub pages: usize,
    pub chunks: usize,
    pub collection: String,
}

/// Ingests the document at `path` into the store's collection.
///
/// Pages are split into overlapping windows of [`CHUNK_SIZE`] characters
/// ([`CHUNK_OVERLAP`] shared between neighbors), embedded as one batch,
/// and written in a single transaction. Chunks carry their 1-based page
/// number and the document's file name. `reset` replaces the collection's
/// prior contents; otherwise new chunks append.
pub fn ingest_document(
    store: &mut VectorStore,
    embedder: &dyn Embedder,
    path: &Path,
    reset: bool,
) -> Result<IngestReport, IngestError> {
    let pages = load_pages(path)?;
    let source = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    let mut records = Vec::new();
    for (index, page) in pages.iter().enumerate() {
        for chunk in split_text(page, CHUNK_SIZE, CHUNK_OVERLAP) {
            records.push(ChunkRecord {
                content: chunk,
                page: Some(index as i64 + 1),
                source: source.clone(),
            });
        }
    }

    let texts: Vec<String> = records.iter().map(|record| record.content.clone()).collect();
    let vectors = embedder.embed(&texts)?;
    store.upsert(&records, &vectors, reset)?;

    Ok(IngestReport {
        pages: pages.len(),
        chunks: records.len(),
        collection: store.collection().to_string(),
    })
}
