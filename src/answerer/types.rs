//! Types for grounded answers and their retrieval diagnostics.

use serde::Serialize;

/// A chunk returned by the vector store, ranked best-first.
///
/// The score is an opaque ordering key owned by the store backend (this
/// crate's store emits cosine distance, lower is better). The answering
/// core never re-sorts hits, it only truncates them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    /// The chunk text as stored at ingest time.
    pub content: String,
    /// Backend-defined relevance score.
    pub score: f64,
    /// 1-based page of the source document, when known.
    pub page: Option<i64>,
    /// Source document name, when known.
    pub source: Option<String>,
}

/// The outcome of answering one question.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// The model's answer, trimmed; or the fixed refusal string.
    pub text: String,
    /// The raw retrieval hits, in store order, for diagnostics.
    pub hits: Vec<ScoredChunk>,
}
