/// Complete database schema for the vector store.
///
/// Uses CREATE TABLE/INDEX IF NOT EXISTS for idempotent execution.
/// All statements are designed to be run in a single transaction.
pub const INITIAL_SCHEMA: &str = r#"
-- Collections: named sets of ingested chunks
CREATE TABLE IF NOT EXISTS collections (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

-- Chunks: document slices with their embedding vectors
CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY,
    collection_id INTEGER NOT NULL,
    content TEXT NOT NULL,
    page INTEGER,
    source TEXT,
    embedding BLOB NOT NULL,
    created_at INTEGER,
    FOREIGN KEY (collection_id) REFERENCES collections(id) ON DELETE CASCADE
);

-- Index for per-collection scans
CREATE INDEX IF NOT EXISTS idx_chunks_collection ON chunks(collection_id);
"#;
