pub mod answerer;
pub mod config;
pub mod ingest;
pub mod provider;
pub mod store;

pub use answerer::{
    Answer, AnswerError, AnswerOptions, AnswerPipeline, AnswerPipelineBuilder,
    OUT_OF_CONTEXT_ANSWER, ScoredChunk, assemble_context, build_prompt,
};
pub use config::{ConfigError, EnvSource, StaticSource, ValueSource};
pub use ingest::{IngestError, IngestReport, ingest_document};
pub use provider::{BackendError, ChatModel, Embedder, LlmError, Provider};
pub use store::{ChunkRecord, Database, Retriever, StoreError, VectorStore};
