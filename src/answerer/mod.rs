//! Grounded question answering over retrieved document chunks.
//!
//! This module carries the query-time core: the context assembler that
//! turns ranked retrieval hits into a bounded CONTEXT string, the fixed
//! grounding prompt, and the `AnswerPipeline` that ties retrieval and
//! generation together with a deterministic refusal when nothing grounds
//! the question.

mod context;
mod pipeline;
mod prompt;
mod types;

pub use context::{CHUNK_SEPARATOR, assemble_context};
pub use pipeline::{AnswerError, AnswerOptions, AnswerPipeline, AnswerPipelineBuilder};
pub use prompt::{OUT_OF_CONTEXT_ANSWER, build_prompt};
pub use types::{Answer, ScoredChunk};
