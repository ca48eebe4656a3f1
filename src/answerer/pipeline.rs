//! The retrieve -> assemble -> generate pipeline.

use std::sync::Arc;

use thiserror::Error;

use crate::provider::{ChatModel, LlmError};
use crate::store::{Retriever, StoreError};

use super::context::assemble_context;
use super::prompt::{OUT_OF_CONTEXT_ANSWER, build_prompt};
use super::types::Answer;

/// Per-question knobs, mirroring the CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct AnswerOptions {
    /// Top-k hits requested from the vector store.
    pub k: usize,
    /// Character budget for the concatenated CONTEXT.
    pub max_context_chars: usize,
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            k: 10,
            max_context_chars: 12_000,
        }
    }
}

/// Errors from one answering run. Collaborator failures propagate
/// unchanged; retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] StoreError),

    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),
}

/// Builder for [`AnswerPipeline`] instances.
#[derive(Default)]
pub struct AnswerPipelineBuilder {
    retriever: Option<Arc<dyn Retriever>>,
    model: Option<Arc<dyn ChatModel>>,
}

impl AnswerPipelineBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retrieval backend.
    pub fn retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Sets the generation backend.
    pub fn model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Builds the `AnswerPipeline`.
    ///
    /// # Panics
    ///
    /// Panics if `retriever()` or `model()` was not called.
    #[must_use]
    pub fn build(self) -> AnswerPipeline {
        AnswerPipeline {
            retriever: self
                .retriever
                .expect("retriever must be set via retriever() method"),
            model: self.model.expect("model must be set via model() method"),
        }
    }
}

/// Answers questions strictly from the retrieved context.
pub struct AnswerPipeline {
    retriever: Arc<dyn Retriever>,
    model: Arc<dyn ChatModel>,
}

impl AnswerPipeline {
    /// Creates a pipeline over the given retrieval and generation backends.
    pub fn new(retriever: Arc<dyn Retriever>, model: Arc<dyn ChatModel>) -> Self {
        Self { retriever, model }
    }

    /// Answers `question` from the corpus.
    ///
    /// Retrieves top-k hits, assembles the bounded context and asks the
    /// model. When the assembled context is empty or whitespace-only the
    /// fixed refusal string is returned with the hits and the model is
    /// never invoked.
    pub fn answer(&self, question: &str, options: &AnswerOptions) -> Result<Answer, AnswerError> {
        let hits = self.retriever.search(question, options.k)?;
        let context = assemble_context(&hits, options.max_context_chars);

        if context.trim().is_empty() {
            return Ok(Answer {
                text: OUT_OF_CONTEXT_ANSWER.to_string(),
                hits,
            });
        }

        let prompt = build_prompt(&context, question);
        let raw = self.model.generate(&prompt)?;

        Ok(Answer {
            text: raw.trim().to_string(),
            hits,
        })
    }
}
