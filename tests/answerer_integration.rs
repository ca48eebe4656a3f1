/// Integration tests for the answer pipeline over a real SQLite-backed
/// vector store, with the HTTP backends replaced by deterministic doubles.
///
/// These tests verify end-to-end answering behavior:
/// - retrieval through `VectorStore` feeding the assembled CONTEXT
/// - the fixed refusal short-circuit when nothing grounds the question
/// - prompt construction seen by the generation backend
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use docqa::answerer::{AnswerOptions, AnswerPipelineBuilder, OUT_OF_CONTEXT_ANSWER};
use docqa::provider::{ChatModel, Embedder, LlmError};
use docqa::store::{ChunkRecord, Database, VectorStore};

/// Embedder double: known texts map to fixed vectors, everything else is
/// a zero vector.
struct FakeEmbedder {
    known: Vec<(String, Vec<f32>)>,
}

impl FakeEmbedder {
    fn new(known: &[(&str, &[f32])]) -> Self {
        Self {
            known: known
                .iter()
                .map(|(text, vector)| (text.to_string(), vector.to_vec()))
                .collect(),
        }
    }
}

impl Embedder for FakeEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        Ok(texts
            .iter()
            .map(|text| {
                self.known
                    .iter()
                    .find(|(known, _)| known == text)
                    .map(|(_, vector)| vector.clone())
                    .unwrap_or_else(|| vec![0.0, 0.0])
            })
            .collect())
    }
}

/// Generation double that records every prompt it is given.
struct RecordingModel {
    response: String,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl RecordingModel {
    fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

impl ChatModel for RecordingModel {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.response.clone())
    }
}

fn seeded_store(embedder: Arc<FakeEmbedder>) -> VectorStore {
    let mut store = VectorStore::new(Database::in_memory().unwrap(), embedder, "documents");
    let chunks = vec![
        ChunkRecord {
            content: "The warranty period is two years from purchase.".to_string(),
            page: Some(4),
            source: Some("manual.pdf".to_string()),
        },
        ChunkRecord {
            content: "Returns are accepted within thirty days.".to_string(),
            page: Some(9),
            source: Some("manual.pdf".to_string()),
        },
    ];
    let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
    store.upsert(&chunks, &vectors, false).unwrap();
    store
}

#[test]
fn answers_from_the_stored_corpus() {
    let embedder = Arc::new(FakeEmbedder::new(&[(
        "How long is the warranty?",
        &[1.0, 0.0],
    )]));
    let store = seeded_store(embedder);
    let model = Arc::new(RecordingModel::new("Two years from purchase."));

    let pipeline = AnswerPipelineBuilder::new()
        .retriever(Arc::new(store))
        .model(model.clone())
        .build();

    let answer = pipeline
        .answer("How long is the warranty?", &AnswerOptions::default())
        .unwrap();

    assert_eq!(answer.text, "Two years from purchase.");
    assert_eq!(model.call_count(), 1);

    // Both chunks come back as diagnostics, warranty chunk first.
    assert_eq!(answer.hits.len(), 2);
    assert!(answer.hits[0].content.contains("warranty"));
    assert!(answer.hits[0].score < answer.hits[1].score);
    assert_eq!(answer.hits[0].page, Some(4));
    assert_eq!(answer.hits[0].source.as_deref(), Some("manual.pdf"));
}

#[test]
fn prompt_carries_context_and_verbatim_question() {
    let embedder = Arc::new(FakeEmbedder::new(&[(
        "How long is the warranty?",
        &[1.0, 0.0],
    )]));
    let store = seeded_store(embedder);
    let model = Arc::new(RecordingModel::new("Two years."));

    let pipeline = AnswerPipelineBuilder::new()
        .retriever(Arc::new(store))
        .model(model.clone())
        .build();

    pipeline
        .answer("How long is the warranty?", &AnswerOptions::default())
        .unwrap();

    let prompt = model.last_prompt().unwrap();
    assert!(prompt.contains("CONTEXT:"));
    assert!(prompt.contains("[page=4 score="));
    assert!(prompt.contains("The warranty period is two years from purchase."));
    assert!(prompt.contains("USER QUESTION:\nHow long is the warranty?"));
    assert!(prompt.contains(OUT_OF_CONTEXT_ANSWER));
}

#[test]
fn empty_store_refuses_without_invoking_the_model() {
    let embedder = Arc::new(FakeEmbedder::new(&[]));
    let store = VectorStore::new(Database::in_memory().unwrap(), embedder, "documents");
    let model = Arc::new(RecordingModel::new("must never appear"));

    let pipeline = AnswerPipelineBuilder::new()
        .retriever(Arc::new(store))
        .model(model.clone())
        .build();

    let answer = pipeline
        .answer("What is the capital of France?", &AnswerOptions::default())
        .unwrap();

    assert_eq!(answer.text, OUT_OF_CONTEXT_ANSWER);
    assert!(answer.hits.is_empty());
    assert_eq!(model.call_count(), 0);
}

#[test]
fn tight_context_budget_still_bounds_the_prompt() {
    let embedder = Arc::new(FakeEmbedder::new(&[("query", &[1.0, 0.0])]));
    let store = seeded_store(embedder);
    let model = Arc::new(RecordingModel::new("ok"));

    let pipeline = AnswerPipelineBuilder::new()
        .retriever(Arc::new(store))
        .model(model.clone())
        .build();

    let options = AnswerOptions {
        k: 10,
        max_context_chars: 40,
    };
    pipeline.answer("query", &options).unwrap();

    let prompt = model.last_prompt().unwrap();
    let context = prompt
        .split("CONTEXT:\n")
        .nth(1)
        .and_then(|rest| rest.split("\n\nRULES:").next())
        .unwrap();
    assert!(context.chars().count() <= 40);
}

#[test]
fn generation_failures_surface_as_errors() {
    struct FailingModel;
    impl ChatModel for FailingModel {
        fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::Api {
                message: "model overloaded".to_string(),
            })
        }
    }

    let embedder = Arc::new(FakeEmbedder::new(&[("query", &[1.0, 0.0])]));
    let store = seeded_store(embedder);

    let pipeline = AnswerPipelineBuilder::new()
        .retriever(Arc::new(store))
        .model(Arc::new(FailingModel))
        .build();

    let result = pipeline.answer("query", &AnswerOptions::default());
    assert!(result.is_err());
}
