//! OpenAI HTTP client implementation.
//!
//! Synchronous client for the embeddings and chat-completions endpoints,
//! configured from a [`ValueSource`] at build time.

use std::time::Duration;

use serde::Serialize;

use crate::config::{ValueSource, parse_number, require};

use super::{BackendError, ChatModel, Embedder, LlmError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_LLM_MODEL: &str = "gpt-5-nano";

/// Builder for [`OpenAiClient`] instances.
#[derive(Debug, Default)]
pub struct OpenAiClientBuilder {
    base_url: Option<String>,
}

impl OpenAiClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the API base URL (tests point this at a local server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the client, resolving key, models and temperature from
    /// `source`.
    ///
    /// `OPENAI_API_KEY` is requested interactively when the source allows
    /// it; model names fall back to their defaults. The base URL comes
    /// from the builder, then `OPENAI_BASE_URL`, then the public endpoint.
    pub fn build(self, source: &dyn ValueSource) -> Result<OpenAiClient, BackendError> {
        let base_url = self
            .base_url
            .or_else(|| source.lookup("OPENAI_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        reqwest::Url::parse(&base_url)
            .map_err(|e| LlmError::InvalidUrl(format!("{base_url}: {e}")))?;

        let api_key = require(source, "OPENAI_API_KEY", "OPENAI_API_KEY", None, true)?;
        let embedding_model = require(
            source,
            "OPENAI_EMBEDDING_MODEL",
            "OPENAI_EMBEDDING_MODEL",
            Some(DEFAULT_EMBEDDING_MODEL),
            false,
        )?;
        let llm_model = require(
            source,
            "OPENAI_LLM_MODEL",
            "OPENAI_LLM_MODEL",
            Some(DEFAULT_LLM_MODEL),
            false,
        )?;
        let temperature = require(source, "LLM_TEMPERATURE", "LLM_TEMPERATURE", Some("0"), false)?;
        let temperature = parse_number(&temperature, "LLM_TEMPERATURE")?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(LlmError::Network)?;

        Ok(OpenAiClient {
            client,
            base_url,
            api_key,
            embedding_model,
            llm_model,
            temperature,
        })
    }
}

/// Synchronous client for the OpenAI API, serving both embeddings and
/// chat completions.
#[derive(Debug)]
pub struct OpenAiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    embedding_model: String,
    llm_model: String,
    temperature: f64,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f64,
}

impl OpenAiClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the embedding model name.
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Returns the chat model name.
    pub fn llm_model(&self) -> &str {
        &self.llm_model
    }

    fn post(&self, url: &str, body: &impl Serialize) -> Result<serde_json::Value, LlmError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .map_err(LlmError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Http {
                status: status.as_u16(),
            });
        }

        response.json().map_err(LlmError::Network)
    }
}

impl Embedder for OpenAiClient {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let body = EmbeddingsRequest {
            model: &self.embedding_model,
            input: texts,
        };

        let json = self.post(&url, &body)?;
        parse_embeddings(&json, texts.len())
    }
}

impl ChatModel for OpenAiClient {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.llm_model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let json = self.post(&url, &body)?;
        Ok(parse_chat_content(&json))
    }
}

/// Extracts the embedding vectors from an `/embeddings` response.
///
/// The API returns one entry per input with an `index` field; entries are
/// re-ordered by it so the output lines up with the input texts.
fn parse_embeddings(json: &serde_json::Value, expected: usize) -> Result<Vec<Vec<f32>>, LlmError> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| LlmError::Api {
            message: "Missing 'data' field in embeddings response".to_string(),
        })?;

    let mut vectors: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
    for (position, entry) in data.iter().enumerate() {
        let index = entry
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(position);
        let values = entry
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| LlmError::Api {
                message: "Missing 'embedding' field in embeddings response".to_string(),
            })?;
        let vector = values
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        vectors.push((index, vector));
    }

    if vectors.len() != expected {
        return Err(LlmError::Api {
            message: format!(
                "Expected {expected} embeddings, got {}",
                vectors.len()
            ),
        });
    }

    vectors.sort_by_key(|(index, _)| *index);
    Ok(vectors.into_iter().map(|(_, v)| v).collect())
}

/// Extracts the assistant message from a `/chat/completions` response.
///
/// Missing or null content is treated as an empty answer.
fn parse_chat_content(json: &serde_json::Value) -> String {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}
