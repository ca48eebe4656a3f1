//! Gemini HTTP client implementation.
//!
//! Synchronous client for the Generative Language API (`batchEmbedContents`
//! and `generateContent`), configured from a [`ValueSource`] at build time.

use std::time::Duration;

use crate::config::{ValueSource, parse_number, require};

use super::{BackendError, ChatModel, Embedder, LlmError};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_EMBEDDING_MODEL: &str = "models/embedding-001";
const DEFAULT_LLM_MODEL: &str = "gemini-2.5-flash-lite";

/// Builder for [`GeminiClient`] instances.
#[derive(Debug, Default)]
pub struct GeminiClientBuilder {
    base_url: Option<String>,
}

impl GeminiClientBuilder {
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
    /// `GOOGLE_API_KEY` is requested interactively when the source allows
    /// it; model names fall back to their defaults. The base URL comes
    /// from the builder, then `GEMINI_BASE_URL`, then the public endpoint.
    pub fn build(self, source: &dyn ValueSource) -> Result<GeminiClient, BackendError> {
        let base_url = self
            .base_url
            .or_else(|| source.lookup("GEMINI_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        reqwest::Url::parse(&base_url)
            .map_err(|e| LlmError::InvalidUrl(format!("{base_url}: {e}")))?;

        let api_key = require(source, "GOOGLE_API_KEY", "GOOGLE_API_KEY", None, true)?;
        let embedding_model = require(
            source,
            "GOOGLE_EMBEDDING_MODEL",
            "GOOGLE_EMBEDDING_MODEL",
            Some(DEFAULT_EMBEDDING_MODEL),
            false,
        )?;
        let llm_model = require(
            source,
            "GOOGLE_LLM_MODEL",
            "GOOGLE_LLM_MODEL",
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

        Ok(GeminiClient {
            client,
            base_url,
            api_key,
            embedding_model,
            llm_model,
            temperature,
        })
    }
}

/// Synchronous client for the Gemini API, serving both embeddings and
/// generation.
#[derive(Debug)]
pub struct GeminiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    embedding_model: String,
    llm_model: String,
    temperature: f64,
}

impl GeminiClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the embedding model resource path.
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Returns the generation model name.
    pub fn llm_model(&self) -> &str {
        &self.llm_model
    }

    fn post(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, LlmError> {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
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

/// Normalizes a model name to the `models/<name>` resource path the API
/// routes on.
fn model_path(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

impl Embedder for GeminiClient {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = model_path(&self.embedding_model);
        let url = format!("{}/{}:batchEmbedContents", self.base_url, model);
        let requests: Vec<serde_json::Value> = texts
            .iter()
            .map(|text| {
                serde_json::json!({
                    "model": model,
                    "content": {"parts": [{"text": text}]}
                })
            })
            .collect();

        let json = self.post(&url, &serde_json::json!({ "requests": requests }))?;
        parse_embeddings(&json, texts.len())
    }
}

impl ChatModel for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/{}:generateContent",
            self.base_url,
            model_path(&self.llm_model)
        );
        let body = serde_json::json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {"temperature": self.temperature}
        });

        let json = self.post(&url, &body)?;
        Ok(parse_candidate_text(&json))
    }
}

/// Extracts vectors from a `batchEmbedContents` response.
///
/// The API returns embeddings in request order; a count mismatch means the
/// response cannot be lined up with the inputs.
fn parse_embeddings(json: &serde_json::Value, expected: usize) -> Result<Vec<Vec<f32>>, LlmError> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| LlmError::Api {
            message: "Missing 'embeddings' field in batchEmbedContents response".to_string(),
        })?;

    if embeddings.len() != expected {
        return Err(LlmError::Api {
            message: format!(
                "Expected {expected} embeddings, got {}",
                embeddings.len()
            ),
        });
    }

    embeddings
        .iter()
        .map(|entry| {
            entry
                .get("values")
                .and_then(|v| v.as_array())
                .map(|values| {
                    values
                        .iter()
                        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                        .collect()
                })
                .ok_or_else(|| LlmError::Api {
                    message: "Missing 'values' field in embedding entry".to_string(),
                })
        })
        .collect()
}

/// Extracts the text of the first candidate from a `generateContent`
/// response, concatenating its parts. Missing content is an empty answer.
fn parse_candidate_text(json: &serde_json::Value) -> String {
    json.get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .concat()
        })
        .unwrap_or_default()
}
