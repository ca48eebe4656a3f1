//! Backend providers for embeddings and text generation.
//!
//! Exactly one provider is active per run. [`Provider::resolve`] picks it
//! from the credentials present in the environment; the chosen backend then
//! serves both the embedding and the generation capability through the
//! [`Embedder`] and [`ChatModel`] traits.

mod gemini;
mod openai;

pub use gemini::{GeminiClient, GeminiClientBuilder};
pub use openai::{OpenAiClient, OpenAiClientBuilder};

use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigError, ValueSource};

/// Errors from the embedding/generation backends.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// HTTP errors with status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// Provider API responses the client could not use
    #[error("API error: {message}")]
    Api { message: String },

    /// Invalid base URL configuration
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Turns texts into embedding vectors, one per input, in input order.
pub trait Embedder: Send + Sync {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;
}

/// Generates a completion for a single prompt.
pub trait ChatModel: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// The closed set of supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Gemini,
}

impl Provider {
    /// Picks the provider from the credentials visible in `source`.
    ///
    /// Precedence:
    /// 1. Exactly one API key set -> that provider. The `PROVIDER` override
    ///    is not consulted.
    /// 2. Both keys set -> `PROVIDER` decides (case-insensitive `openai` or
    ///    `gemini`); unset defaults to OpenAI; anything else is
    ///    [`ConfigError::UnknownProvider`].
    /// 3. Neither key set -> OpenAI. The missing key is requested later,
    ///    when the client is built.
    ///
    /// Reads only; never prompts. Calling it again under an unchanged
    /// environment returns the same choice.
    pub fn resolve(source: &dyn ValueSource) -> Result<Self, ConfigError> {
        let has_openai = source.lookup("OPENAI_API_KEY").is_some();
        let has_gemini = source.lookup("GOOGLE_API_KEY").is_some();

        if has_openai && !has_gemini {
            return Ok(Self::OpenAi);
        }
        if has_gemini && !has_openai {
            return Ok(Self::Gemini);
        }

        if has_openai && has_gemini {
            return match source.lookup("PROVIDER") {
                None => Ok(Self::OpenAi),
                Some(value) => Self::parse(&value)
                    .ok_or_else(|| ConfigError::UnknownProvider(value.trim().to_string())),
            };
        }

        Ok(Self::OpenAi)
    }

    /// Parses a provider name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "gemini" => Some(Self::Gemini),
            _ => None,
        }
    }

    /// The canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }

    /// Builds the backend client for this provider, resolving its API key,
    /// model names and temperature from `source`.
    ///
    /// The one client serves both capabilities; the returned handles share
    /// it.
    pub fn connect(
        &self,
        source: &dyn ValueSource,
    ) -> Result<(Arc<dyn Embedder>, Arc<dyn ChatModel>), BackendError> {
        match self {
            Self::OpenAi => {
                let client = Arc::new(OpenAiClientBuilder::new().build(source)?);
                Ok((client.clone(), client))
            }
            Self::Gemini => {
                let client = Arc::new(GeminiClientBuilder::new().build(source)?);
                Ok((client.clone(), client))
            }
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised while constructing a backend client.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}
