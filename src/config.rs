//! Environment-backed configuration with an interactive fallback.
//!
//! Every value the tool consumes comes from the environment. When a value
//! is missing and the source is interactive, the user is asked for it once
//! and the answer is reused for the rest of the run. Library consumers can
//! substitute a [`StaticSource`] to keep everything non-interactive.

use std::cell::RefCell;
use std::collections::HashMap;

use dialoguer::{Input, Password};
use thiserror::Error;

/// Errors raised while resolving configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The provider override named something other than a known backend.
    #[error("Unknown provider '{0}'. Use PROVIDER=openai or PROVIDER=gemini.")]
    UnknownProvider(String),

    /// A required value could not be resolved from the source.
    #[error("Missing required value: {var}")]
    MissingValue { var: String },

    /// A numeric variable did not parse as a number.
    #[error("{var} must be a number (e.g. 0, 0.2, 1)")]
    InvalidNumber { var: String },

    /// The interactive prompt itself failed (terminal closed, etc.).
    #[error("Prompt failed: {0}")]
    Prompt(String),
}

/// Loads `.env` into the process environment if one is present.
///
/// Missing files are fine; runtime prompting fills any remaining gaps.
pub fn load_env() {
    dotenvy::dotenv().ok();
}

/// A source of configuration values.
///
/// `lookup` is a pure read; `prompt` is the interactive fallback used when
/// a required value is absent. Implementations decide whether prompting is
/// possible at all.
pub trait ValueSource {
    /// Returns the value for `name`, or `None` when unset.
    ///
    /// Empty and whitespace-only values count as unset.
    fn lookup(&self, name: &str) -> Option<String>;

    /// Asks the user for `name`, returning the entered (or default) value.
    fn prompt(
        &self,
        name: &str,
        message: &str,
        default: Option<&str>,
        secret: bool,
    ) -> Result<String, ConfigError>;
}

/// Resolves a required value: environment first, then the prompt fallback.
pub fn require(
    source: &dyn ValueSource,
    name: &str,
    message: &str,
    default: Option<&str>,
    secret: bool,
) -> Result<String, ConfigError> {
    if let Some(value) = source.lookup(name) {
        return Ok(value);
    }
    source.prompt(name, message, default, secret)
}

/// Parses a numeric variable, naming it in the error on failure.
pub fn parse_number(value: &str, var: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidNumber {
            var: var.to_string(),
        })
}

/// Process-environment source with terminal prompting.
///
/// Prompted values are cached inside the source rather than written back
/// to the process environment, so repeated resolution is stable within a
/// run without touching global state.
#[derive(Default)]
pub struct EnvSource {
    prompted: RefCell<HashMap<String, String>>,
}

impl EnvSource {
    /// Creates a new source over the process environment.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ValueSource for EnvSource {
    fn lookup(&self, name: &str) -> Option<String> {
        if let Some(cached) = self.prompted.borrow().get(name) {
            return Some(cached.clone());
        }
        std::env::var(name)
            .ok()
            .filter(|v| !v.trim().is_empty())
    }

    fn prompt(
        &self,
        name: &str,
        message: &str,
        default: Option<&str>,
        secret: bool,
    ) -> Result<String, ConfigError> {
        let label = match default {
            Some(d) if !secret => format!("{message} [{d}]"),
            _ => message.to_string(),
        };

        loop {
            let entered = if secret {
                Password::new()
                    .with_prompt(&label)
                    .allow_empty_password(true)
                    .interact()
            } else {
                Input::<String>::new()
                    .with_prompt(&label)
                    .allow_empty(true)
                    .interact_text()
            }
            .map_err(|e| ConfigError::Prompt(e.to_string()))?;

            let entered = entered.trim();
            if entered.is_empty() {
                if let Some(d) = default {
                    self.prompted
                        .borrow_mut()
                        .insert(name.to_string(), d.to_string());
                    return Ok(d.to_string());
                }
                eprintln!("Missing required value: {name}.");
                continue;
            }

            self.prompted
                .borrow_mut()
                .insert(name.to_string(), entered.to_string());
            return Ok(entered.to_string());
        }
    }
}

/// Fixed, non-interactive source backed by an in-memory map.
///
/// Prompting resolves to the provided default or fails with
/// [`ConfigError::MissingValue`]. Used by tests and by embedders of the
/// library that must never block on a terminal.
#[derive(Debug, Default, Clone)]
pub struct StaticSource {
    values: HashMap<String, String>,
}

impl StaticSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source from `(name, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Sets a value, replacing any previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }
}

impl ValueSource for StaticSource {
    fn lookup(&self, name: &str) -> Option<String> {
        self.values
            .get(name)
            .filter(|v| !v.trim().is_empty())
            .cloned()
    }

    fn prompt(
        &self,
        name: &str,
        _message: &str,
        default: Option<&str>,
        _secret: bool,
    ) -> Result<String, ConfigError> {
        match default {
            Some(d) => Ok(d.to_string()),
            None => Err(ConfigError::MissingValue {
                var: name.to_string(),
            }),
        }
    }
}
