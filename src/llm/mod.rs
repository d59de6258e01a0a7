//! LLM client adapter.
//!
//! `LlmClient` is an enum over concrete backends. Add a new variant + module
//! in `providers/` for each additional backend.
//!
//! Clients are shared immutable capabilities; clone them freely. Each call is
//! one request/response round trip; dropping the returned future cancels the
//! in-flight request. Nothing here retries.

pub mod json;
pub mod providers;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::LlmSettings;
use crate::error::CoreError;

use providers::ollama::OllamaProvider;
use providers::scripted::ScriptedProvider;

// ── Options ───────────────────────────────────────────────────────────────────

/// Shape of the output a call asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}' (expected text or json)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call options. Unset fields fall back to the client's settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateOptions {
    pub format: Option<OutputFormat>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    /// Base64-encoded images for vision-capable models.
    pub images: Vec<String>,
}

impl GenerateOptions {
    pub fn text() -> Self {
        Self { format: Some(OutputFormat::Text), ..Self::default() }
    }

    pub fn json() -> Self {
        Self { format: Some(OutputFormat::Json), ..Self::default() }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_image(mut self, image_base64: String) -> Self {
        self.images.push(image_base64);
        self
    }
}

/// Result of [`LlmClient::generate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Generated {
    Text(String),
    Json(Value),
}

/// A fully resolved call handed to a backend.
#[derive(Debug)]
pub(crate) struct Completion<'a> {
    pub prompt: &'a str,
    pub format: OutputFormat,
    pub model: Option<&'a str>,
    pub temperature: Option<f32>,
    pub images: &'a [String],
}

// ── Client enum ───────────────────────────────────────────────────────────────

/// All available backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
/// Adding a backend = new module + new variant + new match arms.
#[derive(Debug, Clone)]
pub enum LlmClient {
    Ollama(OllamaProvider),
    Scripted(ScriptedProvider),
}

impl LlmClient {
    /// Build the backend named by `settings.provider`.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, CoreError> {
        providers::build(settings)
    }

    fn default_format(&self) -> OutputFormat {
        match self {
            LlmClient::Ollama(p) => p.default_format(),
            LlmClient::Scripted(p) => p.default_format(),
        }
    }

    /// Send `prompt` to the backend.
    ///
    /// In JSON mode the raw output is parsed with [`json::extract_json`] and
    /// fails with [`CoreError::MalformedResponse`] when no JSON is present.
    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Generated, CoreError> {
        let format = options.format.unwrap_or_else(|| self.default_format());
        let completion = Completion {
            prompt,
            format,
            model: options.model.as_deref(),
            temperature: options.temperature,
            images: &options.images,
        };

        let raw = match self {
            LlmClient::Ollama(p) => p.complete(&completion).await?,
            LlmClient::Scripted(p) => p.complete(&completion)?,
        };

        match format {
            OutputFormat::Text => Ok(Generated::Text(raw)),
            OutputFormat::Json => json::extract_json(&raw).map(Generated::Json),
        }
    }

    /// [`generate`](Self::generate) forced to text mode.
    pub async fn generate_text(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, CoreError> {
        let options = GenerateOptions { format: Some(OutputFormat::Text), ..options.clone() };
        match self.generate(prompt, &options).await? {
            Generated::Text(text) => Ok(text),
            Generated::Json(value) => Ok(value.to_string()),
        }
    }

    /// [`generate`](Self::generate) forced to JSON mode.
    pub async fn generate_json(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Value, CoreError> {
        let options = GenerateOptions { format: Some(OutputFormat::Json), ..options.clone() };
        match self.generate(prompt, &options).await? {
            Generated::Json(value) => Ok(value),
            Generated::Text(text) => json::extract_json(&text),
        }
    }

    /// Lightweight reachability check.
    pub async fn ping(&self) -> Result<(), CoreError> {
        match self {
            LlmClient::Ollama(p) => p.ping().await,
            LlmClient::Scripted(_) => Ok(()),
        }
    }
}

impl From<OllamaProvider> for LlmClient {
    fn from(p: OllamaProvider) -> Self {
        LlmClient::Ollama(p)
    }
}

impl From<ScriptedProvider> for LlmClient {
    fn from(p: ScriptedProvider) -> Self {
        LlmClient::Scripted(p)
    }
}
