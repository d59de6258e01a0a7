//! Ollama generate provider (`/api/generate`).
//!
//! One non-streaming round trip per call. All Ollama wire types are private
//! to this module; callers only see raw text or a [`CoreError`].

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::config::LlmSettings;
use crate::error::CoreError;
use crate::llm::{Completion, OutputFormat};

const PING_TIMEOUT: Duration = Duration::from_secs(5);

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for an Ollama-compatible model server.
///
/// Constructed once, then cheaply cloned because `reqwest::Client` is an
/// `Arc` internally.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    timeout_seconds: u64,
    default_format: OutputFormat,
    temperature: Option<f32>,
}

impl OllamaProvider {
    pub fn new(settings: &LlmSettings) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| CoreError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            timeout_seconds: settings.timeout_seconds,
            default_format: settings.default_format,
            temperature: settings.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn default_format(&self) -> OutputFormat {
        self.default_format
    }

    /// Reachability check against the model listing endpoint.
    ///
    /// Any HTTP response (including 4xx) means the server is reachable.
    /// Uses a hard 5-second timeout regardless of the configured one.
    pub async fn ping(&self) -> Result<(), CoreError> {
        self.client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(PING_TIMEOUT)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| CoreError::BackendUnavailable(format!("unreachable: {e}")))
    }

    /// Send one generate request and return the model's raw output text.
    pub(crate) async fn complete(&self, completion: &Completion<'_>) -> Result<String, CoreError> {
        let url = format!("{}/api/generate", self.base_url);
        let payload = GenerateRequest {
            model: completion.model.unwrap_or(&self.model),
            prompt: completion.prompt,
            stream: false,
            format: match completion.format {
                OutputFormat::Json => Some("json"),
                OutputFormat::Text => None,
            },
            images: (!completion.images.is_empty()).then_some(completion.images),
            options: completion
                .temperature
                .or(self.temperature)
                .map(|temperature| ModelOptions { temperature }),
        };

        debug!(
            model = %payload.model,
            format = %completion.format,
            prompt_len = completion.prompt.len(),
            images = completion.images.len(),
            "sending generate request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            trace!(prompt = %completion.prompt, "full generate prompt");
        }

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        let response = check_status(response).await?;

        let body = response.text().await.map_err(|e| self.transport_error(&url, e))?;
        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "failed to deserialize generate response");
            CoreError::MalformedResponse(format!("unexpected response envelope: {e}"))
        })?;

        debug!(output_len = parsed.response.len(), done = ?parsed.done, "received generate response");
        trace!(response = %parsed.response, "full generate response");

        Ok(parsed.response)
    }

    fn transport_error(&self, url: &str, e: reqwest::Error) -> CoreError {
        if e.is_timeout() {
            error!(%url, timeout_seconds = self.timeout_seconds, "generate request timed out");
            CoreError::Timeout { seconds: self.timeout_seconds }
        } else {
            error!(%url, error = %e, "generate request failed (transport)");
            CoreError::BackendUnavailable(format!("{url}: {e}"))
        }
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ModelOptions>,
}

#[derive(Debug, Serialize)]
struct ModelOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(alias = "text")]
    response: String,
    #[serde(default)]
    done: Option<bool>,
}

// Error envelope used by Ollama: `{"error": "model 'x' not found"}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
}

/// Consume the response and return it if successful, or a structured error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(env) => format!("HTTP {status}: {}", env.error),
        Err(_) => format!("HTTP {status}: {body}"),
    };

    error!(%status, %message, "generate request returned HTTP error");
    Err(CoreError::BackendUnavailable(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructs_provider() {
        let provider = OllamaProvider::new(&LlmSettings {
            base_url: "http://127.0.0.1:11434/".into(),
            ..LlmSettings::default()
        })
        .unwrap();
        assert_eq!(provider.base_url, "http://127.0.0.1:11434");
        assert_eq!(provider.model(), "llama3.1:8b");
    }

    #[test]
    fn request_omits_unset_fields() {
        let payload = GenerateRequest {
            model: "m",
            prompt: "p",
            stream: false,
            format: None,
            images: None,
            options: None,
        };
        let v = serde_json::to_value(&payload).unwrap();
        assert_eq!(v, serde_json::json!({"model": "m", "prompt": "p", "stream": false}));
    }

    #[test]
    fn request_carries_json_format_and_images() {
        let images = vec!["aGVsbG8=".to_string()];
        let payload = GenerateRequest {
            model: "m",
            prompt: "p",
            stream: false,
            format: Some("json"),
            images: Some(&images),
            options: Some(ModelOptions { temperature: 0.5 }),
        };
        let v = serde_json::to_value(&payload).unwrap();
        assert_eq!(v["format"], "json");
        assert_eq!(v["images"][0], "aGVsbG8=");
        assert_eq!(v["options"]["temperature"], 0.5);
    }

    #[test]
    fn response_accepts_text_alias() {
        let r: GenerateResponse = serde_json::from_str(r#"{"text": "hi"}"#).unwrap();
        assert_eq!(r.response, "hi");
        let r: GenerateResponse =
            serde_json::from_str(r#"{"response": "yo", "done": true}"#).unwrap();
        assert_eq!(r.response, "yo");
        assert_eq!(r.done, Some(true));
    }
}
