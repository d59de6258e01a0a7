//! Crate-wide error type.
//!
//! Every façade operation returns `Result<_, CoreError>`. Variants carry
//! plain strings so the error is `Clone` and can be replayed by the scripted
//! backend or compared in tests.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Caller supplied a missing or out-of-range template field.
    #[error("invalid template input: {field}: {reason}")]
    InvalidTemplateInput { field: String, reason: String },

    #[error("unreadable image: {0}")]
    UnreadableImage(String),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("backend timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Backend output could not be parsed at all.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Backend output parsed but does not match the expected shape.
    #[error("schema validation failed: {field}: {reason}")]
    SchemaValidation { field: String, reason: String },

    #[error("local ocr failed: {0}")]
    LocalOcr(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),
}

impl CoreError {
    pub(crate) fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTemplateInput { field: field.to_string(), reason: reason.into() }
    }

    pub(crate) fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaValidation { field: field.into(), reason: reason.into() }
    }

    /// Whether retrying the same call unchanged can succeed.
    ///
    /// Only transport-level failures qualify; the crate itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_) | Self::Timeout { .. })
    }
}
