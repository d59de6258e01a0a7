//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults.
//! The `load` module converts them into the public `types` structs.

use serde::Deserialize;

use super::types::*;

// ── Top-level ────────────────────────────────────────────────────────────────

/// Raw TOML shape, the serde target before resolution.
#[derive(Deserialize)]
pub(super) struct RawConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub llm: RawLlm,
    #[serde(default)]
    pub vision: RawVision,
}

// ── LLM ──────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawLlm {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_format")]
    pub default_format: String,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            model: default_model(),
            timeout_seconds: default_timeout_seconds(),
            default_format: default_format(),
            temperature: None,
        }
    }
}

// ── Vision ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawVision {
    #[serde(default)]
    pub ocr_prepass: bool,
    #[serde(default)]
    pub vision_model: Option<String>,
    #[serde(default = "default_tesseract_bin")]
    pub tesseract_bin: String,
    #[serde(default = "default_ocr_languages")]
    pub ocr_languages: String,
    #[serde(default = "default_confidence")]
    pub default_confidence: f64,
    #[serde(default)]
    pub quality: RawQuality,
}

impl Default for RawVision {
    fn default() -> Self {
        Self {
            ocr_prepass: false,
            vision_model: None,
            tesseract_bin: default_tesseract_bin(),
            ocr_languages: default_ocr_languages(),
            default_confidence: default_confidence(),
            quality: RawQuality::default(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawQuality {
    #[serde(default = "default_high_quality")]
    pub high: f64,
    #[serde(default = "default_medium_quality")]
    pub medium: f64,
}

impl Default for RawQuality {
    fn default() -> Self {
        Self { high: default_high_quality(), medium: default_medium_quality() }
    }
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}
fn default_format() -> String {
    "text".to_string()
}
fn default_tesseract_bin() -> String {
    DEFAULT_TESSERACT_BIN.to_string()
}
fn default_ocr_languages() -> String {
    DEFAULT_OCR_LANGUAGES.to_string()
}
fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}
fn default_high_quality() -> f64 {
    DEFAULT_HIGH_QUALITY
}
fn default_medium_quality() -> f64 {
    DEFAULT_MEDIUM_QUALITY
}
