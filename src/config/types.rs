//! Public configuration types.
//!
//! These are the resolved, validated structs the client adapter and the
//! façades consume. Raw TOML deserialization types live in `raw.rs`.

use crate::llm::OutputFormat;
use crate::vision::Quality;

pub(crate) const DEFAULT_PROVIDER: &str = "ollama";
pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub(crate) const DEFAULT_MODEL: &str = "llama3.1:8b";
pub(crate) const DEFAULT_TIMEOUT_SECONDS: u64 = 120;
pub(crate) const DEFAULT_TESSERACT_BIN: &str = "tesseract";
pub(crate) const DEFAULT_OCR_LANGUAGES: &str = "eng+kor";
pub(crate) const DEFAULT_CONFIDENCE: f64 = 0.5;
pub(crate) const DEFAULT_HIGH_QUALITY: f64 = 0.85;
pub(crate) const DEFAULT_MEDIUM_QUALITY: f64 = 0.6;

// ── LLM ──────────────────────────────────────────────────────────────────────

/// Client adapter settings. Populated from `[llm]` in the TOML.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    /// Backend name: `"ollama"` or `"scripted"`.
    pub provider: String,
    /// Server root, e.g. `http://localhost:11434` (no trailing slash).
    pub base_url: String,
    /// Model used when a call does not name one.
    pub model: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Output format used when a call does not specify one.
    pub default_format: OutputFormat,
    /// Sampling temperature used when a call does not specify one.
    /// `None` leaves the server default in place.
    pub temperature: Option<f32>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            default_format: OutputFormat::Text,
            temperature: None,
        }
    }
}

// ── Vision ───────────────────────────────────────────────────────────────────

/// Confidence cutoffs for LaTeX quality buckets (`[vision.quality]`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityThresholds {
    /// Minimum confidence for [`Quality::High`].
    pub high: f64,
    /// Minimum confidence for [`Quality::Medium`].
    pub medium: f64,
}

impl QualityThresholds {
    /// Map a confidence already known to lie in [0, 1] to its bucket.
    pub fn bucket(&self, confidence: f64) -> Quality {
        if confidence >= self.high {
            Quality::High
        } else if confidence >= self.medium {
            Quality::Medium
        } else {
            Quality::Low
        }
    }
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self { high: DEFAULT_HIGH_QUALITY, medium: DEFAULT_MEDIUM_QUALITY }
    }
}

/// Vision façade settings. Populated from `[vision]` in the TOML.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionSettings {
    /// Run the local OCR engine before asking the model.
    pub ocr_prepass: bool,
    /// Vision-capable model; falls back to the client's model when `None`.
    pub vision_model: Option<String>,
    pub tesseract_bin: String,
    /// Tesseract language list, e.g. `eng+kor`.
    pub ocr_languages: String,
    /// Text confidence reported when neither OCR nor the model gives one.
    pub default_confidence: f64,
    pub quality: QualityThresholds,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            ocr_prepass: false,
            vision_model: None,
            tesseract_bin: DEFAULT_TESSERACT_BIN.to_string(),
            ocr_languages: DEFAULT_OCR_LANGUAGES.to_string(),
            default_confidence: DEFAULT_CONFIDENCE,
            quality: QualityThresholds::default(),
        }
    }
}

// ── Top-level ────────────────────────────────────────────────────────────────

/// Fully-resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub log_level: String,
    pub llm: LlmSettings,
    pub vision: VisionSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            llm: LlmSettings::default(),
            vision: VisionSettings::default(),
        }
    }
}
