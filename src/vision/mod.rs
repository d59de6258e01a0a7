//! Vision façade: text and LaTeX extraction from images.
//!
//! Pipeline per call: load and sniff the image → optional local OCR draft →
//! one JSON-mode request to a vision-capable model with the image attached →
//! field validation. Client failures propagate unchanged.

pub mod image;
pub mod ocr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::analysis::schema::optional_unit_field;
use crate::config::VisionSettings;
use crate::error::CoreError;
use crate::llm::{GenerateOptions, LlmClient};
use crate::prompts;

pub use image::{ImageFormat, ImageRef, LoadedImage};
use ocr::{OcrDraft, TesseractOcr};

const VISION_TEMPERATURE: f32 = 0.1;

/// Coarse LaTeX quality bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextExtraction {
    pub text: String,
    /// In [0, 1].
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatexExtraction {
    pub latex: String,
    pub quality: Quality,
}

#[derive(Debug, Clone)]
pub struct VisionFacade {
    client: LlmClient,
    settings: VisionSettings,
    ocr: Option<TesseractOcr>,
}

impl VisionFacade {
    /// Façade with default thresholds; `ocr_prepass` enables the local
    /// tesseract draft.
    pub fn new(client: LlmClient, ocr_prepass: bool) -> Self {
        Self::with_settings(client, VisionSettings { ocr_prepass, ..VisionSettings::default() })
    }

    pub fn with_settings(client: LlmClient, settings: VisionSettings) -> Self {
        let ocr = settings
            .ocr_prepass
            .then(|| TesseractOcr::new(&settings.tesseract_bin, &settings.ocr_languages));
        Self { client, settings, ocr }
    }

    pub fn settings(&self) -> &VisionSettings {
        &self.settings
    }

    /// Transcribe the text in an image.
    ///
    /// Confidence comes from the local OCR pass when it ran, else from the
    /// model, else the configured conservative default.
    pub async fn extract_text(&self, image: &ImageRef) -> Result<TextExtraction, CoreError> {
        let (loaded, draft) = self.prepare(image).await?;
        let prompt = prompts::ocr::text_prompt(draft.as_ref().map(|d| d.text.as_str()));
        let reply = self.client.generate_json(&prompt, &self.options(&loaded)).await?;

        let text = required_string(&reply, "text")?;
        let model_confidence = optional_unit_field(&reply, "confidence")?;
        let confidence = draft
            .and_then(|d| d.confidence)
            .or(model_confidence)
            .unwrap_or(self.settings.default_confidence);

        debug!(chars = text.len(), confidence, "text extracted");
        Ok(TextExtraction { text, confidence })
    }

    /// Transcribe the mathematical content of an image as LaTeX.
    ///
    /// A reply without a confidence lands in [`Quality::Low`].
    pub async fn extract_latex(&self, image: &ImageRef) -> Result<LatexExtraction, CoreError> {
        let (loaded, draft) = self.prepare(image).await?;
        let prompt = prompts::ocr::latex_prompt(draft.as_ref().map(|d| d.text.as_str()));
        let reply = self.client.generate_json(&prompt, &self.options(&loaded)).await?;

        let latex = required_string(&reply, "latex")?;
        let quality = match optional_unit_field(&reply, "confidence")? {
            Some(c) => self.settings.quality.bucket(c),
            None => Quality::Low,
        };

        debug!(chars = latex.len(), ?quality, "latex extracted");
        Ok(LatexExtraction { latex, quality })
    }

    async fn prepare(&self, image: &ImageRef) -> Result<(LoadedImage, Option<OcrDraft>), CoreError> {
        let loaded = image::load(image).await?;
        let draft = match &self.ocr {
            Some(ocr) => Some(ocr.recognize(&loaded.bytes).await?),
            None => None,
        };
        Ok((loaded, draft))
    }

    fn options(&self, image: &LoadedImage) -> GenerateOptions {
        let options = GenerateOptions::json()
            .with_temperature(VISION_TEMPERATURE)
            .with_image(image.to_base64());
        match &self.settings.vision_model {
            Some(model) => options.with_model(model.clone()),
            None => options,
        }
    }
}

/// Required string field. A blank transcription is treated like blank
/// generator output.
fn required_string(reply: &Value, field: &str) -> Result<String, CoreError> {
    match reply.get(field) {
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(CoreError::MalformedResponse(format!("empty {field} in vision reply")))
        }
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(CoreError::schema(field, format!("expected a string, got {other}"))),
        None => Err(CoreError::schema(field, "missing")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::providers::scripted::ScriptedProvider;
    use serde_json::json;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn facade(scripted: &ScriptedProvider) -> VisionFacade {
        VisionFacade::new(LlmClient::from(scripted.clone()), false)
    }

    fn png() -> ImageRef {
        ImageRef::Bytes(PNG.to_vec())
    }

    #[tokio::test]
    async fn text_uses_model_confidence_without_ocr() {
        let scripted = ScriptedProvider::new();
        scripted.push_json(&json!({"text": "2x + 3 = 7", "confidence": 0.92}));
        let out = facade(&scripted).extract_text(&png()).await.unwrap();
        assert_eq!(out, TextExtraction { text: "2x + 3 = 7".into(), confidence: 0.92 });

        let call = &scripted.calls()[0];
        assert_eq!(call.image_count, 1);
        assert_eq!(call.temperature, Some(VISION_TEMPERATURE));
    }

    #[tokio::test]
    async fn text_defaults_confidence_when_absent() {
        let scripted = ScriptedProvider::new();
        scripted.push_json(&json!({"text": "hello"}));
        let out = facade(&scripted).extract_text(&png()).await.unwrap();
        assert_eq!(out.confidence, 0.5);
    }

    #[tokio::test]
    async fn text_field_is_required() {
        let scripted = ScriptedProvider::new();
        scripted.push_json(&json!({"transcript": "hello"}));
        let err = facade(&scripted).extract_text(&png()).await.unwrap_err();
        assert!(matches!(err, CoreError::SchemaValidation { ref field, .. } if field == "text"));
    }

    #[tokio::test]
    async fn blank_transcription_is_malformed() {
        let scripted = ScriptedProvider::new();
        scripted.push_json(&json!({"text": "  ", "confidence": 0.9}));
        scripted.push_json(&json!({"latex": "", "confidence": 0.9}));
        let v = facade(&scripted);
        assert!(matches!(v.extract_text(&png()).await, Err(CoreError::MalformedResponse(_))));
        assert!(matches!(v.extract_latex(&png()).await, Err(CoreError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn latex_buckets_by_threshold() {
        let scripted = ScriptedProvider::new();
        for c in [0.9, 0.7, 0.2] {
            scripted.push_json(&json!({"latex": "x^2", "confidence": c}));
        }
        let v = facade(&scripted);
        assert_eq!(v.extract_latex(&png()).await.unwrap().quality, Quality::High);
        assert_eq!(v.extract_latex(&png()).await.unwrap().quality, Quality::Medium);
        assert_eq!(v.extract_latex(&png()).await.unwrap().quality, Quality::Low);
    }

    #[tokio::test]
    async fn latex_without_confidence_is_low() {
        let scripted = ScriptedProvider::new();
        scripted.push_json(&json!({"latex": "\\frac{1}{2}"}));
        let out = facade(&scripted).extract_latex(&png()).await.unwrap();
        assert_eq!(out, LatexExtraction { latex: "\\frac{1}{2}".into(), quality: Quality::Low });
    }

    #[tokio::test]
    async fn latex_out_of_range_confidence_fails() {
        let scripted = ScriptedProvider::new();
        scripted.push_json(&json!({"latex": "x", "confidence": 1.4}));
        let err = facade(&scripted).extract_latex(&png()).await.unwrap_err();
        assert!(matches!(err, CoreError::SchemaValidation { ref field, .. } if field == "confidence"));
    }

    #[tokio::test]
    async fn unreadable_image_never_reaches_backend() {
        let scripted = ScriptedProvider::new();
        let err = facade(&scripted)
            .extract_text(&ImageRef::Bytes(b"not an image".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::UnreadableImage(_)));
        assert!(scripted.calls().is_empty());
    }

    #[tokio::test]
    async fn vision_model_overrides_client_model() {
        let scripted = ScriptedProvider::new();
        scripted.push_json(&json!({"text": "x"}));
        let settings = VisionSettings {
            vision_model: Some("llama3.2-vision:11b".into()),
            ..VisionSettings::default()
        };
        let v = VisionFacade::with_settings(LlmClient::from(scripted.clone()), settings);
        v.extract_text(&png()).await.unwrap();
        assert_eq!(scripted.calls()[0].model, "llama3.2-vision:11b");
    }

    #[tokio::test]
    async fn ocr_failure_is_surfaced() {
        let scripted = ScriptedProvider::new();
        let settings = VisionSettings {
            ocr_prepass: true,
            tesseract_bin: "/nonexistent/tesseract-binary".into(),
            ..VisionSettings::default()
        };
        let v = VisionFacade::with_settings(LlmClient::from(scripted.clone()), settings);
        let err = v.extract_text(&png()).await.unwrap_err();
        assert!(matches!(err, CoreError::LocalOcr(_)));
        assert!(scripted.calls().is_empty());
    }
}
