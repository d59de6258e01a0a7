//! Configuration loading.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and validates the resolved values.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::CoreError;
use crate::llm::OutputFormat;
use crate::logger;

use super::raw::RawConfig;
use super::types::*;

/// Deep-merge two TOML values.
/// Tables are merged recursively; the overlay only needs to specify keys that
/// differ from the base. For every other type (string, integer, array, …)
/// the overlay value replaces the base value wholesale.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file, follow any `[meta] base = "..."` chain, and return the
/// fully merged `toml::Value`. `visited` carries canonicalized paths already
/// seen in this chain so circular references are caught early.
fn load_raw_merged(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<toml::Value, CoreError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(CoreError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| CoreError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&raw)
        .map_err(|e| CoreError::Config(format!("parse error in {}: {e}", path.display())))?;

    if let Some(base_str) = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
    {
        let base_path = if Path::new(base_str).is_absolute() {
            PathBuf::from(base_str)
        } else {
            path.parent().unwrap_or(Path::new(".")).join(base_str)
        };
        let base_val = load_raw_merged(&base_path, visited)?;
        Ok(merge_toml(base_val, overlay_val))
    } else {
        Ok(overlay_val)
    }
}

/// Load config from `path`, following `[meta] base` inheritance.
pub fn load_from(path: &Path) -> Result<Config, CoreError> {
    let merged = load_raw_merged(path, &mut HashSet::new())?;
    let parsed: RawConfig = Deserialize::deserialize(merged).map_err(|e: toml::de::Error| {
        CoreError::Config(format!("config error in {}: {e}", path.display()))
    })?;
    resolve(parsed)
}

/// Parse a config document held in memory. `[meta] base` is not followed.
pub fn from_toml_str(source: &str) -> Result<Config, CoreError> {
    let parsed: RawConfig =
        toml::from_str(source).map_err(|e| CoreError::Config(format!("parse error: {e}")))?;
    resolve(parsed)
}

fn resolve(parsed: RawConfig) -> Result<Config, CoreError> {
    logger::parse_filter(&parsed.log_level)
        .map_err(|e| CoreError::Config(format!("log_level: {e}")))?;

    let llm = parsed.llm;
    if llm.base_url.trim().is_empty() {
        return Err(CoreError::Config("llm.base_url must not be empty".into()));
    }
    if llm.model.trim().is_empty() {
        return Err(CoreError::Config("llm.model must not be empty".into()));
    }
    if llm.timeout_seconds == 0 {
        return Err(CoreError::Config("llm.timeout_seconds must be greater than 0".into()));
    }
    let default_format: OutputFormat = llm
        .default_format
        .parse()
        .map_err(|e| CoreError::Config(format!("llm.default_format: {e}")))?;

    let vision = parsed.vision;
    let quality = QualityThresholds { high: vision.quality.high, medium: vision.quality.medium };
    check_unit("vision.quality.high", quality.high)?;
    check_unit("vision.quality.medium", quality.medium)?;
    if quality.medium > quality.high {
        return Err(CoreError::Config(format!(
            "vision.quality.medium ({}) must not exceed vision.quality.high ({})",
            quality.medium, quality.high
        )));
    }
    check_unit("vision.default_confidence", vision.default_confidence)?;

    Ok(Config {
        log_level: parsed.log_level,
        llm: LlmSettings {
            provider: llm.provider,
            base_url: llm.base_url.trim_end_matches('/').to_string(),
            model: llm.model,
            timeout_seconds: llm.timeout_seconds,
            default_format,
            temperature: llm.temperature,
        },
        vision: VisionSettings {
            ocr_prepass: vision.ocr_prepass,
            vision_model: vision.vision_model.filter(|m| !m.trim().is_empty()),
            tesseract_bin: vision.tesseract_bin,
            ocr_languages: vision.ocr_languages,
            default_confidence: vision.default_confidence,
            quality,
        },
    })
}

fn check_unit(field: &str, value: f64) -> Result<(), CoreError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Config(format!("{field} must be within [0, 1], got {value}")))
    }
}
