//! Local OCR pre-pass through the `tesseract` command-line tool.
//!
//! The image is piped on stdin and the word table comes back as TSV, which
//! carries a per-word confidence (0–100). The child process is killed if the
//! future is dropped.

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::CoreError;

/// Draft transcription from the local engine.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrDraft {
    pub text: String,
    /// Mean word confidence scaled to [0, 1]; `None` when no word was read.
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: String,
    languages: String,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<String>, languages: impl Into<String>) -> Self {
        Self { binary: binary.into(), languages: languages.into() }
    }

    pub async fn recognize(&self, image: &[u8]) -> Result<OcrDraft, CoreError> {
        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", self.languages.as_str(), "tsv"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CoreError::LocalOcr(format!("cannot start {}: {e}", self.binary)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CoreError::LocalOcr("child stdin not captured".into()))?;
        let feed = async move {
            stdin.write_all(image).await?;
            stdin.shutdown().await
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output =
            output.map_err(|e| CoreError::LocalOcr(format!("{} did not finish: {e}", self.binary)))?;
        if let Err(e) = fed {
            // a broken pipe here surfaces through the exit status below
            warn!(error = %e, "failed to feed image to tesseract");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::LocalOcr(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        let draft = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        debug!(chars = draft.text.len(), confidence = ?draft.confidence, "local ocr draft ready");
        Ok(draft)
    }
}

/// Rebuild text and mean confidence from tesseract's TSV word table.
///
/// Columns: level, page, block, par, line, word, left, top, width, height,
/// conf, text. Only word rows (level 5) with a non-negative confidence count.
pub fn parse_tsv(tsv: &str) -> OcrDraft {
    let mut lines: Vec<((u32, u32, u32, u32), Vec<&str>)> = Vec::new();
    let mut conf_sum = 0.0;
    let mut words = 0usize;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let text = cols[11].trim();
        let Ok(conf) = cols[10].trim().parse::<f64>() else {
            continue;
        };
        if text.is_empty() || conf < 0.0 {
            continue;
        }
        let key = (
            cols[1].parse().unwrap_or(0),
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );
        match lines.last_mut() {
            Some((k, ws)) if *k == key => ws.push(text),
            _ => lines.push((key, vec![text])),
        }
        conf_sum += conf.min(100.0);
        words += 1;
    }

    let text = lines.iter().map(|(_, ws)| ws.join(" ")).collect::<Vec<_>>().join("\n");
    let confidence = (words > 0).then(|| conf_sum / words as f64 / 100.0);
    OcrDraft { text, confidence }
}
