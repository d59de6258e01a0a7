//! JSON recovery from model output.
//!
//! Models asked for JSON still wrap it in code fences, prepend reasoning
//! blocks or add a sentence of prose. [`extract_json`] peels those layers off
//! and parses what remains. It never invents a value: when nothing parses the
//! caller gets [`CoreError::MalformedResponse`].

use serde_json::Value;

use crate::error::CoreError;

const PREVIEW_CHARS: usize = 100;

/// Parse the JSON object or array contained in `raw`.
pub fn extract_json(raw: &str) -> Result<Value, CoreError> {
    let without_think = strip_think_tags(raw);
    let cleaned = strip_code_fence(without_think.trim());

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        return Ok(value);
    }

    if let Some(candidate) = outer_json(cleaned) {
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            return Ok(value);
        }
    }

    Err(CoreError::MalformedResponse(format!(
        "no valid JSON in model output: {}",
        preview(raw)
    )))
}

/// Remove every closed `<think>…</think>` block.
pub fn strip_think_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("<think>") {
        match rest[start..].find("</think>") {
            Some(end) => {
                out.push_str(&rest[..start]);
                rest = &rest[start + end + "</think>".len()..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

fn strip_code_fence(text: &str) -> &str {
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    // drop the info string (`json`, `JSON`, …) on the opening line
    let body = match body.find('\n') {
        Some(nl) => &body[nl + 1..],
        None => body,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Slice from the first opening bracket to its matching-kind last closer.
fn outer_json(text: &str) -> Option<&str> {
    let obj = text.find('{');
    let arr = text.find('[');
    let (start, closer) = match (obj, arr) {
        (Some(o), Some(a)) if a < o => (a, ']'),
        (Some(o), _) => (o, '}'),
        (None, Some(a)) => (a, ']'),
        (None, None) => return None,
    };
    let end = text.rfind(closer)?;
    (end > start).then(|| &text[start..=end])
}

fn preview(raw: &str) -> String {
    let mut p: String = raw.chars().take(PREVIEW_CHARS).collect();
    if raw.chars().count() > PREVIEW_CHARS {
        p.push_str("...");
    }
    p
}
