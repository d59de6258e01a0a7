//! Vision prompts for text and formula extraction.
//!
//! When a local OCR draft exists it is embedded so the model corrects it
//! instead of transcribing from scratch.

fn draft_section(draft: Option<&str>) -> String {
    match draft.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => format!(
            "\nA local OCR engine produced this draft. It may contain recognition errors; \
             correct it against the image:\n<draft>\n{d}\n</draft>\n"
        ),
        None => String::new(),
    }
}

/// Prompt for plain-text transcription (Korean and English).
pub fn text_prompt(draft: Option<&str>) -> String {
    format!(
        r#"Transcribe all text in the attached image (Korean and English).
Keep the reading order and line breaks. Write mathematical expressions inline as plain text.
{draft}
Return ONLY this JSON object:
{{
    "text": "the transcribed text",
    "confidence": 0.0-1.0
}}"#,
        draft = draft_section(draft)
    )
}

/// Prompt for LaTeX transcription of the mathematical content.
pub fn latex_prompt(draft: Option<&str>) -> String {
    format!(
        r#"Transcribe the mathematical content of the attached image as LaTeX.
Use inline math for expressions inside sentences and display math for standalone formulas.
{draft}
Return ONLY this JSON object:
{{
    "latex": "\\frac{{1}}{{2}}x + 3 = 7",
    "confidence": 0.0-1.0
}}

IMPORTANT: escape backslashes for JSON (\\frac, not \frac)."#,
        draft = draft_section(draft)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_draft_no_section() {
        assert!(!text_prompt(None).contains("<draft>"));
        assert!(!text_prompt(Some("  ")).contains("<draft>"));
    }

    #[test]
    fn draft_embedded() {
        let p = latex_prompt(Some("x^2 + 1 = 0"));
        assert!(p.contains("<draft>\nx^2 + 1 = 0\n</draft>"));
    }

    #[test]
    fn latex_example_is_escaped_json() {
        let p = latex_prompt(None);
        assert!(p.contains(r#""latex": "\\frac{1}{2}x + 3 = 7""#));
    }
}
