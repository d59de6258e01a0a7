//! Prompt template registry.
//!
//! Every template is a pure function from structured input to a prompt
//! string: no I/O, no clock, no randomness. Input checks happen here so a
//! malformed request never reaches the backend; failures are
//! [`CoreError::InvalidTemplateInput`] naming the field.

pub mod analysis;
pub mod diagnosis;
pub mod generation;
pub mod ocr;

use crate::error::CoreError;

pub use diagnosis::{DiagnosisRequest, RubricCriterion, RubricRequest};
pub use generation::{
    CorrectSolutionRequest, ErrorSolutionRequest, TwinRequest, VariationRequest, VariationType,
};

/// Reject blank required text fields.
pub(crate) fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CoreError::invalid_input(field, "must not be empty"))
    } else {
        Ok(trimmed)
    }
}

/// Reject values outside the closed unit interval (NaN included).
pub(crate) fn require_unit(field: &str, value: f64) -> Result<f64, CoreError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(CoreError::invalid_input(field, format!("must be within [0, 1], got {value}")))
    }
}
