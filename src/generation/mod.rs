//! Problem Generator: twin problems, error solutions, model solutions and
//! variations.
//!
//! Every operation validates its request through the prompt template, makes
//! one text-mode call and wraps the raw reply together with the echoed
//! request fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::llm::{self, GenerateOptions, LlmClient};
use crate::prompts::generation::{
    self as templates, CorrectSolutionRequest, ErrorSolutionRequest, KNOWN_ERROR_TYPES,
    TwinRequest, VariationRequest,
};

const TWIN_TEMPERATURE: f32 = 0.7;
const ERROR_TEMPERATURE: f32 = 0.5;
const CORRECT_TEMPERATURE: f32 = 0.3;
const VARIATION_TEMPERATURE: f32 = 0.6;

/// Raw model output plus the request fields that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedProblem {
    pub content: String,
    pub metadata: BTreeMap<String, Value>,
}

impl GeneratedProblem {
    /// Parse `content` as the JSON object the prompt asked for.
    pub fn structured(&self) -> Result<Value, CoreError> {
        llm::json::extract_json(&self.content)
    }

    /// The `kind` metadata entry: `twin`, `error_solution`, `correct_solution`
    /// or `variation`.
    pub fn kind(&self) -> Option<&str> {
        self.metadata.get("kind").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct ProblemGenerator {
    client: LlmClient,
}

impl ProblemGenerator {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    /// Same logic and solving steps, new story and numbers.
    pub async fn generate_twin(&self, request: &TwinRequest) -> Result<GeneratedProblem, CoreError> {
        let prompt = templates::twin_prompt(request)?;
        let mut metadata = BTreeMap::new();
        metadata.insert("kind".to_string(), json!("twin"));
        if request.preserve_metadata && !request.metadata.is_empty() {
            metadata.insert("original_metadata".to_string(), json!(request.metadata));
        }
        self.run("twin", &prompt, TWIN_TEMPERATURE, metadata).await
    }

    /// A plausible wrong solution simulating one of `error_types`.
    pub async fn generate_error_solution(
        &self,
        request: &ErrorSolutionRequest,
    ) -> Result<GeneratedProblem, CoreError> {
        let prompt = templates::error_solution_prompt(request)?;
        for name in &request.error_types {
            if !KNOWN_ERROR_TYPES.contains(&name.trim()) {
                warn!(error_type = %name, "unknown error type, passing through verbatim");
            }
        }
        let mut metadata = BTreeMap::new();
        metadata.insert("kind".to_string(), json!("error_solution"));
        metadata.insert("error_types".to_string(), json!(request.error_types));
        metadata.insert("difficulty".to_string(), json!(request.difficulty));
        self.run("error_solution", &prompt, ERROR_TEMPERATURE, metadata).await
    }

    /// A fully correct step-by-step solution.
    pub async fn generate_correct_solution(
        &self,
        request: &CorrectSolutionRequest,
    ) -> Result<GeneratedProblem, CoreError> {
        let prompt = templates::correct_solution_prompt(request)?;
        let mut metadata = BTreeMap::new();
        metadata.insert("kind".to_string(), json!("correct_solution"));
        self.run("correct_solution", &prompt, CORRECT_TEMPERATURE, metadata).await
    }

    pub async fn generate_variation(
        &self,
        request: &VariationRequest,
    ) -> Result<GeneratedProblem, CoreError> {
        let prompt = templates::variation_prompt(request)?;
        let mut metadata = BTreeMap::new();
        metadata.insert("kind".to_string(), json!("variation"));
        metadata.insert("variation_type".to_string(), json!(request.variation_type));
        if let Some(level) = request.target_level {
            metadata.insert("target_level".to_string(), json!(level));
        }
        self.run("variation", &prompt, VARIATION_TEMPERATURE, metadata).await
    }

    async fn run(
        &self,
        kind: &str,
        prompt: &str,
        temperature: f32,
        metadata: BTreeMap<String, Value>,
    ) -> Result<GeneratedProblem, CoreError> {
        let options = GenerateOptions::text().with_temperature(temperature);
        let content = self.client.generate_text(prompt, &options).await?;
        if content.trim().is_empty() {
            return Err(CoreError::MalformedResponse(format!("empty {kind} output")));
        }
        debug!(kind, chars = content.len(), "problem generated");
        Ok(GeneratedProblem { content, metadata })
    }
}
