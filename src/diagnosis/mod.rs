//! Cognitive diagnosis of a student's answer and rubric grading.
//!
//! Stateless like the other façades: each call builds one prompt, makes one
//! JSON-mode call and validates the reply. Knowledge-graph updates are
//! returned to the caller, never applied here.

pub mod schema;

use tracing::debug;

use crate::error::CoreError;
use crate::llm::{GenerateOptions, LlmClient};
use crate::prompts::diagnosis::{self as templates, DiagnosisRequest, RubricRequest};

pub use schema::{
    ConceptUpdate, CriterionScore, DiagnosisResult, ErrorType, MasteryRelation, RubricEvaluation,
};

const DIAGNOSIS_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone)]
pub struct CognitiveDiagnoser {
    client: LlmClient,
}

impl CognitiveDiagnoser {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    /// Locate and classify the first error in a student's answer.
    pub async fn diagnose(&self, request: &DiagnosisRequest) -> Result<DiagnosisResult, CoreError> {
        let prompt = templates::diagnosis_prompt(request)?;
        let reply = self.client.generate_json(&prompt, &Self::options()).await?;
        let result = schema::diagnosis_from_value(&reply)?;
        debug!(
            correct = result.is_correct,
            error_type = result.error_type.map(|t| t.as_str()).unwrap_or("-"),
            updates = result.kg_operations.len(),
            "answer diagnosed"
        );
        Ok(result)
    }

    /// Score an answer against every criterion of `request.rubric`.
    pub async fn evaluate_with_rubric(
        &self,
        request: &RubricRequest,
    ) -> Result<RubricEvaluation, CoreError> {
        let prompt = templates::rubric_prompt(request)?;
        let reply = self.client.generate_json(&prompt, &Self::options()).await?;
        let evaluation = schema::rubric_from_value(&reply, &request.rubric)?;
        debug!(
            total = evaluation.total_score,
            max = evaluation.total_max_score,
            "answer graded"
        );
        Ok(evaluation)
    }

    fn options() -> GenerateOptions {
        GenerateOptions::default().with_temperature(DIAGNOSIS_TEMPERATURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::OutputFormat;
    use crate::llm::providers::scripted::ScriptedProvider;
    use crate::prompts::diagnosis::RubricCriterion;
    use serde_json::json;

    fn diagnoser(scripted: &ScriptedProvider) -> CognitiveDiagnoser {
        CognitiveDiagnoser::new(LlmClient::from(scripted.clone()))
    }

    #[tokio::test]
    async fn diagnose_uses_json_mode() {
        let scripted = ScriptedProvider::new();
        scripted.push_json(&json!({
            "is_correct": false,
            "reasoning_trace": "이항할 때 부호를 바꾸지 않음",
            "error_location": "2x = 7 + 3",
            "error_type": "procedural_error",
            "feedback": "이항하면 부호가 바뀝니다.",
            "recommendation": "일차방정식 이항 연습",
            "confidence": 0.9
        }));

        let request = DiagnosisRequest::new("2x+3=7", "x=5").with_correct_answer("x=2");
        let result = diagnoser(&scripted).diagnose(&request).await.unwrap();
        assert_eq!(result.error_type, Some(ErrorType::ProceduralError));
        assert!(result.kg_operations.is_empty());

        let calls = scripted.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].format, OutputFormat::Json);
        assert_eq!(calls[0].temperature, Some(DIAGNOSIS_TEMPERATURE));
        assert!(calls[0].prompt.contains("x=5"));
    }

    #[tokio::test]
    async fn bad_reply_is_schema_error() {
        let scripted = ScriptedProvider::new();
        scripted.push_json(&json!({"is_correct": "maybe"}));
        let err = diagnoser(&scripted)
            .diagnose(&DiagnosisRequest::new("1+1", "3"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::SchemaValidation { ref field, .. } if field == "is_correct"));
    }

    #[tokio::test]
    async fn blank_answer_never_reaches_backend() {
        let scripted = ScriptedProvider::new();
        let err = diagnoser(&scripted)
            .diagnose(&DiagnosisRequest::new("1+1", "  "))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTemplateInput { .. }));
        assert!(scripted.calls().is_empty());
    }

    #[tokio::test]
    async fn rubric_scores_are_bounded_by_request() {
        let scripted = ScriptedProvider::new();
        scripted.push_json(&json!({
            "scores": {"풀이 과정": {"score": 4, "rationale": "완전함"}},
            "overall_feedback": "좋음"
        }));
        let request = RubricRequest::new(
            "증명하시오",
            "증명",
            vec![RubricCriterion::new("풀이 과정", 3, "논리적 전개")],
        );
        let err = diagnoser(&scripted).evaluate_with_rubric(&request).await.unwrap_err();
        assert!(
            matches!(err, CoreError::SchemaValidation { ref field, .. } if field == "scores.풀이 과정.score")
        );
    }
}
