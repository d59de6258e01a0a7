//! DNA Analyzer: pedagogical profile of a math problem.

pub mod schema;

use tracing::debug;

use crate::error::CoreError;
use crate::llm::{GenerateOptions, LlmClient};
use crate::prompts;

pub use schema::{CognitiveLevel, DnaTag, ProblemDna, TagKind};

const ANALYSIS_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Clone)]
pub struct DnaAnalyzer {
    client: LlmClient,
}

impl DnaAnalyzer {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    /// Full profile in one JSON-mode call. No caching across calls.
    pub async fn analyze(&self, problem_text: &str) -> Result<ProblemDna, CoreError> {
        let prompt = prompts::analysis::dna_prompt(problem_text)?;
        let reply = self.client.generate_json(&prompt, &Self::options()).await?;
        let dna = schema::problem_dna_from_value(&reply)?;
        debug!(
            tags = dna.tags.len(),
            difficulty = dna.difficulty,
            level = %dna.cognitive_level,
            "problem analyzed"
        );
        Ok(dna)
    }

    /// Tags only.
    pub async fn extract_tags(&self, problem_text: &str) -> Result<Vec<DnaTag>, CoreError> {
        let prompt = prompts::analysis::tagging_prompt(problem_text)?;
        let reply = self.client.generate_json(&prompt, &Self::options()).await?;
        schema::tags_from_reply(&reply)
    }

    /// Curriculum path only, e.g. `Math.Algebra.Linear_Equations`.
    pub async fn suggest_curriculum(&self, problem_text: &str) -> Result<String, CoreError> {
        let prompt = prompts::analysis::curriculum_prompt(problem_text)?;
        let reply = self.client.generate_text(&prompt, &Self::options()).await?;
        first_path_line(&reply).ok_or_else(|| {
            CoreError::MalformedResponse(format!("no curriculum path in reply: {}", reply.trim()))
        })
    }

    fn options() -> GenerateOptions {
        GenerateOptions::default().with_temperature(ANALYSIS_TEMPERATURE)
    }
}

/// First line shaped like a dot- or slash-delimited hierarchy, without list
/// markers or surrounding quotes. Prose lines never qualify.
fn first_path_line(reply: &str) -> Option<String> {
    reply
        .lines()
        .map(|l| l.trim().trim_start_matches(['-', '*']).trim().trim_matches(['"', '\'', '`']).trim())
        .find(|l| is_curriculum_path(l))
        .map(str::to_string)
}

fn is_curriculum_path(line: &str) -> bool {
    !line.is_empty()
        && !line.contains(char::is_whitespace)
        && line.contains(['.', '/'])
        && line.split(['.', '/']).all(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::OutputFormat;
    use crate::llm::providers::scripted::ScriptedProvider;
    use serde_json::json;

    fn analyzer(scripted: &ScriptedProvider) -> DnaAnalyzer {
        DnaAnalyzer::new(LlmClient::from(scripted.clone()))
    }

    #[tokio::test]
    async fn analyze_requests_json_at_low_temperature() {
        let scripted = ScriptedProvider::new();
        scripted.push_json(&json!({
            "difficulty": 0.5,
            "tags": [],
            "curriculum_path": "Math.Algebra",
            "cognitive_level": "understand"
        }));
        let dna = analyzer(&scripted).analyze("x + 1 = 2").await.unwrap();
        assert!(dna.tags.is_empty());

        let call = &scripted.calls()[0];
        assert_eq!(call.format, OutputFormat::Json);
        assert_eq!(call.temperature, Some(ANALYSIS_TEMPERATURE));
        assert!(call.prompt.contains("x + 1 = 2"));
    }

    #[tokio::test]
    async fn blank_problem_never_reaches_backend() {
        let scripted = ScriptedProvider::new();
        let err = analyzer(&scripted).analyze(" ").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidTemplateInput { .. }));
        assert!(scripted.calls().is_empty());
    }

    #[tokio::test]
    async fn schema_failure_surfaces() {
        let scripted = ScriptedProvider::new();
        scripted.push_json(&json!({"difficulty": 0.5}));
        let err = analyzer(&scripted).analyze("x = 1").await.unwrap_err();
        assert!(matches!(err, CoreError::SchemaValidation { .. }));
    }

    #[tokio::test]
    async fn extract_tags_validates_each_tag() {
        let scripted = ScriptedProvider::new();
        scripted.push_json(&json!({"tags": [
            {"tag": "Mathematics", "type": "subject", "confidence": 0.99},
            {"tag": "Algebra", "type": "concept", "confidence": "0.95"}
        ]}));
        let tags = analyzer(&scripted).extract_tags("x = 1").await.unwrap();
        assert_eq!(tags[1].confidence, 0.95);
        assert_eq!(tags[0].kind, TagKind::Subject);
    }

    #[tokio::test]
    async fn curriculum_path_is_cleaned() {
        let scripted = ScriptedProvider::new();
        scripted.push_text("\n  \"Math.Algebra.Linear_Equations\"\nBecause ...");
        let path = analyzer(&scripted).suggest_curriculum("2x+3=7").await.unwrap();
        assert_eq!(path, "Math.Algebra.Linear_Equations");
    }

    #[tokio::test]
    async fn curriculum_preamble_is_skipped() {
        let scripted = ScriptedProvider::new();
        scripted.push_text("Here is the curriculum path:\nMath.Algebra.Linear_Equations");
        let path = analyzer(&scripted).suggest_curriculum("2x+3=7").await.unwrap();
        assert_eq!(path, "Math.Algebra.Linear_Equations");
    }

    #[tokio::test]
    async fn curriculum_prose_only_is_malformed() {
        let scripted = ScriptedProvider::new();
        scripted.push_text("I am not sure which path fits this problem.");
        let err = analyzer(&scripted).suggest_curriculum("2x+3=7").await.unwrap_err();
        assert!(matches!(err, CoreError::MalformedResponse(_)));
    }

    #[test]
    fn path_shapes() {
        assert!(is_curriculum_path("중학수학.방정식"));
        assert!(is_curriculum_path("Math/Geometry/Triangles"));
        assert!(!is_curriculum_path("Math"));
        assert!(!is_curriculum_path("Math..Algebra"));
        assert!(!is_curriculum_path("See Math.Algebra"));
    }

    #[tokio::test]
    async fn empty_curriculum_reply_is_malformed() {
        let scripted = ScriptedProvider::new();
        scripted.push_text("  \n ");
        let err = analyzer(&scripted).suggest_curriculum("2x+3=7").await.unwrap_err();
        assert!(matches!(err, CoreError::MalformedResponse(_)));
    }
}
