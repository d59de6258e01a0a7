//! Diagnosis and rubric result types, validated field by field like
//! [`crate::analysis::schema`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analysis::schema::{coerce_f64, non_blank, type_name, unit_field};
use crate::error::CoreError;
use crate::prompts::diagnosis::RubricCriterion;

// ── Enums ────────────────────────────────────────────────────────────────────

/// Class of the first mistake in a student's reasoning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    CalculationSlip,
    KnowledgeGap,
    Misconception,
    ProceduralError,
    ComprehensionError,
    Guessing,
    PartialUnderstanding,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::CalculationSlip => "calculation_slip",
            ErrorType::KnowledgeGap => "knowledge_gap",
            ErrorType::Misconception => "misconception",
            ErrorType::ProceduralError => "procedural_error",
            ErrorType::ComprehensionError => "comprehension_error",
            ErrorType::Guessing => "guessing",
            ErrorType::PartialUnderstanding => "partial_understanding",
        }
    }
}

impl FromStr for ErrorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calculation_slip" => Ok(ErrorType::CalculationSlip),
            "knowledge_gap" => Ok(ErrorType::KnowledgeGap),
            "misconception" => Ok(ErrorType::Misconception),
            "procedural_error" => Ok(ErrorType::ProceduralError),
            "comprehension_error" => Ok(ErrorType::ComprehensionError),
            "guessing" => Ok(ErrorType::Guessing),
            "partial_understanding" => Ok(ErrorType::PartialUnderstanding),
            other => Err(format!("unknown error type '{other}'")),
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the student stands with respect to one concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryRelation {
    Mastered,
    Understands,
    StrugglesWith,
    Misconceives,
}

impl FromStr for MasteryRelation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mastered" => Ok(MasteryRelation::Mastered),
            "understands" => Ok(MasteryRelation::Understands),
            "struggles_with" => Ok(MasteryRelation::StrugglesWith),
            "misconceives" => Ok(MasteryRelation::Misconceives),
            other => Err(format!("unknown relation '{other}'")),
        }
    }
}

// ── Diagnosis ────────────────────────────────────────────────────────────────

/// Suggested change to a student knowledge graph. The crate keeps no
/// profile; callers apply these to their own store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptUpdate {
    pub concept: String,
    pub relation: MasteryRelation,
    /// In [0, 1].
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct DiagnosisResult {
    pub is_correct: bool,
    /// Always present when `is_correct` is false.
    pub error_type: Option<ErrorType>,
    pub reasoning_trace: String,
    pub error_location: Option<String>,
    pub concepts_involved: Vec<String>,
    pub feedback: String,
    pub recommendation: String,
    pub confidence: f64,
    pub kg_operations: Vec<ConceptUpdate>,
}

impl TryFrom<Value> for DiagnosisResult {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        diagnosis_from_value(&value)
    }
}

/// Validate a backend reply as [`DiagnosisResult`].
pub fn diagnosis_from_value(value: &Value) -> Result<DiagnosisResult, CoreError> {
    let obj = as_object(value, "$")?;

    let is_correct = bool_field(obj.get("is_correct"), "is_correct")?;
    let error_type = match obj.get("error_type") {
        None | Some(Value::Null) => None,
        some => Some(
            non_blank(some, "error_type")?
                .parse::<ErrorType>()
                .map_err(|e| CoreError::schema("error_type", e))?,
        ),
    };
    if !is_correct && error_type.is_none() {
        return Err(CoreError::schema("error_type", "required when is_correct is false"));
    }

    let kg_operations = match obj.get("kg_operations") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| concept_update(item, &format!("kg_operations[{i}]")))
            .collect::<Result<_, _>>()?,
        Some(other) => {
            return Err(CoreError::schema(
                "kg_operations",
                format!("expected an array, got {}", type_name(other)),
            ));
        }
    };

    Ok(DiagnosisResult {
        is_correct,
        error_type,
        reasoning_trace: non_blank(obj.get("reasoning_trace"), "reasoning_trace")?,
        error_location: optional_text(obj.get("error_location"), "error_location")?,
        concepts_involved: string_list(obj.get("concepts_involved"), "concepts_involved")?,
        feedback: non_blank(obj.get("feedback"), "feedback")?,
        recommendation: non_blank(obj.get("recommendation"), "recommendation")?,
        confidence: unit_field(obj.get("confidence"), "confidence")?,
        kg_operations,
    })
}

fn concept_update(item: &Value, at: &str) -> Result<ConceptUpdate, CoreError> {
    let obj = as_object(item, at)?;
    let relation_path = format!("{at}.relation");
    Ok(ConceptUpdate {
        concept: non_blank(obj.get("concept"), &format!("{at}.concept"))?,
        relation: non_blank(obj.get("relation"), &relation_path)?
            .parse()
            .map_err(|e: String| CoreError::schema(&relation_path, e))?,
        strength: unit_field(obj.get("strength"), &format!("{at}.strength"))?,
    })
}

// ── Rubric ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionScore {
    pub criterion: String,
    pub score: f64,
    pub max_score: u32,
    pub rationale: String,
    pub feedback: String,
}

/// Rubric grading. Totals are summed from the criteria, not read from the
/// model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RubricEvaluation {
    /// In rubric order.
    pub scores: Vec<CriterionScore>,
    pub total_score: f64,
    pub total_max_score: u32,
    pub overall_feedback: String,
    pub concepts_to_review: Vec<String>,
}

/// Validate a rubric reply against the criteria that were asked for.
pub fn rubric_from_value(
    value: &Value,
    rubric: &[RubricCriterion],
) -> Result<RubricEvaluation, CoreError> {
    let obj = as_object(value, "$")?;
    let scores_obj = match obj.get("scores") {
        Some(v) => as_object(v, "scores")?,
        None => return Err(CoreError::schema("scores", "missing")),
    };
    let by_name: HashMap<&str, &Value> = scores_obj.iter().map(|(k, v)| (k.trim(), v)).collect();

    let mut scores = Vec::with_capacity(rubric.len());
    for criterion in rubric {
        let name = criterion.name.trim();
        let at = format!("scores.{name}");
        let entry = by_name.get(name).ok_or_else(|| CoreError::schema(&at, "missing"))?;
        let entry = as_object(entry, &at)?;

        let score_path = format!("{at}.score");
        let score = coerce_f64(
            entry.get("score").ok_or_else(|| CoreError::schema(&score_path, "missing"))?,
            &score_path,
        )?;
        if !(0.0..=f64::from(criterion.max_score)).contains(&score) {
            return Err(CoreError::schema(
                &score_path,
                format!("must be within [0, {}], got {score}", criterion.max_score),
            ));
        }

        scores.push(CriterionScore {
            criterion: name.to_string(),
            score,
            max_score: criterion.max_score,
            rationale: non_blank(entry.get("rationale"), &format!("{at}.rationale"))?,
            feedback: optional_text(entry.get("feedback"), &format!("{at}.feedback"))?
                .unwrap_or_default(),
        });
    }

    Ok(RubricEvaluation {
        total_score: scores.iter().map(|s| s.score).sum(),
        total_max_score: scores.iter().map(|s| s.max_score).sum(),
        scores,
        overall_feedback: non_blank(obj.get("overall_feedback"), "overall_feedback")?,
        concepts_to_review: string_list(obj.get("concepts_to_review"), "concepts_to_review")?,
    })
}

// ── Field helpers ────────────────────────────────────────────────────────────

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, CoreError> {
    value
        .as_object()
        .ok_or_else(|| CoreError::schema(path, format!("expected an object, got {}", type_name(value))))
}

/// Booleans, accepting `"true"` / `"false"` in any case.
fn bool_field(value: Option<&Value>, path: &str) -> Result<bool, CoreError> {
    match value {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
        Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
        Some(other) => Err(CoreError::schema(path, format!("expected a boolean, got {other}"))),
        None => Err(CoreError::schema(path, "missing")),
    }
}

/// Absent, `null` and blank all mean `None`.
fn optional_text(value: Option<&Value>, path: &str) -> Result<Option<String>, CoreError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string()).filter(|s| !s.is_empty())),
        Some(other) => Err(CoreError::schema(path, format!("expected a string, got {}", type_name(other)))),
    }
}

/// Optional list of non-blank strings; absent or `null` is empty.
fn string_list(value: Option<&Value>, path: &str) -> Result<Vec<String>, CoreError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| non_blank(Some(item), &format!("{path}[{i}]")))
            .collect(),
        Some(other) => Err(CoreError::schema(path, format!("expected an array, got {}", type_name(other)))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wrong_answer() -> Value {
        json!({
            "is_correct": false,
            "reasoning_trace": "합의 제곱 공식을 합차 공식과 혼동함",
            "error_location": "인수분해 첫 단계",
            "error_type": "misconception",
            "concepts_involved": ["인수분해", "완전제곱식"],
            "feedback": "(a+b)^2 = a^2 + 2ab + b^2 를 다시 확인해 보세요.",
            "recommendation": "완전제곱식 복습",
            "confidence": 0.85,
            "kg_operations": [
                {"operation": "update", "relation": "misconceives", "concept": "완전제곱식", "strength": 0.2}
            ]
        })
    }

    fn field_of(err: CoreError) -> String {
        match err {
            CoreError::SchemaValidation { field, .. } => field,
            other => panic!("expected SchemaValidation, got {other:?}"),
        }
    }

    #[test]
    fn wrong_answer_parses() {
        let d = diagnosis_from_value(&wrong_answer()).unwrap();
        assert!(!d.is_correct);
        assert_eq!(d.error_type, Some(ErrorType::Misconception));
        assert_eq!(d.concepts_involved, vec!["인수분해", "완전제곱식"]);
        assert_eq!(
            d.kg_operations,
            vec![ConceptUpdate {
                concept: "완전제곱식".into(),
                relation: MasteryRelation::Misconceives,
                strength: 0.2
            }]
        );
    }

    #[test]
    fn correct_answer_needs_no_error_type() {
        let mut v = wrong_answer();
        v["is_correct"] = json!("True");
        v["error_type"] = Value::Null;
        v["error_location"] = json!("");
        let d = diagnosis_from_value(&v).unwrap();
        assert!(d.is_correct);
        assert_eq!(d.error_type, None);
        assert_eq!(d.error_location, None);
    }

    #[test]
    fn wrong_answer_needs_error_type() {
        let mut v = wrong_answer();
        v.as_object_mut().unwrap().remove("error_type");
        assert_eq!(field_of(diagnosis_from_value(&v).unwrap_err()), "error_type");
    }

    #[test]
    fn unknown_enums_are_rejected_not_defaulted() {
        let mut v = wrong_answer();
        v["error_type"] = json!("laziness");
        assert_eq!(field_of(diagnosis_from_value(&v).unwrap_err()), "error_type");

        let mut v = wrong_answer();
        v["kg_operations"][0]["relation"] = json!("likes");
        assert_eq!(field_of(diagnosis_from_value(&v).unwrap_err()), "kg_operations[0].relation");
    }

    #[test]
    fn ranges_are_checked() {
        let mut v = wrong_answer();
        v["confidence"] = json!(1.3);
        assert_eq!(field_of(diagnosis_from_value(&v).unwrap_err()), "confidence");

        let mut v = wrong_answer();
        v["kg_operations"][0]["strength"] = json!(-0.5);
        assert_eq!(field_of(diagnosis_from_value(&v).unwrap_err()), "kg_operations[0].strength");
    }

    #[test]
    fn deserialize_runs_validation() {
        assert!(serde_json::from_value::<DiagnosisResult>(wrong_answer()).is_ok());
        let mut v = wrong_answer();
        v["feedback"] = json!(" ");
        assert!(serde_json::from_value::<DiagnosisResult>(v).is_err());
    }

    fn rubric() -> Vec<RubricCriterion> {
        vec![RubricCriterion::new("논리", 5, "논리"), RubricCriterion::new("표기", 2, "표기")]
    }

    #[test]
    fn rubric_totals_are_summed_in_rubric_order() {
        let reply = json!({
            "scores": {
                "표기": {"score": 2, "rationale": "정확함"},
                "논리": {"score": "3.5", "rationale": "일부 비약", "feedback": "근거를 보충하세요"}
            },
            "total_score": 99,
            "overall_feedback": "대체로 양호",
            "concepts_to_review": ["귀류법"]
        });
        let eval = rubric_from_value(&reply, &rubric()).unwrap();
        assert_eq!(eval.scores[0].criterion, "논리");
        assert_eq!(eval.scores[0].score, 3.5);
        assert_eq!(eval.scores[1].feedback, "");
        assert_eq!(eval.total_score, 5.5);
        assert_eq!(eval.total_max_score, 7);
    }

    #[test]
    fn rubric_missing_or_excess_scores_fail() {
        let missing = json!({
            "scores": {"논리": {"score": 3, "rationale": "r"}},
            "overall_feedback": "f"
        });
        assert_eq!(field_of(rubric_from_value(&missing, &rubric()).unwrap_err()), "scores.표기");

        let excess = json!({
            "scores": {
                "논리": {"score": 6, "rationale": "r"},
                "표기": {"score": 1, "rationale": "r"}
            },
            "overall_feedback": "f"
        });
        assert_eq!(field_of(rubric_from_value(&excess, &rubric()).unwrap_err()), "scores.논리.score");
    }
}
