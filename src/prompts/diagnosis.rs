//! Diagnosis prompts: misconception diagnosis of a student answer and
//! rubric-based grading.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

use super::require_text;

pub const DEFAULT_SUBJECT: &str = "수학";

/// Error classes the diagnosis prompt offers the model, with their meaning.
pub const ERROR_TYPE_GUIDE: &[(&str, &str)] = &[
    ("calculation_slip", "단순 계산 실수 (개념은 알지만 연산 오류)"),
    ("knowledge_gap", "개념 부족 (해당 개념을 모름)"),
    ("misconception", "오개념 (잘못된 규칙이나 공식 적용)"),
    ("procedural_error", "절차적 오류 (순서나 방법 오류)"),
    ("comprehension_error", "문제 이해 오류"),
    ("guessing", "추측"),
    ("partial_understanding", "부분적 이해"),
];

// ── Requests ──────────────────────────────────────────────────────────────────

/// One student attempt to diagnose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRequest {
    #[serde(default = "default_subject")]
    pub subject: String,
    pub question: String,
    /// Free text, possibly an OCR transcription of handwriting.
    pub student_answer: String,
    #[serde(default)]
    pub correct_answer: Option<String>,
}

impl DiagnosisRequest {
    pub fn new(question: impl Into<String>, student_answer: impl Into<String>) -> Self {
        Self {
            subject: default_subject(),
            question: question.into(),
            student_answer: student_answer.into(),
            correct_answer: None,
        }
    }

    pub fn with_correct_answer(mut self, answer: impl Into<String>) -> Self {
        self.correct_answer = Some(answer.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricCriterion {
    pub name: String,
    pub max_score: u32,
    pub description: String,
}

impl RubricCriterion {
    pub fn new(name: impl Into<String>, max_score: u32, description: impl Into<String>) -> Self {
        Self { name: name.into(), max_score, description: description.into() }
    }
}

/// A student answer graded against an ordered rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricRequest {
    #[serde(default = "default_subject")]
    pub subject: String,
    pub question: String,
    pub student_answer: String,
    pub rubric: Vec<RubricCriterion>,
}

impl RubricRequest {
    pub fn new(
        question: impl Into<String>,
        student_answer: impl Into<String>,
        rubric: Vec<RubricCriterion>,
    ) -> Self {
        Self {
            subject: default_subject(),
            question: question.into(),
            student_answer: student_answer.into(),
            rubric,
        }
    }
}

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}

// ── Templates ─────────────────────────────────────────────────────────────────

/// Chain-of-thought diagnosis of where and why the student went wrong.
pub fn diagnosis_prompt(request: &DiagnosisRequest) -> Result<String, CoreError> {
    let subject = require_text("subject", &request.subject)?;
    let question = require_text("question", &request.question)?;
    let student_answer = require_text("student_answer", &request.student_answer)?;
    let correct = match request.correct_answer.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        Some(a) => format!("\n## 정답\n{a}\n"),
        None => String::new(),
    };
    let error_types: String = ERROR_TYPE_GUIDE
        .iter()
        .map(|(name, meaning)| format!("   - {name}: {meaning}\n"))
        .collect();

    Ok(format!(
        r#"# Role
당신은 20년 경력의 {subject} 교육 전문가이자 인지 심리학자입니다.

# Task
학생의 답안을 채점하는 데 그치지 말고 사고 과정의 오류를 진단하십시오.

## 문제
{question}
{correct}
## 학생 답안
{student_answer}

# Steps
1. 학생이 거쳤을 단계별 논리를 재구성하십시오.
2. 첫 번째 오류가 발생한 지점을 찾으십시오.
3. 오류 유형을 다음 중 하나로 분류하십시오:
{error_types}4. 문제에 관련된 핵심 개념을 나열하십시오.
5. 학생에게 줄 구체적인 피드백과 다음 학습 추천을 작성하십시오.

# Output (JSON only)
{{
    "is_correct": true,
    "reasoning_trace": "학생의 추론 과정 역추적",
    "error_location": "오류 지점 (정답이면 null)",
    "error_type": "오류 유형 (정답이면 null)",
    "concepts_involved": ["개념1", "개념2"],
    "feedback": "학생에게 줄 피드백",
    "recommendation": "다음 학습 추천",
    "confidence": 0.0-1.0,
    "kg_operations": [
        {{"relation": "mastered|understands|struggles_with|misconceives", "concept": "개념명", "strength": 0.0-1.0}}
    ]
}}"#
    ))
}

/// Per-criterion grading against `request.rubric`, in rubric order.
pub fn rubric_prompt(request: &RubricRequest) -> Result<String, CoreError> {
    let subject = require_text("subject", &request.subject)?;
    let question = require_text("question", &request.question)?;
    let student_answer = require_text("student_answer", &request.student_answer)?;
    if request.rubric.is_empty() {
        return Err(CoreError::invalid_input("rubric", "at least one criterion is required"));
    }

    let mut seen = HashSet::new();
    let mut rubric = String::new();
    for (i, criterion) in request.rubric.iter().enumerate() {
        let name = require_text(&format!("rubric[{i}].name"), &criterion.name)?;
        if !seen.insert(name) {
            return Err(CoreError::invalid_input(
                &format!("rubric[{i}].name"),
                format!("duplicate criterion '{name}'"),
            ));
        }
        if criterion.max_score == 0 {
            return Err(CoreError::invalid_input(&format!("rubric[{i}].max_score"), "must be positive"));
        }
        let description = require_text(&format!("rubric[{i}].description"), &criterion.description)?;
        rubric.push_str(&format!("- {name} (0-{}점): {description}\n", criterion.max_score));
    }

    Ok(format!(
        r#"# Role
당신은 {subject} 평가 전문가입니다.

# Task
학생의 답안을 아래 루브릭에 따라 항목별로 평가하십시오.

## 문제
{question}

## 학생 답안
{student_answer}

## 루브릭
{rubric}
각 항목마다 0점부터 최대 점수 사이의 점수, 근거, 개선 피드백을 제시하십시오.

# Output (JSON only)
{{
    "scores": {{
        "항목 이름": {{"score": 0, "rationale": "점수 근거", "feedback": "개선 피드백"}}
    }},
    "overall_feedback": "종합 피드백",
    "concepts_to_review": ["복습할 개념"]
}}"#
    ))
}
