//! Generation prompts: twin problems, error solutions, model solutions and
//! variations.
//!
//! Each template validates its request before building the prompt, so the
//! generator façade gets input checking for free.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

use super::{require_text, require_unit};

/// Error types the error-solution prompt has wording for. Other names are
/// passed through verbatim.
pub const KNOWN_ERROR_TYPES: &[&str] = &[
    "concept_misapplication",
    "arithmetic_error",
    "condition_omission",
    "logic_leap",
    "sign_error",
    "unit_confusion",
];

// ── Requests ──────────────────────────────────────────────────────────────────

/// Input for a twin (isomorphic) problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwinRequest {
    pub content_stem: String,
    #[serde(default)]
    pub answer: Option<String>,
    /// Free-form metadata of the original problem (domain, source, …).
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    /// Echo `metadata` into the generated problem.
    #[serde(default = "default_true")]
    pub preserve_metadata: bool,
}

impl TwinRequest {
    pub fn new(content_stem: impl Into<String>) -> Self {
        Self {
            content_stem: content_stem.into(),
            answer: None,
            metadata: BTreeMap::new(),
            preserve_metadata: true,
        }
    }
}

/// Input for an intentionally wrong solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSolutionRequest {
    pub question: String,
    pub correct_answer: String,
    /// Mistakes to simulate, in the order they should appear in the prompt.
    pub error_types: Vec<String>,
    /// Solution complexity, 1 (short) to 5 (long).
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
}

impl ErrorSolutionRequest {
    pub fn new(
        question: impl Into<String>,
        correct_answer: impl Into<String>,
        error_types: Vec<String>,
    ) -> Self {
        Self {
            question: question.into(),
            correct_answer: correct_answer.into(),
            error_types,
            difficulty: default_difficulty(),
        }
    }
}

/// Input for a correct model solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectSolutionRequest {
    pub question: String,
    pub correct_answer: String,
}

impl CorrectSolutionRequest {
    pub fn new(question: impl Into<String>, correct_answer: impl Into<String>) -> Self {
        Self { question: question.into(), correct_answer: correct_answer.into() }
    }
}

/// Axis along which a variation differs from the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariationType {
    Difficulty,
    Context,
    Numbers,
}

impl VariationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariationType::Difficulty => "difficulty",
            VariationType::Context => "context",
            VariationType::Numbers => "numbers",
        }
    }
}

impl FromStr for VariationType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "difficulty" => Ok(VariationType::Difficulty),
            "context" => Ok(VariationType::Context),
            "numbers" => Ok(VariationType::Numbers),
            other => Err(CoreError::invalid_input(
                "variation_type",
                format!("'{other}' is not one of difficulty, context, numbers"),
            )),
        }
    }
}

impl fmt::Display for VariationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for a problem variation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariationRequest {
    pub original_question: String,
    pub variation_type: VariationType,
    /// Target difficulty in [0, 1]; required for [`VariationType::Difficulty`].
    #[serde(default)]
    pub target_level: Option<f64>,
}

impl VariationRequest {
    pub fn new(
        original_question: impl Into<String>,
        variation_type: VariationType,
        target_level: Option<f64>,
    ) -> Self {
        Self { original_question: original_question.into(), variation_type, target_level }
    }
}

fn default_true() -> bool {
    true
}

fn default_difficulty() -> u8 {
    2
}

// ── Templates ─────────────────────────────────────────────────────────────────

/// Same logic and solving steps, new story and numbers.
pub fn twin_prompt(request: &TwinRequest) -> Result<String, CoreError> {
    let stem = require_text("content_stem", &request.content_stem)?;

    let answer = match request.answer.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        Some(a) => format!("\nOriginal Answer:\n{a}\n"),
        None => String::new(),
    };
    // BTreeMap serializes with sorted keys, so the prompt stays deterministic.
    let metadata = if request.metadata.is_empty() {
        String::new()
    } else {
        let json = serde_json::to_string(&request.metadata)
            .map_err(|e| CoreError::invalid_input("metadata", e.to_string()))?;
        format!("\nOriginal Metadata:\n{json}\n")
    };

    Ok(format!(
        r#"You are an expert Math Item Writer.
Your task is to create a "Twin Problem" (Isomorphic Problem) based on the original problem.

**Rules (Strict):**
1. **Logic**: Keep the EXACT SAME mathematical logic, formula, and solving steps.
2. **Variation**: Change the story context (objects, names) and numbers.
3. **Language**: Output must be in **Natural Korean (한국어)**.
4. **Format**: Respond ONLY in JSON format.

Original Problem:
{stem}
{answer}{metadata}
Target JSON Structure:
{{
    "question_stem": "The new problem text...",
    "answer": "The final answer (e.g. '15개')",
    "solution_steps": "Step-by-step explanation of the solution"
}}"#
    ))
}

fn error_type_hint(error_type: &str) -> Option<&'static str> {
    match error_type {
        "concept_misapplication" => Some("개념을 잘못 적용"),
        "arithmetic_error" => Some("계산 실수"),
        "condition_omission" => Some("조건 누락 (예: 로그의 진수 조건, 분모가 0이 아닌 조건)"),
        "logic_leap" => Some("논리적 비약"),
        "sign_error" => Some("부호 실수"),
        "unit_confusion" => Some("단위 혼동"),
        _ => None,
    }
}

/// A plausible wrong solution with the mistake marked. Error types keep
/// their input order.
pub fn error_solution_prompt(request: &ErrorSolutionRequest) -> Result<String, CoreError> {
    let question = require_text("question", &request.question)?;
    let answer = require_text("correct_answer", &request.correct_answer)?;
    if request.error_types.is_empty() {
        return Err(CoreError::invalid_input("error_types", "at least one error type is required"));
    }
    if !(1..=5).contains(&request.difficulty) {
        return Err(CoreError::invalid_input(
            "difficulty",
            format!("must be within 1..=5, got {}", request.difficulty),
        ));
    }

    let mut error_list = String::new();
    for (i, raw) in request.error_types.iter().enumerate() {
        let name = require_text(&format!("error_types[{i}]"), raw)?;
        match error_type_hint(name) {
            Some(hint) => error_list.push_str(&format!("{}. {name}: {hint}\n", i + 1)),
            None => error_list.push_str(&format!("{}. {name}\n", i + 1)),
        }
    }
    let steps = 3 + usize::from(request.difficulty);

    Ok(format!(
        r#"당신은 대한민국 수능 수학(CSAT) 및 내신 수학 전문 강사입니다.
다음 문제에 대해 학생들이 개념적으로 가장 자주 틀리는 풀이 과정을 시뮬레이션해야 합니다.

[시뮬레이션할 오류 유형]
{error_list}
[오류 풀이 생성 규칙]
1. 위 오류 유형 중 하나를 골라, 오류는 단 한 곳에서만 발생하게 하세요. 그 전까지의 풀이는 완벽해야 합니다.
2. 풀이는 약 {steps}단계로 구성하세요.
3. 오류 이후의 과정은 그 오류를 기반으로 논리적으로 전개되어 오답에 도달해야 합니다.
4. 말투는 정중한 '해요체'를 사용하세요.

[입력 문제]
문제: {question}
정답: {answer}

[출력 형식 (JSON)]
{{
  "steps": [
    {{"step": 1, "content": "단계 설명", "formula": "수식", "is_error": false}},
    {{"step": 2, "content": "오류가 발생한 단계", "formula": "수식", "is_error": true,
      "error_type": "condition_omission", "error_explanation": "무엇을 놓쳤는지 설명"}}
  ],
  "final_wrong_answer": "오답 결과"
}}

JSON만 출력하세요."#
    ))
}

/// A fully correct step-by-step solution.
pub fn correct_solution_prompt(request: &CorrectSolutionRequest) -> Result<String, CoreError> {
    let question = require_text("question", &request.question)?;
    let answer = require_text("correct_answer", &request.correct_answer)?;
    Ok(format!(
        r#"다음 문제에 대한 완벽하게 정확한 모범 풀이를 생성하세요.

문제: {question}
정답: {answer}

출력 형식 (JSON):
{{
  "steps": [
    {{"step": 1, "content": "단계 설명", "formula": "수식 (선택)", "is_error": false}}
  ]
}}"#
    ))
}

/// A variation along one axis: difficulty, story context, or numbers.
pub fn variation_prompt(request: &VariationRequest) -> Result<String, CoreError> {
    let question = require_text("original_question", &request.original_question)?;
    let target = request.target_level.map(|l| require_unit("target_level", l)).transpose()?;

    let prompt = match request.variation_type {
        VariationType::Difficulty => {
            let level = target.ok_or_else(|| {
                CoreError::invalid_input("target_level", "required when variation_type is difficulty")
            })?;
            let direction = if level < 0.5 { "더 쉽게" } else { "더 어렵게" };
            format!(
                r#"다음 문제를 {direction} 변형하세요 (난이도 목표: {level:.2}, 0.0 = 가장 쉬움, 1.0 = 가장 어려움).

원본 문제:
{question}

변형 규칙:
- 동일한 개념을 유지
- 숫자 복잡도와 풀이 단계 수로 난이도를 조정
- 한국어로 출력

JSON 형식:
{{
    "question_stem": "변형된 문제",
    "answer": "정답",
    "difficulty_estimation": {level:.2},
    "changes_made": "어떤 부분을 변경했는지 설명"
}}"#
            )
        }
        VariationType::Context => format!(
            r#"다음 문제의 스토리 맥락을 변경하되, 수학적 구조와 숫자는 유지하세요.

원본 문제:
{question}

변형 규칙:
- 수학적 로직과 숫자는 동일
- 스토리 배경, 등장 인물/사물만 변경
- 한국어로 출력

JSON 형식:
{{
    "question_stem": "새로운 맥락의 문제",
    "context_changes": "어떤 맥락으로 변경했는지"
}}"#
        ),
        VariationType::Numbers => format!(
            r#"다음 문제의 숫자만 바꾸어 새 문제를 만드세요. 문장 구조와 풀이 방법은 유지하세요.

원본 문제:
{question}

변형 규칙:
- 풀이 단계는 동일
- 답이 깔끔한 값(정수 또는 간단한 분수)이 되도록 숫자를 선택
- 한국어로 출력

JSON 형식:
{{
    "question_stem": "숫자를 바꾼 문제",
    "answer": "새 정답"
}}"#
        ),
    };
    Ok(prompt)
}
