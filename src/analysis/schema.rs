//! Problem DNA types and field-by-field validation of backend output.
//!
//! Unambiguous coercions are accepted (numeric strings, enum names in any
//! letter case). Anything else fails with [`CoreError::SchemaValidation`]
//! naming the field path, e.g. `tags[2].confidence`. Values are never
//! clamped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

const SIGNATURE_LEN: usize = 16;
const MAX_KEYWORDS: usize = 10;

// ── Enums ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Subject,
    Concept,
    Skill,
    CognitiveLevel,
    Difficulty,
}

impl TagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::Subject => "subject",
            TagKind::Concept => "concept",
            TagKind::Skill => "skill",
            TagKind::CognitiveLevel => "cognitive_level",
            TagKind::Difficulty => "difficulty",
        }
    }
}

impl FromStr for TagKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subject" => Ok(TagKind::Subject),
            "concept" => Ok(TagKind::Concept),
            "skill" => Ok(TagKind::Skill),
            "cognitive_level" => Ok(TagKind::CognitiveLevel),
            "difficulty" => Ok(TagKind::Difficulty),
            other => Err(format!("unknown tag type '{other}'")),
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bloom's taxonomy level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CognitiveLevel {
    Remember,
    Understand,
    Apply,
    Analyze,
    Evaluate,
    Create,
}

impl CognitiveLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CognitiveLevel::Remember => "remember",
            CognitiveLevel::Understand => "understand",
            CognitiveLevel::Apply => "apply",
            CognitiveLevel::Analyze => "analyze",
            CognitiveLevel::Evaluate => "evaluate",
            CognitiveLevel::Create => "create",
        }
    }
}

impl FromStr for CognitiveLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remember" => Ok(CognitiveLevel::Remember),
            "understand" => Ok(CognitiveLevel::Understand),
            "apply" => Ok(CognitiveLevel::Apply),
            "analyze" => Ok(CognitiveLevel::Analyze),
            "evaluate" => Ok(CognitiveLevel::Evaluate),
            "create" => Ok(CognitiveLevel::Create),
            other => Err(format!("unknown cognitive level '{other}'")),
        }
    }
}

impl fmt::Display for CognitiveLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── DNA ──────────────────────────────────────────────────────────────────────

/// Deserialization goes through the same checks as backend replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct DnaTag {
    pub tag: String,
    #[serde(rename = "type")]
    pub kind: TagKind,
    pub confidence: f64,
}

/// Pedagogical profile of one problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct ProblemDna {
    pub difficulty: f64,
    pub tags: Vec<DnaTag>,
    pub curriculum_path: String,
    pub cognitive_level: CognitiveLevel,
}

impl ProblemDna {
    /// Short digest of the pedagogical profile: sorted concept tags,
    /// cognitive level and difficulty rounded to one decimal.
    ///
    /// Problems that differ only in wording or tag order share a signature.
    pub fn signature(&self) -> String {
        let mut concepts: Vec<&str> = self
            .tags
            .iter()
            .filter(|t| t.kind == TagKind::Concept)
            .map(|t| t.tag.as_str())
            .collect();
        concepts.sort_unstable();

        let material = format!(
            "{}|{}|{:.1}",
            concepts.join(","),
            self.cognitive_level,
            self.difficulty
        );
        let digest = Sha256::digest(material.as_bytes());
        let mut hex = hex::encode(digest);
        hex.truncate(SIGNATURE_LEN);
        hex
    }

    /// Up to ten lowercase search keywords: tag names first, then words
    /// longer than three characters from `problem_text`.
    pub fn keywords(&self, problem_text: &str) -> Vec<String> {
        let tags = self.tags.iter().map(|t| t.tag.trim().to_lowercase());
        let words = problem_text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 3)
            .map(str::to_lowercase);

        let mut out: Vec<String> = Vec::new();
        for word in tags.chain(words) {
            if out.len() == MAX_KEYWORDS {
                break;
            }
            if !word.is_empty() && !out.contains(&word) {
                out.push(word);
            }
        }
        out
    }
}

// ── Validation ───────────────────────────────────────────────────────────────

/// Validate a backend JSON reply as [`ProblemDna`].
pub fn problem_dna_from_value(value: &Value) -> Result<ProblemDna, CoreError> {
    let obj = value
        .as_object()
        .ok_or_else(|| CoreError::schema("$", format!("expected an object, got {}", type_name(value))))?;

    let difficulty = unit_field(obj.get("difficulty"), "difficulty")?;
    let tags = tags_from_value(obj.get("tags"), "tags")?;
    let curriculum_path = non_blank(obj.get("curriculum_path"), "curriculum_path")?;
    let cognitive_level = non_blank(obj.get("cognitive_level"), "cognitive_level")?
        .parse::<CognitiveLevel>()
        .map_err(|e| CoreError::schema("cognitive_level", e))?;

    Ok(ProblemDna { difficulty, tags, curriculum_path, cognitive_level })
}

/// Validate a `{"tags": [...]}` reply or a bare tag array.
pub fn tags_from_reply(value: &Value) -> Result<Vec<DnaTag>, CoreError> {
    match value {
        Value::Array(_) => tags_from_value(Some(value), "tags"),
        _ => tags_from_value(value.get("tags"), "tags"),
    }
}

fn tags_from_value(value: Option<&Value>, path: &str) -> Result<Vec<DnaTag>, CoreError> {
    let items = match value {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(CoreError::schema(path, format!("expected an array, got {}", type_name(other))));
        }
        None => return Err(CoreError::schema(path, "missing")),
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| tag_from_value(item, &format!("{path}[{i}]")))
        .collect()
}

fn tag_from_value(item: &Value, at: &str) -> Result<DnaTag, CoreError> {
    let obj = item
        .as_object()
        .ok_or_else(|| CoreError::schema(at, format!("expected an object, got {}", type_name(item))))?;
    let tag = non_blank(obj.get("tag"), &format!("{at}.tag"))?;
    let kind_path = format!("{at}.type");
    let kind = non_blank(obj.get("type"), &kind_path)?
        .parse::<TagKind>()
        .map_err(|e| CoreError::schema(&kind_path, e))?;
    let confidence = unit_field(obj.get("confidence"), &format!("{at}.confidence"))?;
    Ok(DnaTag { tag, kind, confidence })
}

impl TryFrom<Value> for ProblemDna {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        problem_dna_from_value(&value)
    }
}

impl TryFrom<Value> for DnaTag {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        tag_from_value(&value, "tag")
    }
}

/// Read a number, accepting numeric strings.
pub(crate) fn coerce_f64(value: &Value, path: &str) -> Result<f64, CoreError> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(CoreError::schema(path, format!("expected a number, got {value}"))),
    }
}

/// Required number in [0, 1].
pub(crate) fn unit_field(value: Option<&Value>, path: &str) -> Result<f64, CoreError> {
    let value = value.ok_or_else(|| CoreError::schema(path, "missing"))?;
    let n = coerce_f64(value, path)?;
    if (0.0..=1.0).contains(&n) {
        Ok(n)
    } else {
        Err(CoreError::schema(path, format!("must be within [0, 1], got {n}")))
    }
}

/// Optional number in [0, 1]; absent and `null` both mean `None`.
pub(crate) fn optional_unit_field(reply: &Value, field: &str) -> Result<Option<f64>, CoreError> {
    match reply.get(field) {
        None | Some(Value::Null) => Ok(None),
        some => unit_field(some, field).map(Some),
    }
}

pub(crate) fn non_blank(value: Option<&Value>, path: &str) -> Result<String, CoreError> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::String(_)) => Err(CoreError::schema(path, "must not be blank")),
        Some(other) => Err(CoreError::schema(path, format!("expected a string, got {}", type_name(other)))),
        None => Err(CoreError::schema(path, "missing")),
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
