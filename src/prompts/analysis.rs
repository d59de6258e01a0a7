//! Problem analysis prompts.

use crate::error::CoreError;

use super::require_text;

/// Single-shot prompt asking for the whole problem DNA as one JSON object.
pub fn dna_prompt(problem_text: &str) -> Result<String, CoreError> {
    let problem = require_text("problem_text", problem_text)?;
    Ok(format!(
        r#"Analyze this math problem and describe its pedagogical profile.

Problem:
{problem}

Return ONLY a JSON object with exactly these fields:
{{
    "difficulty": 0.0-1.0 (0.0 = easiest, 1.0 = hardest),
    "tags": [
        {{"tag": "Linear Equations", "type": "concept", "confidence": 0.95}},
        {{"tag": "Equation Solving", "type": "skill", "confidence": 0.90}}
    ],
    "curriculum_path": "Subject.Topic.Subtopic (e.g. Math.Algebra.Linear_Equations)",
    "cognitive_level": "one of: remember|understand|apply|analyze|evaluate|create"
}}

Rules:
- "type" is one of: subject, concept, skill, cognitive_level, difficulty.
- Every confidence is a number between 0.0 and 1.0.
- Assign confidence above 0.9 only to clearly relevant tags.
- Keep tag names in the language of the problem."#
    ))
}

/// Tags only, for callers that do not need the full profile.
pub fn tagging_prompt(problem_text: &str) -> Result<String, CoreError> {
    let problem = require_text("problem_text", problem_text)?;
    Ok(format!(
        r#"Analyze this educational question and generate relevant tags.

Question:
{problem}

Identify and categorize tags in these types:
1. subject: Main subject area (Math, Science, ...)
2. concept: Specific concepts (Algebra, Geometry, Quadratics, ...)
3. skill: Required skills (Problem Solving, Critical Thinking, ...)
4. cognitive_level: Bloom's taxonomy (Remember, Understand, Apply, Analyze, Evaluate, Create)
5. difficulty: Difficulty level (Easy, Medium, Hard)

Return a JSON object with confidence scores (0.0-1.0):
{{
    "tags": [
        {{"tag": "Mathematics", "type": "subject", "confidence": 0.99}},
        {{"tag": "Algebra", "type": "concept", "confidence": 0.95}}
    ]
}}"#
    ))
}

/// Curriculum path only, answered as a bare dot-delimited string.
pub fn curriculum_prompt(problem_text: &str) -> Result<String, CoreError> {
    let problem = require_text("problem_text", problem_text)?;
    Ok(format!(
        r#"Given this question, suggest the most specific curriculum path in dot notation.

Question: {problem}

Example paths:
- Math.Algebra.Linear_Equations
- Math.Geometry.Triangles.Pythagorean_Theorem
- Math.Calculus.Derivatives.Chain_Rule

Return ONLY the path string, no explanation."#
    ))
}
