//! Parsing of model replies into typed records

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON response from LLM";

/// A typed reply, or the raw text when the model did not return the JSON we asked for.
///
/// Serialized untagged, so callers see either the record itself or
/// `{"error": ..., "raw_output": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelOutput<T> {
    Parsed(T),
    Malformed { error: String, raw_output: String },
}

impl<T> ModelOutput<T> {
    pub fn malformed(raw_output: impl Into<String>) -> Self {
        ModelOutput::Malformed {
            error: INVALID_JSON_MESSAGE.to_string(),
            raw_output: raw_output.into(),
        }
    }

    pub fn parsed(&self) -> Option<&T> {
        match self {
            ModelOutput::Parsed(value) => Some(value),
            ModelOutput::Malformed { .. } => None,
        }
    }

    pub fn into_parsed(self) -> Option<T> {
        match self {
            ModelOutput::Parsed(value) => Some(value),
            ModelOutput::Malformed { .. } => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ModelOutput::Malformed { .. })
    }
}

/// Skill extraction reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillList {
    pub skills: Vec<String>,
}

/// ATS scoring reply. Scores are on a 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsScore {
    pub ats_score: f64,
    pub skills_match: f64,
    pub experience_relevance: f64,
    pub tools_and_keywords: f64,
    pub resume_clarity: f64,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub weak_areas: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Remove a surrounding ``` fence, with or without a `json` tag
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.trim_start()
        .strip_suffix("```")
        .map(str::trim)
        .unwrap_or_else(|| body.trim())
}

/// Parse a reply as JSON and then as `T`, falling back to the raw text
pub fn parse_model_output<T: DeserializeOwned>(raw: &str) -> ModelOutput<T> {
    let cleaned = strip_json_fences(raw);

    let value: serde_json::Value = match serde_json::from_str(cleaned) {
        Ok(value) => value,
        Err(e) => {
            warn!("Model reply is not valid JSON: {}", e);
            return ModelOutput::malformed(raw);
        }
    };

    match serde_json::from_value(value) {
        Ok(parsed) => ModelOutput::Parsed(parsed),
        Err(e) => {
            warn!("Model reply has unexpected shape: {}", e);
            ModelOutput::malformed(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"skills\":[\"Go\"]}\n```";
        assert_eq!(strip_json_fences(input), "{\"skills\":[\"Go\"]}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "  {\"key\": \"value\"}\n";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_unterminated() {
        let input = "```json\n{\"key\": 1}";
        assert_eq!(strip_json_fences(input), "{\"key\": 1}");
    }

    #[test]
    fn test_fenced_skill_reply_parses() {
        let output: ModelOutput<SkillList> = parse_model_output("```json\n{\"skills\":[\"Go\"]}\n```");
        assert_eq!(
            output,
            ModelOutput::Parsed(SkillList {
                skills: vec!["Go".to_string()]
            })
        );
    }

    #[test]
    fn test_prose_reply_becomes_error_object() {
        let raw = "Sure! The candidate knows Python and AWS.";
        let output: ModelOutput<SkillList> = parse_model_output(raw);
        assert!(output.is_malformed());

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "error": "Invalid JSON response from LLM",
                "raw_output": raw,
            })
        );
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        let output: ModelOutput<SkillList> = parse_model_output("{\"skill\": \"Go\"}");
        assert!(output.is_malformed());
    }

    #[test]
    fn test_ats_score_lists_default_to_empty() {
        let raw = r#"{"ats_score": 72, "skills_match": 80, "experience_relevance": 65,
                      "tools_and_keywords": 70, "resume_clarity": 75}"#;
        let output: ModelOutput<AtsScore> = parse_model_output(raw);
        let score = output.into_parsed().unwrap();
        assert_eq!(score.ats_score, 72.0);
        assert!(score.missing_skills.is_empty());
        assert!(score.suggestions.is_empty());
    }

    #[test]
    fn test_parsed_output_serializes_as_plain_record() {
        let output = ModelOutput::Parsed(SkillList {
            skills: vec!["Rust".to_string()],
        });
        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            serde_json::json!({ "skills": ["Rust"] })
        );
    }
}
