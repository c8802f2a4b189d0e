//! Turns raw model text into a [`ModelResult`].
//!
//! Models are asked for bare JSON but regularly wrap it in code fences or prose.
//! Parsing is attempted on the fence-stripped text first, then on the widest
//! `{ ... }` span of the raw output. Whatever parses is then checked field by
//! field before it is trusted.

use nf_core::{Error, ModelResult, Sentiment};
use serde_json::{Map, Value};
use thiserror::Error;

const MAX_BULLETS: usize = 5;
const MAX_KEYWORDS: usize = 5;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("model output is not JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("model output failed validation: {0}")]
    Validation(String),
}

impl From<NormalizeError> for Error {
    fn from(_: NormalizeError) -> Self {
        Error::ai_response_invalid()
    }
}

pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// The span from the first `{` to the last `}`, if there is one.
pub fn brace_scan(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

pub fn parse(raw: &str) -> Result<Value, NormalizeError> {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str(&cleaned) {
        Ok(value) => Ok(value),
        Err(direct) => match brace_scan(raw) {
            Some(candidate) => serde_json::from_str(candidate).map_err(NormalizeError::Parse),
            None => Err(NormalizeError::Parse(direct)),
        },
    }
}

fn invalid(message: impl Into<String>) -> NormalizeError {
    NormalizeError::Validation(message.into())
}

fn strings(values: &[Value], limit: usize) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(limit)
        .map(str::to_string)
        .collect()
}

fn required_str<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a str, NormalizeError> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid(format!("{} is missing", key)))
}

pub fn validate(value: &Value) -> Result<ModelResult, NormalizeError> {
    let object = value
        .as_object()
        .ok_or_else(|| invalid("expected a JSON object"))?;

    let bullets = object
        .get("bullets")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("bullets must be an array"))?;
    let bullets = strings(bullets, MAX_BULLETS);
    if bullets.is_empty() {
        return Err(invalid("bullets must not be empty"));
    }

    let sentiment: Sentiment = required_str(object, "sentiment")?
        .parse()
        .map_err(invalid)?;
    let impact = required_str(object, "impact")?.to_string();

    // Some models answer with a comma separated string instead of a list.
    let keywords = match object.get("keywords") {
        Some(Value::Array(values)) => strings(values, MAX_KEYWORDS),
        Some(Value::String(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .take(MAX_KEYWORDS)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    Ok(ModelResult {
        bullets,
        sentiment,
        keywords,
        impact,
    })
}

pub fn normalize(raw: &str) -> Result<ModelResult, NormalizeError> {
    validate(&parse(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        let raw = r#"{"bullets":["a","b"],"sentiment":"positive","keywords":["k"],"impact":"High - big"}"#;
        let result = normalize(raw).unwrap();
        assert_eq!(result.bullets, vec!["a", "b"]);
        assert_eq!(result.sentiment, Sentiment::Positive);
        assert_eq!(result.keywords, vec!["k"]);
        assert_eq!(result.impact, "High - big");
    }

    #[test]
    fn test_code_fenced_json() {
        let raw = "```json\n{\"bullets\":[\"a\"],\"sentiment\":\"Negative\",\"impact\":\"Low - x\"}\n```\n";
        let result = normalize(raw).unwrap();
        assert_eq!(result.sentiment, Sentiment::Negative);
        assert!(result.keywords.is_empty());
    }

    #[test]
    fn test_brace_scan_recovers_from_prose() {
        let raw = r#"garbage... {"bullets":["x"],"sentiment":"neutral","impact":"Low - ok"} ..."#;
        let result = normalize(raw).unwrap();
        assert_eq!(result.bullets, vec!["x"]);
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert_eq!(result.impact, "Low - ok");
    }

    #[test]
    fn test_no_json_is_a_parse_error() {
        assert!(matches!(normalize("invalid json"), Err(NormalizeError::Parse(_))));
        assert!(matches!(normalize("} backwards {"), Err(NormalizeError::Parse(_))));
        assert!(matches!(normalize("{ not: json }"), Err(NormalizeError::Parse(_))));
    }

    #[test]
    fn test_validation_failures() {
        let cases = [
            r#"["not", "an", "object"]"#,
            r#"{"sentiment":"neutral","impact":"Low - x"}"#,
            r#"{"bullets":[],"sentiment":"neutral","impact":"Low - x"}"#,
            r#"{"bullets":"one","sentiment":"neutral","impact":"Low - x"}"#,
            r#"{"bullets":["a"],"impact":"Low - x"}"#,
            r#"{"bullets":["a"],"sentiment":"","impact":"Low - x"}"#,
            r#"{"bullets":["a"],"sentiment":"mixed","impact":"Low - x"}"#,
            r#"{"bullets":["a"],"sentiment":"neutral"}"#,
            r#"{"bullets":["a"],"sentiment":"neutral","impact":null}"#,
        ];
        for raw in cases {
            assert!(
                matches!(normalize(raw), Err(NormalizeError::Validation(_))),
                "expected validation error for {}",
                raw
            );
        }
    }

    #[test]
    fn test_caps_and_cleans_lists() {
        let raw = r#"{
            "bullets": ["1", " 2 ", "", 3, "4", "5", "6", "7"],
            "sentiment": "neutral",
            "keywords": "a, b,,c, d, e, f",
            "impact": "Medium - something"
        }"#;
        let result = normalize(raw).unwrap();
        assert_eq!(result.bullets, vec!["1", "2", "4", "5", "6"]);
        assert_eq!(result.keywords, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_maps_to_upstream_invalid() {
        let err: Error = normalize("invalid json").unwrap_err().into();
        assert_eq!(err.status(), 502);
        assert_eq!(err.to_string(), "AI response invalid");
    }
}
