//! Recovery of a JSON object from free-form model text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```(?:json)?\s*(.*?)\s*```").unwrap());

/// Extract a JSON object from model output.
///
/// Tries, in order: the trimmed text as a whole, the first fenced code block,
/// then the span from the first `{` to the last `}`. Only objects are
/// accepted; arrays and scalars yield `None`.
#[must_use]
pub fn recover_json_object(text: &str) -> Option<Map<String, Value>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(obj) = parse_object(trimmed) {
        return Some(obj);
    }

    if let Some(caps) = FENCED_BLOCK.captures(trimmed)
        && let Some(obj) = caps.get(1).and_then(|m| parse_object(m.as_str()))
    {
        return Some(obj);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&trimmed[start..=end])
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object() {
        let obj = recover_json_object(r#"  {"a": 1}  "#).unwrap();
        assert_eq!(obj["a"], 1);
    }

    #[test]
    fn test_fenced_block() {
        let text = "Here you go:\n```json\n{\"summary\": \"x\"}\n```\nThanks";
        let obj = recover_json_object(text).unwrap();
        assert_eq!(obj["summary"], "x");
    }

    #[test]
    fn test_fence_without_language_tag() {
        let obj = recover_json_object("```\n{\"k\": [1, 2]}\n```").unwrap();
        assert_eq!(obj["k"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_brace_span_in_prose() {
        let text = "Sure! {\"important_files\": [\"README.md\"]} Hope that helps.";
        let obj = recover_json_object(text).unwrap();
        assert_eq!(obj["important_files"][0], "README.md");
    }

    #[test]
    fn test_rejects_non_objects() {
        assert!(recover_json_object("[1, 2, 3]").is_none());
        assert!(recover_json_object("\"text\"").is_none());
        assert!(recover_json_object("").is_none());
        assert!(recover_json_object("no json here").is_none());
        assert!(recover_json_object("} backwards {").is_none());
    }
}
