//! Response parsing for model output that is supposed to be JSON.
//!
//! Strict parse first. On failure, one fallback: take the span from the first
//! opening bracket to the last closing bracket and parse that strictly.
//! Nothing beyond that. Callers treat `None` as terminal.

use serde_json::{Map, Value};

/// Extracts a JSON object from free text.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    match parse_with_span_fallback(text, '{', '}')? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Extracts a JSON array from free text.
pub fn extract_json_array(text: &str) -> Option<Vec<Value>> {
    match parse_with_span_fallback(text, '[', ']')? {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

fn parse_with_span_fallback(text: &str, open: char, close: char) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if matches_kind(&value, open) {
            return Some(value);
        }
    }
    let span = outer_span(trimmed, open, close)?;
    serde_json::from_str::<Value>(span)
        .ok()
        .filter(|v| matches_kind(v, open))
}

fn matches_kind(value: &Value, open: char) -> bool {
    match open {
        '{' => value.is_object(),
        _ => value.is_array(),
    }
}

fn outer_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_direct_parse() {
        let map = extract_json_object(r#"{"overall": 4.2}"#).unwrap();
        assert_eq!(map["overall"], 4.2);
    }

    #[test]
    fn test_object_surrounded_by_prose() {
        let text = "Sure! Here is the evaluation:\n{\"overall\": 3, \"gaps\": []}\nHope this helps.";
        let map = extract_json_object(text).unwrap();
        assert_eq!(map["overall"], 3);
    }

    #[test]
    fn test_object_inside_code_fence() {
        let text = "```json\n{\"a\": {\"b\": 1}}\n```";
        let map = extract_json_object(text).unwrap();
        assert_eq!(map["a"]["b"], 1);
    }

    #[test]
    fn test_object_unparseable_span_is_none() {
        assert!(extract_json_object("{ not json at all }").is_none());
        assert!(extract_json_object("no braces here").is_none());
        assert!(extract_json_object("} backwards {").is_none());
    }

    #[test]
    fn test_object_rejects_array_payload() {
        assert!(extract_json_object("[1, 2, 3]").is_none());
    }

    #[test]
    fn test_array_with_prose() {
        let text = "Here you go: [{\"question\": \"q\"}] done";
        let items = extract_json_array(text).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_array_rejects_object_payload() {
        assert!(extract_json_array(r#"{"questions": []}"#).is_none());
    }

    #[test]
    fn test_two_objects_with_prose_between_fail() {
        // First-brace/last-brace spans both objects, which is not valid JSON.
        assert!(extract_json_object(r#"{"a": 1} and {"b": 2}"#).is_none());
    }
}
