//! Normalization of the service's free-text reply into [`EscalatedResult`]s
//!
//! The model is asked for a JSON array but is not trusted to produce one.
//! Parsing never fails: a reply without an array becomes a single fallback
//! result carrying the raw text, and an undecodable array becomes a single
//! "parse error" result.

use magicinput_core::EscalatedResult;
use serde_json::{Map, Value};
use tracing::warn;

/// Turn a model reply into normalized results
pub fn parse_response(text: &str) -> Vec<EscalatedResult> {
    let Some(array) = extract_array(text) else {
        return vec![unstructured(text)];
    };

    match serde_json::from_str::<Vec<Value>>(array) {
        Ok(items) => items
            .iter()
            .filter_map(Value::as_object)
            .map(from_object)
            .collect(),
        Err(e) => {
            warn!("Escalation reply contained an undecodable array: {}", e);
            vec![parse_error(text)]
        }
    }
}

/// Slice from the first `[` through the last `]`
fn extract_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (start < end).then(|| &text[start..=end])
}

fn from_object(object: &Map<String, Value>) -> EscalatedResult {
    EscalatedResult {
        classification: string_field(object, "classification"),
        format_type: string_field(object, "type"),
        category: string_field(object, "classify"),
        confidence_percent: percent_field(object),
        analysis: string_field(object, "result"),
        suggestion: string_field(object, "suggestion"),
    }
    .normalize()
}

/// Strings pass through; numbers and booleans are rendered; anything else is blank
fn string_field(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn percent_field(object: &Map<String, Value>) -> String {
    match object.get("percent") {
        Some(Value::Number(n)) => format!("{}%", n),
        _ => string_field(object, "percent"),
    }
}

fn unstructured(text: &str) -> EscalatedResult {
    EscalatedResult {
        classification: EscalatedResult::DEFAULT_CLASSIFICATION.to_string(),
        format_type: EscalatedResult::DEFAULT_TYPE.to_string(),
        category: EscalatedResult::DEFAULT_CATEGORY.to_string(),
        confidence_percent: EscalatedResult::DEFAULT_PERCENT.to_string(),
        analysis: "Analysis result".to_string(),
        suggestion: text.trim().to_string(),
    }
    .normalize()
}

fn parse_error(text: &str) -> EscalatedResult {
    EscalatedResult {
        classification: EscalatedResult::DEFAULT_CLASSIFICATION.to_string(),
        format_type: EscalatedResult::DEFAULT_TYPE.to_string(),
        category: "Parse error".to_string(),
        confidence_percent: "0%".to_string(),
        analysis: "Failed to parse the JSON reply".to_string(),
        suggestion: format!("Raw response: {}", text.trim()),
    }
}
