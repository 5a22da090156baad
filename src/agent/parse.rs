//! Lenient parsing of JSON-only model responses.
//!
//! Models asked for "only JSON" still wrap it in code fences or add a
//! sentence around it. The parser strips fences, then falls back to the
//! outermost `{...}` span, and finally reports [`AgentError::ResponseParse`].

use serde_json::{Map, Value};

use crate::error::AgentError;

/// Parses a model response that should contain one JSON object.
///
/// # Errors
///
/// Returns [`AgentError::ResponseParse`] if no JSON object can be recovered.
pub fn parse_json_object(content: &str) -> Result<Map<String, Value>, AgentError> {
    let trimmed = content.trim();

    let json_str = if trimmed.starts_with("```") {
        trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        trimmed
    };

    let first_err = match serde_json::from_str::<Value>(json_str) {
        Ok(Value::Object(map)) => return Ok(map),
        Ok(other) => format!("expected a JSON object, got {other}"),
        Err(e) => e.to_string(),
    };

    // Recover an object embedded in surrounding prose.
    if let (Some(start), Some(end)) = (json_str.find('{'), json_str.rfind('}'))
        && start < end
        && let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&json_str[start..=end])
    {
        return Ok(map);
    }

    let preview: String = json_str.chars().take(200).collect();
    Err(AgentError::ResponseParse {
        message: format!("{first_err}; preview: {preview:?}"),
        content: content.to_string(),
    })
}

/// Reads a string field, trimmed. Missing or non-string values are empty.
#[must_use]
pub fn str_field(map: &Map<String, Value>, name: &str) -> String {
    map.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

/// Reads a boolean field.
///
/// Accepts JSON booleans, the strings `"true"` and `"yes"` (any case),
/// and non-zero numbers. Anything else is `false`.
#[must_use]
pub fn bool_field(map: &Map<String, Value>, name: &str) -> bool {
    match map.get(name) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}
