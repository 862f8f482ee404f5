use serde_json::Value;

use super::{AnalysisError, ParsedAnalysis};

/// Opening markers the oracle wraps structured output in.
const OPENING_FENCES: &[&str] = &["```json\r\n", "```json\n", "```JSON\n", "```\r\n", "```\n"];
const CLOSING_FENCE: &str = "```";

/// Remove a leading code-fence marker and its trailing closer.
///
/// Only applies when both are present; interior content is untouched and
/// unfenced text comes back unchanged.
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    OPENING_FENCES
        .iter()
        .find_map(|fence| trimmed.strip_prefix(fence))
        .and_then(|rest| rest.strip_suffix(CLOSING_FENCE))
        .map(str::trim)
        .unwrap_or(text)
}

/// Strip fences and parse the remainder as a JSON object.
pub fn normalize(raw: &str) -> Result<ParsedAnalysis, AnalysisError> {
    let stripped = strip_fences(raw);
    let value: Value = serde_json::from_str(stripped).map_err(|e| AnalysisError::InvalidJson {
        reason: e.to_string(),
        text: stripped.to_string(),
    })?;

    match value {
        Value::Object(map) => Ok(ParsedAnalysis::new(map)),
        other => Err(AnalysisError::NotAnObject {
            found: json_kind(&other),
            text: stripped.to_string(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
