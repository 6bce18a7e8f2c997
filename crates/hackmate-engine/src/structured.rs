//! Parse-and-validate step for model text that is expected to encode a JSON
//! array. The only repair applied is the documented stripping heuristic:
//! surrounding whitespace, backtick fencing, and a leading language tag.
//! Anything beyond that is a hard `UpstreamParse` failure for the call.

use jsonschema::JSONSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{EngineError, Result};

/// Strips surrounding markdown code fencing and an optional leading
/// language tag (e.g. ```` ```json ````) from raw model output. The fence
/// must wrap the whole text; fences embedded mid-text are left alone.
pub fn strip_fencing(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // Skip the language identifier line, if any.
    let inner = match inner.find('\n') {
        Some(newline) if inner[..newline].trim().chars().all(char::is_alphanumeric) => {
            &inner[newline + 1..]
        }
        _ => inner,
    };
    inner.trim()
}

/// Parses raw model text as a JSON array, checks it against `schema_json`
/// (a JSON Schema document), and deserializes the elements.
pub fn parse_array<T: DeserializeOwned>(raw: &str, schema_json: &str) -> Result<Vec<T>> {
    let cleaned = strip_fencing(raw);

    let value: Value = serde_json::from_str(cleaned)
        .map_err(|e| EngineError::UpstreamParse(format!("not valid JSON: {}", e)))?;

    let schema_value: Value =
        serde_json::from_str(schema_json).map_err(|e| EngineError::Config(e.to_string()))?;
    let compiled = JSONSchema::compile(&schema_value)
        .map_err(|e| EngineError::Config(format!("failed to compile schema: {}", e)))?;

    if let Err(errors) = compiled.validate(&value) {
        let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
        return Err(EngineError::UpstreamParse(format!(
            "schema mismatch: {}",
            messages.join(", ")
        )));
    }

    serde_json::from_value(value)
        .map_err(|e| EngineError::UpstreamParse(format!("shape mismatch: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pair {
        id: u8,
        label: String,
    }

    const PAIR_SCHEMA: &str = r#"{
        "type": "array",
        "items": {
            "type": "object",
            "required": ["id", "label"],
            "properties": {
                "id": { "type": "integer", "minimum": 1 },
                "label": { "type": "string" }
            }
        }
    }"#;

    #[test]
    fn strips_fenced_block_with_language_tag() {
        let raw = "```json\n[{\"id\": 1, \"label\": \"a\"}]\n```\n";
        assert_eq!(strip_fencing(raw), "[{\"id\": 1, \"label\": \"a\"}]");
    }

    #[test]
    fn leaves_mid_text_fences_alone() {
        let raw = "Here you go:\n```json\n[1]\n```";
        assert_eq!(strip_fencing(raw), raw.trim());
    }

    #[test]
    fn strips_bare_fences() {
        let raw = "```\n[1, 2]\n```";
        assert_eq!(strip_fencing(raw), "[1, 2]");
    }

    #[test]
    fn passes_unfenced_text_through() {
        assert_eq!(strip_fencing("  [1]  "), "[1]");
    }

    #[test]
    fn unfenced_json_with_embedded_backticks_survives() {
        let raw = "[{\"id\": 3, \"label\": \"use ``` for code\"}]";
        let parsed: Vec<Pair> = parse_array(raw, PAIR_SCHEMA).unwrap();
        assert_eq!(parsed[0].label, "use ``` for code");
    }

    #[test]
    fn parses_valid_array() {
        let parsed: Vec<Pair> =
            parse_array("```json\n[{\"id\": 2, \"label\": \"x\"}]\n```", PAIR_SCHEMA).unwrap();
        assert_eq!(
            parsed,
            vec![Pair {
                id: 2,
                label: "x".to_string()
            }]
        );
    }

    #[test]
    fn non_json_is_an_upstream_parse_error() {
        let err = parse_array::<Pair>("sorry, I cannot help with that", PAIR_SCHEMA).unwrap_err();
        assert!(matches!(err, EngineError::UpstreamParse(_)));
    }

    #[test]
    fn schema_violation_is_an_upstream_parse_error() {
        let err = parse_array::<Pair>("[{\"id\": 0, \"label\": \"x\"}]", PAIR_SCHEMA).unwrap_err();
        assert!(matches!(err, EngineError::UpstreamParse(_)));
    }
}
