//! Encoding policy for values stored in the networked backend
//!
//! Strings are stored as-is, everything else as JSON. On read, anything that
//! parses as JSON is returned parsed and everything else comes back as a
//! string. A stored string that happens to be valid JSON (`"42"`, `"true"`)
//! is therefore read back as the parsed value.

use serde_json::Value;

use crate::domain::DomainError;

/// Encodes a value for the networked backend
pub fn encode(value: &Value) -> Result<String, DomainError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => serde_json::to_string(other)
            .map_err(|e| DomainError::serialization(format!("Failed to encode value: {}", e))),
    }
}

/// Decodes a raw backend value, falling back to the raw string
pub fn decode(raw: String) -> Value {
    match serde_json::from_str::<Value>(&raw) {
        Ok(value) => value,
        Err(_) => Value::String(raw),
    }
}
