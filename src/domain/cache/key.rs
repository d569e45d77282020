//! Cache key construction

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Joins a namespace and an identifier with `:`
pub fn namespaced(namespace: &str, id: &str) -> String {
    format!("{}:{}", namespace, id)
}

/// Serializes a JSON value with object keys sorted at every level
pub fn canonical_json(value: &Value) -> String {
    canonicalize(value).to_string()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Hex digest identifying an upstream request.
///
/// Missing params hash the same as an empty object.
pub fn request_digest(path: &str, params: Option<&Value>) -> String {
    let params = match params {
        Some(Value::Null) | None => "{}".to_string(),
        Some(value) => canonical_json(value),
    };

    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    hasher.update(params.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_namespaced() {
        assert_eq!(
            namespaced("wechat:access_token", "wx1"),
            "wechat:access_token:wx1"
        );
    }

    #[test]
    fn test_canonical_json_sorts_nested_keys() {
        let value = json!({"zebra": 1, "apple": {"y": 2, "b": [ {"d": 1, "c": 2} ]}});
        assert_eq!(
            canonical_json(&value),
            r#"{"apple":{"b":[{"c":2,"d":1}],"y":2},"zebra":1}"#
        );
    }

    #[test]
    fn test_digest_ignores_key_order() {
        let a = request_digest("/cgi-bin/draft/get", Some(&json!({"media_id": "M1", "offset": 0})));
        let b = request_digest("/cgi-bin/draft/get", Some(&json!({"offset": 0, "media_id": "M1"})));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_digest_distinguishes_params_and_paths() {
        let m1 = request_digest("/cgi-bin/draft/get", Some(&json!({"media_id": "M1"})));
        let m2 = request_digest("/cgi-bin/draft/get", Some(&json!({"media_id": "M2"})));
        let other = request_digest("/cgi-bin/material/get", Some(&json!({"media_id": "M1"})));

        assert_ne!(m1, m2);
        assert_ne!(m1, other);
    }

    #[test]
    fn test_missing_params_match_empty_object() {
        assert_eq!(
            request_digest("/cgi-bin/user/list", None),
            request_digest("/cgi-bin/user/list", Some(&json!({})))
        );
    }
}
