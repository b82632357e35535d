use serde_json::{Map, Value};

use crate::database::DocumentId;
use crate::error::ApiError;

/// Parse a path identifier, rejecting malformed ids before they reach the store.
pub fn parse_id(raw: &str) -> Result<DocumentId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("invalid document id: {}", raw)))
}

/// Request bodies are stored as-is, but must be JSON objects.
pub fn into_object(body: Value) -> Result<Map<String, Value>, ApiError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::bad_request("request body must be a JSON object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(matches!(parse_id("63a1f0c2e4b0"), Err(ApiError::BadRequest(_))));
        assert!(parse_id(&DocumentId::generate().to_string()).is_ok());
    }

    #[test]
    fn into_object_requires_an_object() {
        assert!(into_object(json!({"a": 1})).is_ok());
        assert!(into_object(json!([1, 2])).is_err());
        assert!(into_object(Value::Null).is_err());
    }
}
