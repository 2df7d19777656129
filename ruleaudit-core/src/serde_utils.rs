use crate::errors::{AuditError, Result};

/// Serializes a value to pretty JSON with canonical error handling.
pub fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|err| AuditError::Serialization(err.to_string()))
}

/// Deserializes a JSON string into the provided type with shared error semantics.
pub fn from_json_str<T: serde::de::DeserializeOwned>(input: &str) -> Result<T> {
    serde_json::from_str(input).map_err(|err| AuditError::Deserialization(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_deserialization_errors() {
        let err = from_json_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(err, AuditError::Deserialization(_)));
    }

    #[test]
    fn pretty_prints_nested_values() {
        let value = serde_json::json!({"issue_counts": {"duplicate_condition": 1}});
        let json = to_pretty_json(&value).expect("serialize");
        assert!(json.contains("\n  \"issue_counts\""));
    }
}
