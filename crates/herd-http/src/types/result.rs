//! Normalized dispatch outcome.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Human-readable failure message produced by the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiFailure {
    message: String,
}

impl ApiFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_message(self) -> String {
        self.message
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApiFailure {}

/// Either the parsed response payload or a failure message, never both.
pub type DispatchResult<T = serde_json::Value> = std::result::Result<T, ApiFailure>;

/// `{data, error}` envelope for relaying a [`DispatchResult`] as JSON.
///
/// Only the field that holds a value is written, so a `null` payload stays
/// distinguishable from a missing one: `{"data": null}` reads back as
/// `Some(Value::Null)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct DispatchEnvelope<T = serde_json::Value> {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A field that appears in the input is `Some`, even when it is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl<T> From<DispatchResult<T>> for DispatchEnvelope<T> {
    fn from(result: DispatchResult<T>) -> Self {
        match result {
            Ok(data) => DispatchEnvelope {
                data: Some(data),
                error: None,
            },
            Err(failure) => DispatchEnvelope {
                data: None,
                error: Some(failure.into_message()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_success() {
        let env: DispatchEnvelope = Ok(json!({"total_animals": 12})).into();
        assert_eq!(env.data, Some(json!({"total_animals": 12})));
        assert!(env.error.is_none());
    }

    #[test]
    fn test_envelope_failure() {
        let env: DispatchEnvelope = Err(ApiFailure::new("Animal not found")).into();
        assert!(env.data.is_none());
        assert_eq!(env.error.as_deref(), Some("Animal not found"));
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({"error": "Animal not found"})
        );
    }

    #[test]
    fn test_null_payload_still_counts_as_data() {
        let env: DispatchEnvelope = Ok(serde_json::Value::Null).into();
        assert_eq!(env.data, Some(serde_json::Value::Null));
        assert!(env.error.is_none());
    }

    #[test]
    fn test_null_payload_survives_json() {
        let env: DispatchEnvelope = Ok(serde_json::Value::Null).into();
        let text = serde_json::to_string(&env).unwrap();
        assert_eq!(text, r#"{"data":null}"#);

        let back: DispatchEnvelope = serde_json::from_str(&text).unwrap();
        assert_eq!(back.data, Some(serde_json::Value::Null));
        assert!(back.error.is_none());
    }

    #[test]
    fn test_failure_survives_json() {
        let env: DispatchEnvelope = Err(ApiFailure::new("Upload failed")).into();
        let back: DispatchEnvelope =
            serde_json::from_str(&serde_json::to_string(&env).unwrap()).unwrap();
        assert!(back.data.is_none());
        assert_eq!(back.error.as_deref(), Some("Upload failed"));
    }
}
