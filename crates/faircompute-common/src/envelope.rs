//! The `{ data, version }` wrapper applied to every request body.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// API version sent when a request asks for it.
pub const API_VERSION: &str = "2024-07-04";

/// Request body sent to the marketplace API.
///
/// `data` is always present; an absent payload becomes `{}`. `version` is only
/// serialized when set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestEnvelope {
    /// Caller-supplied payload.
    pub data: Value,
    /// API version, present only when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'static str>,
}

impl RequestEnvelope {
    /// Wraps a payload, substituting an empty object when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be represented as JSON.
    pub fn new<P: Serialize + ?Sized>(payload: Option<&P>) -> serde_json::Result<Self> {
        let data = match payload {
            Some(payload) => serde_json::to_value(payload)?,
            None => Value::Object(serde_json::Map::new()),
        };

        Ok(Self {
            data,
            version: None,
        })
    }

    /// Adds [`API_VERSION`] to the envelope when `include` is true.
    #[must_use]
    pub fn with_version(mut self, include: bool) -> Self {
        self.version = if include { Some(API_VERSION) } else { None };
        self
    }

    /// Serializes the envelope into the request body.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_body(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Response body wrapped in a top-level `data` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    /// The wrapped payload.
    pub data: T,
}

impl<T> DataEnvelope<T> {
    /// Unwraps the payload.
    pub fn into_inner(self) -> T {
        self.data
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn test_missing_payload_becomes_empty_object() {
        let envelope = RequestEnvelope::new::<Value>(None).unwrap();
        let body: Value = serde_json::from_str(&envelope.to_body().unwrap()).unwrap();

        assert_eq!(body, json!({ "data": {} }));
    }

    #[test]
    fn test_version_included_only_when_requested() {
        let payload = json!({ "node_id": "n1" });

        let with = RequestEnvelope::new(Some(&payload))
            .unwrap()
            .with_version(true);
        let body: Value = serde_json::from_str(&with.to_body().unwrap()).unwrap();
        assert_eq!(body["version"], "2024-07-04");

        let without = RequestEnvelope::new(Some(&payload))
            .unwrap()
            .with_version(false);
        let body: Value = serde_json::from_str(&without.to_body().unwrap()).unwrap();
        assert!(body.get("version").is_none());
        assert_eq!(body["data"], payload);
    }

    #[test]
    fn test_typed_payload() {
        #[derive(Serialize)]
        struct Ping {
            id: u32,
        }

        let envelope = RequestEnvelope::new(Some(&Ping { id: 7 })).unwrap();
        assert_eq!(envelope.data, json!({ "id": 7 }));
    }
}
