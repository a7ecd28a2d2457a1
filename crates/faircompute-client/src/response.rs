//! Decoded response bodies.

use serde_json::Value;

use crate::error::ClientError;

/// A successful response body, tagged by how it was decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse<T> {
    /// The response declared a JSON content type and parsed as `T`.
    Json(T),
    /// The response did not declare JSON, but its text parsed as `T`.
    ParsedText(T),
    /// The response text did not parse as `T`; returned as-is.
    Text(String),
}

impl<T> ApiResponse<T> {
    /// Returns the decoded value, or `None` for raw text.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Json(value) | Self::ParsedText(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Returns the decoded value, failing on raw text.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidResponse`] when the body was not decodable.
    pub fn into_data(self) -> Result<T, ClientError> {
        match self {
            Self::Json(value) | Self::ParsedText(value) => Ok(value),
            Self::Text(text) => Err(ClientError::InvalidResponse(format!(
                "expected a JSON body, got: {text}"
            ))),
        }
    }

    /// Returns the raw text when the body did not decode.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Check if the body was returned as raw text.
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl ApiResponse<Value> {
    /// Collapses the response into a single JSON value; raw text becomes a
    /// JSON string.
    pub fn into_json(self) -> Value {
        match self {
            Self::Json(value) | Self::ParsedText(value) => value,
            Self::Text(text) => Value::String(text),
        }
    }
}
