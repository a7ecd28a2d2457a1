//! Error types for the client library.

use thiserror::Error;

/// Errors that can occur when calling the marketplace API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Network or HTTP transport failure.
    ///
    /// DNS resolution, refused connections, broken sockets, or a body that
    /// could not be read.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON serialization or deserialization error.
    ///
    /// Raised when the payload cannot be encoded, or when a response declared
    /// as JSON does not parse.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The API answered with a status outside `200..=299`.
    ///
    /// `message` carries the status code and whatever could be recovered from
    /// the error body.
    #[error("{message}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Diagnostic message including the status code.
        message: String,
    },

    /// Client configuration issue, such as a missing or malformed base URL.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The response decoded, but not into the shape the caller expected.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// HTTP status code, if the API answered with an error status.
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if the API rejected the credentials (HTTP 401 or 403).
    pub const fn is_authentication_error(&self) -> bool {
        matches!(self, Self::HttpStatus { status: 401 | 403, .. })
    }

    /// Check if this is a transport-level failure.
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::NetworkError(_))
    }
}
