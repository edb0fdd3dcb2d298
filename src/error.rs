// Error handling module
// Defines the client error type and conversion from HTTP failures

use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Category of a transport-level failure (no HTTP status was received)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    ConnectionFailed,
    Request,
    Body,
    Decode,
    Unknown,
}

impl TransportErrorKind {
    /// Categorize a reqwest error for logging and error reporting
    pub fn of(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::ConnectionFailed
        } else if err.is_request() {
            Self::Request
        } else if err.is_body() {
            Self::Body
        } else if err.is_decode() {
            Self::Decode
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionFailed => "connection_failed",
            Self::Request => "request_error",
            Self::Body => "body_error",
            Self::Decode => "decode_error",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the API client and the session layer
///
/// The type is `Clone` so that the outcome of a single refresh attempt can be
/// handed to every request queued behind it.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// Server answered with a non-success status
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Authentication could not be established or recovered
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// No response was received
    #[error("HTTP transport error ({kind}): {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    /// Response body did not have the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Caller gave up on the request
    #[error("Request was cancelled")]
    Cancelled,
}

impl ApiError {
    /// Build an error from a failed response status and its (raw) body text
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        ApiError::Status {
            status: status.as_u16(),
            message: error_message(status, body),
        }
    }

    /// HTTP status of the failure, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// 403 responses are never retried; permission gating is up to the caller
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return ApiError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        ApiError::Transport {
            kind: TransportErrorKind::of(&err),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Pull a human readable message out of an error body.
///
/// Understands the backend error envelope (`{"status": "error", "message": ...}`)
/// and plain `{"detail": ...}` bodies; anything else is returned verbatim.
fn error_message(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string();
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        for key in ["message", "detail"] {
            if let Some(message) = map.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }

    trimmed.to_string()
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
