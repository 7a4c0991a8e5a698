//! Error types for telemetry client operations

use thiserror::Error;

/// Result type alias for telemetry client operations
pub type Result<T> = std::result::Result<T, TelemetryClientError>;

/// Errors that can occur during telemetry client operations
///
/// Nothing is retried inside the client; every error reaches the caller as-is.
#[derive(Error, Debug)]
pub enum TelemetryClientError {
    /// Identifier or base URL cannot form a valid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No response was received (DNS, connect, timeout, reset)
    #[error("Transport error: {0}")]
    TransportError(#[from] reqwest::Error),

    /// Server answered with anything other than 200
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// 200 response whose body does not have the expected shape
    #[error("Failed to decode response: {0}")]
    DecodeError(String),
}

impl TelemetryClientError {
    /// Create a server error from status code and message
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            message: message.into(),
        }
    }

    /// HTTP status of a server error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<url::ParseError> for TelemetryClientError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidRequest(format!("invalid URL: {}", err))
    }
}
