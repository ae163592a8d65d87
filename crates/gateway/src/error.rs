//! Gateway error types.

use thiserror::Error;

/// Any failure talking to the backend.
///
/// The transaction core does not distinguish causes; it only records at which
/// commit step the failure happened.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced an HTTP response (DNS, TLS, timeout, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The session token was missing, expired or rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// The addressed resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The response did not match the expected envelope or attribute shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A request payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return GatewayError::Api {
                status: status.as_u16(),
                body: err.to_string(),
            };
        }
        if err.is_decode() {
            return GatewayError::InvalidResponse(err.to_string());
        }
        GatewayError::Network(err.to_string())
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
