//! Error types for the generation gateway

use thiserror::Error;

/// Errors that can occur when calling the generation gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Gateway token could not be read from or written to the keyring
    #[error("Failed to access keyring: {0}")]
    KeyringError(String),

    /// Token rejected before storing
    #[error("Invalid gateway token. Tokens must be non-empty and contain no whitespace")]
    InvalidToken,

    /// HTTP request failed (connection, timeout, body read)
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Gateway answered with a non-success status
    #[error("Gateway error ({status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response
        message: String,
    },

    /// Body was not valid JSON for the expected shape
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Body parsed but failed validation
    #[error("Invalid response payload: {0}")]
    InvalidPayload(String),
}

impl GatewayError {
    /// Check if this error is recoverable (user can retry)
    pub fn is_recoverable(&self) -> bool {
        match self {
            GatewayError::RequestError(_) => true,
            GatewayError::ApiError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Text suitable for showing to the learner
    pub fn display_message(&self) -> String {
        match self {
            GatewayError::ApiError { message, .. } => message.clone(),
            GatewayError::RequestError(e) if e.is_timeout() => {
                "The request timed out. Try again in a moment.".to_string()
            }
            GatewayError::RequestError(_) => {
                "Could not reach the generation service. Check your connection.".to_string()
            }
            GatewayError::JsonError(_) | GatewayError::InvalidPayload(_) => {
                "The generation service returned an unexpected response.".to_string()
            }
            other => other.to_string(),
        }
    }
}
