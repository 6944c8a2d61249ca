//! API error types

use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by the API transport layer
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response reached the client (network, DNS, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// A response arrived with status >= 400
    #[error("HTTP {status} on {url}")]
    Http {
        status: u16,
        url: String,
        /// Structured `{status, data}` payload when the server sent one
        body: Option<Value>,
    },

    /// The response body could not be decoded
    #[error("Invalid response: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status code, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when no response reached the client at all
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    /// Fixed user-facing message for this error.
    ///
    /// Server-provided error bodies are never exposed to the user.
    pub fn user_message(&self) -> &'static str {
        let status = match self {
            ApiError::Transport(_) => {
                return "Connection error. Please check your internet connection.";
            }
            ApiError::Http { status, .. } => *status,
            ApiError::Json(_) => return "An unexpected error occurred.",
        };

        match status {
            401 => "Expired session. Please reconnect.",
            403 => "Access denied. You don't have the necessary permissions.",
            404 => "Resource not found.",
            422 => "Invalid data. Please check your information.",
            429 => "Too many requests. Please wait before trying again.",
            500 => "Server error. Please try again later.",
            503 => "Service temporarily unavailable. Please try again later.",
            _ => "An unexpected error occurred.",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// Log an error with minimal context (status and url, never the full body)
pub fn log_error(err: &ApiError, context: &str) {
    match err {
        ApiError::Http { status, url, .. } => {
            tracing::warn!(%context, %status, %url, "api error");
        }
        other => {
            tracing::warn!(%context, error = %other, "api error");
        }
    }
}
