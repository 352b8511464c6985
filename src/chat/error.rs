//! Chat error types.

use thiserror::Error;

/// Errors returned by the coach and chat backends.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The user message was empty after trimming.
    #[error("Message is empty")]
    EmptyMessage,

    /// The provider has no usable API key.
    #[error("API configuration for '{provider}' is missing or invalid; set {key_var}")]
    NotConfigured { provider: String, key_var: String },

    /// The request could not be sent or the connection failed.
    #[error("Error communicating with the chat service: {0}")]
    Http(String),

    /// The service answered with a non-success status.
    #[error("Chat service returned {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The response did not contain a reply message.
    #[error("Invalid response from the chat service: {0}")]
    InvalidResponse(String),
}

impl ChatError {
    /// Returns true if the error is a configuration problem rather than a
    /// transient failure.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::NotConfigured { .. })
    }

    /// Returns true if retrying the same request might succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::InvalidResponse(error.to_string())
        } else {
            Self::Http(error.to_string())
        }
    }
}
