//! Speech error types.

use thiserror::Error;

/// Errors returned by speech capabilities.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// No speech support is configured.
    #[error("Speech is not supported in this environment")]
    Unsupported,

    /// Nothing to speak.
    #[error("Nothing to speak")]
    EmptyText,

    /// Recognition did not finish in time.
    #[error("Speech recognition timed out")]
    Timeout,

    /// Recognition finished without a transcript.
    #[error("No speech was recognized")]
    NoMatch,

    /// The speech program failed.
    #[error("Speech command failed: {0}")]
    Failed(String),
}

impl SpeechError {
    /// Returns true if speech is not available at all.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported)
    }
}
