//! Recoverable errors surfaced to the user.

use thiserror::Error;

/// Errors produced by sequence generation and transport control.
///
/// None of these are fatal: the caller shows the message and the prior state
/// stays in place.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClaveError {
    /// Malformed pattern text, bad subdivision, bad tempo, bad length or volume.
    #[error("{0}")]
    Validation(String),

    /// Playback was requested before any sequence was generated.
    #[error("generate a clave first")]
    EmptySequence,

    /// The audio backend refused to resume.
    #[error("audio backend unavailable: {0}")]
    Backend(String),
}

impl ClaveError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
