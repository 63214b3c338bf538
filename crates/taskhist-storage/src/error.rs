//! Executor error types for taskhist-storage.
//!
//! [`ExecutorError`] covers the failure modes of the three mutation calls:
//! transport failures, rejected input, and missing targets. Rate limiting is
//! a network failure that callers detect with [`ExecutorError::is_rate_limited`].

use thiserror::Error;

use taskhist_core::{CoreError, TaskId};

/// HTTP status the backend uses for rate limiting.
pub const RATE_LIMIT_STATUS: u16 = 429;

/// Errors produced by mutation executors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// The call did not complete (transport failure, server error, throttling).
    #[error("network error: {message}")]
    Network {
        message: String,
        /// HTTP status, when the failure came with one.
        status: Option<u16>,
    },

    /// The backend rejected the submitted fields.
    #[error("validation error: {0}")]
    Validation(String),

    /// The targeted task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

impl ExecutorError {
    pub fn network(message: impl Into<String>) -> Self {
        ExecutorError::Network {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        ExecutorError::Network {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Whether this is a network failure caused by rate limiting.
    ///
    /// Detected from a 429 status or, when the backend only returned a
    /// message, from its wording.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            ExecutorError::Network { message, status } => {
                if *status == Some(RATE_LIMIT_STATUS) {
                    return true;
                }
                let lower = message.to_ascii_lowercase();
                lower.contains("rate limit")
                    || lower.contains("too many requests")
                    || lower.contains("429")
            }
            _ => false,
        }
    }
}

impl From<CoreError> for ExecutorError {
    fn from(err: CoreError) -> Self {
        ExecutorError::Validation(err.to_string())
    }
}
