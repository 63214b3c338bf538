//! Error types for the history crate.

use thiserror::Error;

use taskhist_core::TaskId;
use taskhist_storage::ExecutorError;

/// Errors surfaced by [`HistoryManager::undo`](crate::HistoryManager::undo)
/// and [`HistoryManager::redo`](crate::HistoryManager::redo).
///
/// The manager itself performs no user-facing side effects; callers decide
/// how each variant is shown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// No live entry at or below the cursor. Informational.
    #[error("nothing to undo")]
    NothingToUndo,

    /// No live entry above the cursor. Informational.
    #[error("nothing to redo")]
    NothingToRedo,

    /// Another undo or redo has not settled yet.
    #[error("another undo or redo is still in progress")]
    Busy,

    /// The log was changed by `record` or `clear` while the executor call
    /// was in flight. The cursor was left as the newer change shaped it and
    /// the entry, if still present, is marked dead.
    #[error("history changed while the operation was in flight")]
    Superseded,

    /// The task the entry refers to no longer exists. The entry is marked
    /// dead and skipped from then on.
    #[error("task {id} no longer exists")]
    TargetMissing { id: TaskId },

    /// The backend is throttling requests.
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    /// The executor call failed in transit. Safe to retry.
    #[error("network error: {message}")]
    Network { message: String },

    /// The backend rejected the reapplied fields.
    #[error("validation error: {message}")]
    Validation { message: String },
}

impl HistoryError {
    /// Whether this only means there was nothing to do.
    pub fn is_noop(&self) -> bool {
        matches!(self, HistoryError::NothingToUndo | HistoryError::NothingToRedo)
    }

    /// Whether calling again later may succeed for the same entry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HistoryError::Network { .. } | HistoryError::RateLimited { .. } | HistoryError::Busy
        )
    }
}

impl From<ExecutorError> for HistoryError {
    fn from(err: ExecutorError) -> Self {
        if err.is_rate_limited() {
            let message = match err {
                ExecutorError::Network { message, .. } => message,
                other => other.to_string(),
            };
            return HistoryError::RateLimited { message };
        }
        match err {
            ExecutorError::Network { message, .. } => HistoryError::Network { message },
            ExecutorError::Validation(message) => HistoryError::Validation { message },
            ExecutorError::NotFound(id) => HistoryError::TargetMissing { id },
        }
    }
}

/// Invalid history configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max history must be a positive integer, got '{value}'")]
    InvalidMaxHistory { value: String },
}

/// A key chord string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortcutError {
    #[error("empty key chord")]
    Empty,

    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),

    #[error("key chord '{0}' has no key")]
    MissingKey(String),
}
