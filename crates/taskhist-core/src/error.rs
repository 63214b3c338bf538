//! Core error types for taskhist-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! validation of task field values.

use thiserror::Error;

/// Core errors produced by the taskhist-core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The task title is empty or only whitespace.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the maximum length.
    #[error("task title is {len} characters, maximum is {max}")]
    TitleTooLong { len: usize, max: usize },
}
