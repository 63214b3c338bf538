//! The mutation boundary between the history manager and the task collection.
//!
//! Provides the [`MutationExecutor`] trait (create/update/delete against a
//! collection the caller owns), the [`TaskCollection`] read used for
//! existence checks, and [`InMemoryStore`] as a first-class backend for
//! offline/demo sessions and tests.
//!
//! # Modules
//!
//! - [`error`]: ExecutorError enum and rate-limit detection
//! - [`traits`]: MutationExecutor and TaskCollection trait definitions
//! - [`journal`]: ExecutorCall records of every call a backend received
//! - [`memory`]: InMemoryStore implementation

pub mod error;
pub mod journal;
pub mod memory;
pub mod traits;

// Re-export key types for ergonomic use.
pub use error::ExecutorError;
pub use journal::ExecutorCall;
pub use memory::InMemoryStore;
pub use traits::{MutationExecutor, TaskCollection};
