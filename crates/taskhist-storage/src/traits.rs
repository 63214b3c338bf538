//! The [`MutationExecutor`] and [`TaskCollection`] traits.
//!
//! The history manager never owns the task collection. It reverses and
//! reapplies operations by calling a `MutationExecutor`, and checks that a
//! target still exists by reading a `TaskCollection`. In the web client both
//! are backed by the REST API and the client-side state store; here
//! [`InMemoryStore`](crate::InMemoryStore) implements both.

use async_trait::async_trait;

use taskhist_core::{Task, TaskFields, TaskId, TaskPatch};

use crate::error::ExecutorError;

/// Create/update/delete against a task collection owned by someone else.
///
/// Each call is one asynchronous round trip and may fail. Implementations
/// must be `Send + Sync` so a manager can be shared across tasks.
#[async_trait]
pub trait MutationExecutor: Send + Sync {
    /// Creates a task from `fields`. The backend assigns the identifier.
    ///
    /// Fails with `Network` or `Validation`.
    async fn create(&self, fields: TaskFields) -> Result<Task, ExecutorError>;

    /// Applies `patch` to the task `id` and returns the updated task.
    ///
    /// Fails with `Network` or `NotFound`.
    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, ExecutorError>;

    /// Deletes the task `id`.
    ///
    /// Fails with `Network` or `NotFound`.
    async fn delete(&self, id: &TaskId) -> Result<(), ExecutorError>;
}

/// Read access to the live task collection.
pub trait TaskCollection: Send + Sync {
    /// Whether a task with this id is currently present.
    fn contains(&self, id: &TaskId) -> bool;
}
