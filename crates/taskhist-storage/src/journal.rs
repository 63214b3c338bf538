//! Records of the calls a backend received, in order.

use serde::Serialize;

use taskhist_core::{TaskFields, TaskId, TaskPatch};

/// One call made against a [`MutationExecutor`](crate::MutationExecutor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "lowercase")]
pub enum ExecutorCall {
    Create { fields: TaskFields },
    Update { id: TaskId, patch: TaskPatch },
    Delete { id: TaskId },
}
