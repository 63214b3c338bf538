//! Task values, field sets, and partial updates.
//!
//! A [`Task`] is the full value of one task at a point in time; the history
//! layer stores these as snapshots. [`TaskFields`] is everything except the
//! identifier (what a create call takes), and [`TaskPatch`] is a sparse set
//! of field changes (what an update call takes).

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::id::TaskId;

/// Longest accepted task title, in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Workflow status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

/// Priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        };
        write!(f, "{}", s)
    }
}

/// All user-editable fields of a task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFields {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub status: TaskStatus,
    /// Friend the task is assigned to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

impl TaskFields {
    /// Creates a field set with the given title and defaults elsewhere.
    pub fn titled(title: impl Into<String>) -> Self {
        TaskFields {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Checks the invariants every stored task must satisfy.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::EmptyTitle);
        }
        let len = self.title.chars().count();
        if len > MAX_TITLE_LEN {
            return Err(CoreError::TitleTooLong {
                len,
                max: MAX_TITLE_LEN,
            });
        }
        Ok(())
    }
}

/// A task with its identifier. Used as the snapshot type throughout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(flatten)]
    pub fields: TaskFields,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, fields: TaskFields) -> Self {
        Task {
            id: id.into(),
            fields,
        }
    }

    /// Returns a copy of this task with `patch` applied.
    pub fn patched(&self, patch: &TaskPatch) -> Task {
        let mut next = self.clone();
        patch.apply(&mut next.fields);
        next
    }
}

/// Sparse update: only the `Some` fields are changed.
///
/// Nullable fields use a nested `Option` so a patch can distinguish
/// "leave alone" (`None`) from "clear" (`Some(None)`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub assigned_to: Option<Option<String>>,
}

/// Maps a present JSON key (including `null`) to `Some(..)`.
fn present<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

impl TaskPatch {
    /// A patch that only changes the status.
    pub fn status(status: TaskStatus) -> Self {
        TaskPatch {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Builds the patch that turns `from` into `to`, touching only the
    /// fields whose values differ.
    pub fn between(from: &TaskFields, to: &TaskFields) -> Self {
        fn diff<T: PartialEq + Clone>(a: &T, b: &T) -> Option<T> {
            (a != b).then(|| b.clone())
        }

        TaskPatch {
            title: diff(&from.title, &to.title),
            description: diff(&from.description, &to.description),
            due_date: diff(&from.due_date, &to.due_date),
            priority: diff(&from.priority, &to.priority),
            status: diff(&from.status, &to.status),
            assigned_to: diff(&from.assigned_to, &to.assigned_to),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    pub fn apply(&self, fields: &mut TaskFields) {
        if let Some(title) = &self.title {
            fields.title = title.clone();
        }
        if let Some(description) = &self.description {
            fields.description = description.clone();
        }
        if let Some(due_date) = self.due_date {
            fields.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            fields.priority = priority;
        }
        if let Some(status) = self.status {
            fields.status = status;
        }
        if let Some(assigned_to) = &self.assigned_to {
            fields.assigned_to = assigned_to.clone();
        }
    }
}
