//! Reversible task operations.
//!
//! [`OperationRecord`] represents one task mutation the user performed. Each
//! variant carries the snapshots needed to reverse it and to apply it again,
//! so undo and redo are pure functions of the record ([`OperationRecord::undo_step`]
//! and [`OperationRecord::redo_step`]) that produce a [`Step`] for the
//! manager to execute. Records hold no callbacks and serialize to JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

use taskhist_core::{Task, TaskFields, TaskId, TaskPatch};

/// The closed set of operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Create,
    Update,
    Delete,
    StatusChange,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::StatusChange => "status-change",
        };
        write!(f, "{}", s)
    }
}

/// A reversible task mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum OperationRecord {
    /// A task was created. There is no prior value.
    Create { subject: Task },
    /// Fields of a task were edited.
    Update { prior: Task, subject: Task },
    /// Only the status of a task changed.
    StatusChange { prior: Task, subject: Task },
    /// A task was deleted (captures the full task for re-creation on undo).
    Delete { prior: Task },
}

/// One executor call the manager must make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Create(TaskFields),
    Update(TaskId, TaskPatch),
    Delete(TaskId),
}

impl OperationRecord {
    pub fn create(created: Task) -> Self {
        OperationRecord::Create { subject: created }
    }

    pub fn update(prior: Task, subject: Task) -> Self {
        OperationRecord::Update { prior, subject }
    }

    pub fn status_change(prior: Task, subject: Task) -> Self {
        OperationRecord::StatusChange { prior, subject }
    }

    pub fn delete(deleted: Task) -> Self {
        OperationRecord::Delete { prior: deleted }
    }

    /// Records an edit, choosing `StatusChange` when the status is the only
    /// field that differs.
    pub fn edit(prior: Task, subject: Task) -> Self {
        let patch = TaskPatch::between(&prior.fields, &subject.fields);
        if patch.status.is_some() && patch == TaskPatch::status(subject.fields.status) {
            OperationRecord::status_change(prior, subject)
        } else {
            OperationRecord::update(prior, subject)
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            OperationRecord::Create { .. } => OperationKind::Create,
            OperationRecord::Update { .. } => OperationKind::Update,
            OperationRecord::StatusChange { .. } => OperationKind::StatusChange,
            OperationRecord::Delete { .. } => OperationKind::Delete,
        }
    }

    /// The task value after the operation. For a delete this is the task
    /// that was removed, i.e. what a redo deletes again.
    pub fn subject(&self) -> &Task {
        match self {
            OperationRecord::Create { subject }
            | OperationRecord::Update { subject, .. }
            | OperationRecord::StatusChange { subject, .. } => subject,
            OperationRecord::Delete { prior } => prior,
        }
    }

    /// The task value before the operation, absent for a create.
    pub fn prior(&self) -> Option<&Task> {
        match self {
            OperationRecord::Create { .. } => None,
            OperationRecord::Update { prior, .. }
            | OperationRecord::StatusChange { prior, .. }
            | OperationRecord::Delete { prior } => Some(prior),
        }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.subject().id
    }

    /// The executor call that reverses this operation.
    pub fn undo_step(&self) -> Step {
        match self {
            OperationRecord::Create { subject } => Step::Delete(subject.id.clone()),
            OperationRecord::Update { prior, subject }
            | OperationRecord::StatusChange { prior, subject } => Step::Update(
                subject.id.clone(),
                TaskPatch::between(&subject.fields, &prior.fields),
            ),
            OperationRecord::Delete { prior } => Step::Create(prior.fields.clone()),
        }
    }

    /// The executor call that applies this operation again.
    pub fn redo_step(&self) -> Step {
        match self {
            OperationRecord::Create { subject } => Step::Create(subject.fields.clone()),
            OperationRecord::Update { prior, subject }
            | OperationRecord::StatusChange { prior, subject } => Step::Update(
                subject.id.clone(),
                TaskPatch::between(&prior.fields, &subject.fields),
            ),
            OperationRecord::Delete { prior } => Step::Delete(prior.id.clone()),
        }
    }

    /// Rewrites every snapshot id equal to `from` to `to`. Returns whether
    /// anything changed.
    ///
    /// Re-creating a task yields a new identifier, and every record that
    /// refers to the logical task must follow it.
    pub fn retarget(&mut self, from: &TaskId, to: &TaskId) -> bool {
        let mut changed = false;
        let mut swap = |task: &mut Task| {
            if task.id == *from {
                task.id = to.clone();
                changed = true;
            }
        };
        match self {
            OperationRecord::Create { subject } => swap(subject),
            OperationRecord::Update { prior, subject }
            | OperationRecord::StatusChange { prior, subject } => {
                swap(prior);
                swap(subject);
            }
            OperationRecord::Delete { prior } => swap(prior),
        }
        changed
    }
}
