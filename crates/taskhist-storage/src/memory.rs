//! In-memory implementation of [`MutationExecutor`] and [`TaskCollection`].
//!
//! [`InMemoryStore`] plays the role the browser-storage mock plays in the web
//! client: a complete backend for offline/demo sessions and tests, with the
//! same validation and not-found semantics as the REST API. It also keeps a
//! journal of every call it received and can be told to fail upcoming calls.

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::debug;

use taskhist_core::{Task, TaskFields, TaskId, TaskPatch};

use crate::error::ExecutorError;
use crate::journal::ExecutorCall;
use crate::traits::{MutationExecutor, TaskCollection};

#[derive(Debug, Default)]
struct StoreState {
    /// Tasks in insertion order.
    tasks: IndexMap<TaskId, Task>,
    calls: Vec<ExecutorCall>,
    /// Failures handed out to the next calls, oldest first.
    pending_failures: VecDeque<ExecutorError>,
}

impl StoreState {
    /// Journals `call` and pops an injected failure if one is queued.
    fn begin(&mut self, call: ExecutorCall) -> Result<(), ExecutorError> {
        self.calls.push(call);
        match self.pending_failures.pop_front() {
            Some(err) => {
                debug!("injected failure: {}", err);
                Err(err)
            }
            None => Ok(()),
        }
    }
}

/// In-memory task collection implementing the executor boundary.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `tasks`, keeping their ids.
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let store = Self::new();
        for task in tasks {
            store.insert(task);
        }
        store
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or replaces a task directly, bypassing the journal.
    pub fn insert(&self, task: Task) {
        self.write().tasks.insert(task.id.clone(), task);
    }

    /// Returns the current value of task `id`.
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.read().tasks.get(id).cloned()
    }

    /// All tasks in insertion order.
    pub fn tasks(&self) -> Vec<Task> {
        self.read().tasks.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().tasks.is_empty()
    }

    /// Every executor call received so far, oldest first.
    pub fn calls(&self) -> Vec<ExecutorCall> {
        self.read().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.write().calls.clear();
    }

    /// Makes the next executor call fail with `err`. Calls queue up, so
    /// invoking this twice fails the next two calls.
    pub fn fail_next(&self, err: ExecutorError) {
        self.write().pending_failures.push_back(err);
    }
}

#[async_trait]
impl MutationExecutor for InMemoryStore {
    async fn create(&self, fields: TaskFields) -> Result<Task, ExecutorError> {
        let mut state = self.write();
        state.begin(ExecutorCall::Create {
            fields: fields.clone(),
        })?;
        fields.validate()?;

        let id = TaskId(uuid::Uuid::new_v4().to_string());
        debug!("Creating task: {}", id);
        let task = Task::new(id.clone(), fields);
        state.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, ExecutorError> {
        let mut state = self.write();
        state.begin(ExecutorCall::Update {
            id: id.clone(),
            patch: patch.clone(),
        })?;

        let current = state
            .tasks
            .get(id)
            .ok_or_else(|| ExecutorError::NotFound(id.clone()))?;
        let next = current.patched(&patch);
        next.fields.validate()?;

        debug!("Updating task: {}", id);
        state.tasks.insert(id.clone(), next.clone());
        Ok(next)
    }

    async fn delete(&self, id: &TaskId) -> Result<(), ExecutorError> {
        let mut state = self.write();
        state.begin(ExecutorCall::Delete { id: id.clone() })?;

        debug!("Deleting task: {}", id);
        state
            .tasks
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| ExecutorError::NotFound(id.clone()))
    }
}

impl TaskCollection for InMemoryStore {
    fn contains(&self, id: &TaskId) -> bool {
        self.read().tasks.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskhist_core::TaskStatus;

    #[tokio::test]
    async fn create_assigns_fresh_ids() {
        let store = InMemoryStore::new();
        let a = store.create(TaskFields::titled("a")).await.unwrap();
        let b = store.create(TaskFields::titled("a")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
        assert!(store.contains(&a.id));
    }

    #[tokio::test]
    async fn create_validates_fields() {
        let store = InMemoryStore::new();
        let err = store.create(TaskFields::titled("")).await.unwrap_err();
        assert!(matches!(err, ExecutorError::Validation(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn update_applies_patch() {
        let store = InMemoryStore::with_tasks([Task::new("t1", TaskFields::titled("x"))]);
        let updated = store
            .update(&TaskId::from("t1"), TaskPatch::status(TaskStatus::Completed))
            .await
            .unwrap();
        assert_eq!(updated.fields.status, TaskStatus::Completed);
        assert_eq!(store.get(&TaskId::from("t1")), Some(updated));
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_tasks() {
        let store = InMemoryStore::new();
        let id = TaskId::from("ghost");
        assert_eq!(
            store.update(&id, TaskPatch::default()).await,
            Err(ExecutorError::NotFound(id.clone()))
        );
        assert_eq!(store.delete(&id).await, Err(ExecutorError::NotFound(id)));
    }

    #[tokio::test]
    async fn delete_preserves_order_of_remaining_tasks() {
        let store = InMemoryStore::with_tasks([
            Task::new("a", TaskFields::titled("a")),
            Task::new("b", TaskFields::titled("b")),
            Task::new("c", TaskFields::titled("c")),
        ]);
        store.delete(&TaskId::from("b")).await.unwrap();
        let ids: Vec<_> = store.tasks().into_iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let store = InMemoryStore::with_tasks([Task::new("t1", TaskFields::titled("x"))]);
        store.fail_next(ExecutorError::network("offline"));
        store.fail_next(ExecutorError::with_status("slow down", 429));

        let id = TaskId::from("t1");
        assert_eq!(
            store.delete(&id).await,
            Err(ExecutorError::network("offline"))
        );
        assert!(store.delete(&id).await.unwrap_err().is_rate_limited());
        assert!(store.delete(&id).await.is_ok());
        assert!(!store.contains(&id));
    }

    #[tokio::test]
    async fn journal_records_every_call() {
        let store = InMemoryStore::with_tasks([Task::new("t1", TaskFields::titled("x"))]);
        let id = TaskId::from("t1");
        store.fail_next(ExecutorError::network("offline"));
        let _ = store.update(&id, TaskPatch::status(TaskStatus::Todo)).await;
        store.delete(&id).await.unwrap();

        assert_eq!(
            store.calls(),
            vec![
                ExecutorCall::Update {
                    id: id.clone(),
                    patch: TaskPatch::status(TaskStatus::Todo),
                },
                ExecutorCall::Delete { id },
            ]
        );
        store.clear_calls();
        assert!(store.calls().is_empty());
    }
}
