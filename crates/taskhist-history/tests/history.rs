//! End-to-end tests for the history manager against the in-memory store.
//!
//! Each test performs task mutations the way a client would (call the
//! executor, then record the operation) and checks what undo and redo do to
//! the live collection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use taskhist_core::{Task, TaskFields, TaskId, TaskPatch, TaskPriority, TaskStatus};
use taskhist_history::{
    EntryState, HistoryAction, HistoryConfig, HistoryError, HistoryManager, KeyChord,
    OperationRecord,
};
use taskhist_storage::{
    ExecutorCall, ExecutorError, InMemoryStore, MutationExecutor, TaskCollection,
};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn manager_with(store: &Arc<InMemoryStore>, max_history: usize) -> HistoryManager {
    HistoryManager::for_store(store.clone(), HistoryConfig::new(max_history).unwrap())
}

/// Creates a task through the store and records it.
async fn create(store: &InMemoryStore, history: &HistoryManager, title: &str) -> Task {
    let task = store.create(TaskFields::titled(title)).await.unwrap();
    history.record(OperationRecord::create(task.clone()));
    task
}

/// Applies `patch` through the store and records the edit.
async fn edit(store: &InMemoryStore, history: &HistoryManager, id: &TaskId, patch: TaskPatch) {
    let prior = store.get(id).unwrap();
    let subject = store.update(id, patch).await.unwrap();
    history.record(OperationRecord::edit(prior, subject));
}

async fn delete(store: &InMemoryStore, history: &HistoryManager, id: &TaskId) {
    let prior = store.get(id).unwrap();
    store.delete(id).await.unwrap();
    history.record(OperationRecord::delete(prior));
}

fn titles(store: &InMemoryStore) -> Vec<String> {
    store.tasks().into_iter().map(|t| t.fields.title).collect()
}

/// Executor whose calls wait for a permit, to hold an undo or redo in flight.
struct GatedStore {
    inner: Arc<InMemoryStore>,
    gate: Semaphore,
}

impl GatedStore {
    fn new(inner: Arc<InMemoryStore>) -> Arc<Self> {
        Arc::new(GatedStore {
            inner,
            gate: Semaphore::new(0),
        })
    }

    async fn pass(&self) {
        self.gate.acquire().await.unwrap().forget();
    }
}

#[async_trait]
impl MutationExecutor for GatedStore {
    async fn create(&self, fields: TaskFields) -> Result<Task, ExecutorError> {
        self.pass().await;
        self.inner.create(fields).await
    }

    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, ExecutorError> {
        self.pass().await;
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &TaskId) -> Result<(), ExecutorError> {
        self.pass().await;
        self.inner.delete(id).await
    }
}

impl TaskCollection for GatedStore {
    fn contains(&self, id: &TaskId) -> bool {
        self.inner.contains(id)
    }
}

async fn wait_until_busy(history: &HistoryManager) {
    for _ in 0..200 {
        if history.is_busy() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("undo/redo never started");
}

// ---------------------------------------------------------------------------
// Log shape
// ---------------------------------------------------------------------------

#[tokio::test]
async fn size_never_exceeds_capacity() {
    let store = Arc::new(InMemoryStore::new());
    let history = manager_with(&store, 5);
    for i in 0..12 {
        create(&store, &history, &format!("task {i}")).await;
        assert!(history.len() <= 5);
    }
}

#[tokio::test]
async fn eviction_drops_oldest_and_keeps_cursor_on_newest() {
    let store = Arc::new(InMemoryStore::new());
    let history = manager_with(&store, 20);
    for i in 0..21 {
        create(&store, &history, &format!("task {i}")).await;
    }

    let entries = history.entries();
    assert_eq!(entries.len(), 20);
    assert_eq!(entries[0].title, "task 1");
    assert_eq!(entries[19].title, "task 20");
    assert_eq!(history.cursor(), 19);
    assert!(entries.iter().all(|e| e.state == EntryState::Applied));
}

#[tokio::test]
async fn new_record_after_undo_discards_redo() {
    let store = Arc::new(InMemoryStore::new());
    let history = manager_with(&store, 20);
    create(&store, &history, "a").await;
    create(&store, &history, "b").await;
    history.undo().await.unwrap();
    assert!(history.can_redo());

    let c = create(&store, &history, "c").await;
    assert!(!history.can_redo());
    let entries = history.entries();
    assert_eq!(entries.last().unwrap().task_id, c.id);
    assert_eq!(entries.len(), 2);
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[tokio::test]
async fn undo_then_redo_restores_post_operation_state() {
    let store = Arc::new(InMemoryStore::new());
    let history = manager_with(&store, 20);
    let task = create(&store, &history, "Plan trip").await;
    edit(
        &store,
        &history,
        &task.id,
        TaskPatch {
            title: Some("Plan summer trip".into()),
            priority: Some(TaskPriority::High),
            description: Some(Some("book flights".into())),
            ..Default::default()
        },
    )
    .await;
    let after = store.get(&task.id).unwrap();

    history.undo().await.unwrap();
    let reverted = store.get(&task.id).unwrap();
    assert_eq!(reverted.fields, task.fields);

    history.redo().await.unwrap();
    assert_eq!(store.get(&task.id).unwrap(), after);
}

#[tokio::test]
async fn status_change_round_trip_issues_exact_calls() {
    let store = Arc::new(InMemoryStore::with_tasks([Task::new(
        "t1",
        TaskFields::titled("Water plants"),
    )]));
    let history = manager_with(&store, 20);
    let id = TaskId::from("t1");
    edit(&store, &history, &id, TaskPatch::status(TaskStatus::Completed)).await;
    store.clear_calls();

    assert!(history.can_undo());
    assert!(!history.can_redo());

    history.undo().await.unwrap();
    assert_eq!(history.cursor(), -1);
    history.redo().await.unwrap();
    assert_eq!(history.cursor(), 0);

    assert_eq!(
        store.calls(),
        vec![
            ExecutorCall::Update {
                id: id.clone(),
                patch: TaskPatch::status(TaskStatus::Todo),
            },
            ExecutorCall::Update {
                id: id.clone(),
                patch: TaskPatch::status(TaskStatus::Completed),
            },
        ]
    );
    assert_eq!(store.get(&id).unwrap().fields.status, TaskStatus::Completed);
}

#[tokio::test]
async fn redo_of_create_follows_new_identity() {
    let store = Arc::new(InMemoryStore::new());
    let history = manager_with(&store, 20);
    let a = create(&store, &history, "Call mom").await;

    history.undo().await.unwrap();
    assert!(store.is_empty());

    history.redo().await.unwrap();
    let b = store.tasks().pop().unwrap();
    assert_ne!(a.id, b.id);
    assert_eq!(history.entries()[0].task_id, b.id);

    store.clear_calls();
    history.undo().await.unwrap();
    assert_eq!(store.calls(), vec![ExecutorCall::Delete { id: b.id }]);
    assert!(store.is_empty());
}

#[tokio::test]
async fn later_records_follow_recreated_task() {
    let store = Arc::new(InMemoryStore::new());
    let history = manager_with(&store, 20);
    let a = create(&store, &history, "Draft").await;
    edit(&store, &history, &a.id, TaskPatch::status(TaskStatus::InProgress)).await;

    history.undo().await.unwrap();
    history.undo().await.unwrap();
    assert!(store.is_empty());

    history.redo().await.unwrap();
    history.redo().await.unwrap();

    let tasks = store.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].fields.status, TaskStatus::InProgress);
    assert_ne!(tasks[0].id, a.id);
}

#[tokio::test]
async fn undo_of_delete_retargets_earlier_records() {
    let store = Arc::new(InMemoryStore::new());
    let history = manager_with(&store, 20);
    let task = create(&store, &history, "Renew passport").await;
    edit(&store, &history, &task.id, TaskPatch::status(TaskStatus::Completed)).await;
    delete(&store, &history, &task.id).await;

    // re-creates the task under a new id
    history.undo().await.unwrap();
    let restored = store.tasks().pop().unwrap();
    assert_ne!(restored.id, task.id);
    assert_eq!(restored.fields.status, TaskStatus::Completed);

    // the status change now targets the restored task
    history.undo().await.unwrap();
    assert_eq!(store.get(&restored.id).unwrap().fields.status, TaskStatus::Todo);

    history.undo().await.unwrap();
    assert!(store.is_empty());
    assert!(!history.can_undo());
}

#[tokio::test]
async fn redo_of_delete_removes_the_restored_task() {
    let store = Arc::new(InMemoryStore::new());
    let history = manager_with(&store, 20);
    let task = create(&store, &history, "Return library book").await;
    delete(&store, &history, &task.id).await;

    history.undo().await.unwrap();
    let restored = store.tasks().pop().unwrap();
    assert_eq!(history.entries()[1].task_id, restored.id);

    store.clear_calls();
    history.redo().await.unwrap();
    assert_eq!(
        store.calls(),
        vec![ExecutorCall::Delete {
            id: restored.id.clone()
        }]
    );
    assert!(store.is_empty());
    assert_eq!(history.cursor(), 1);
    assert!(!history.can_redo());
}

#[tokio::test]
async fn redo_of_delete_after_task_vanished_marks_entry_dead() {
    let store = Arc::new(InMemoryStore::new());
    let history = manager_with(&store, 20);
    let task = create(&store, &history, "Return library book").await;
    delete(&store, &history, &task.id).await;

    history.undo().await.unwrap();
    let restored = store.tasks().pop().unwrap();
    // removed through another path
    store.delete(&restored.id).await.unwrap();
    store.clear_calls();

    assert_eq!(
        history.redo().await,
        Err(HistoryError::TargetMissing {
            id: restored.id.clone()
        })
    );
    assert!(store.calls().is_empty());
    assert_eq!(history.cursor(), 0);
    assert!(!history.can_redo());

    let states: Vec<_> = history.entries().into_iter().map(|e| e.state).collect();
    assert_eq!(states, vec![EntryState::Applied, EntryState::Dead]);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_undo_does_not_move_cursor() {
    let store = Arc::new(InMemoryStore::new());
    let history = manager_with(&store, 20);
    let task = create(&store, &history, "Pay bills").await;

    store.fail_next(ExecutorError::network("connection reset"));
    assert_eq!(
        history.undo().await,
        Err(HistoryError::Network {
            message: "connection reset".into()
        })
    );
    assert_eq!(history.cursor(), 0);
    assert!(history.can_undo());
    assert_eq!(history.entries()[0].task_id, task.id);
    assert!(store.contains(&task.id));

    history.undo().await.unwrap();
    assert!(!store.contains(&task.id));
}

#[tokio::test]
async fn rate_limited_redo_is_reported_distinctly() {
    let store = Arc::new(InMemoryStore::new());
    let history = manager_with(&store, 20);
    create(&store, &history, "Stretch").await;
    history.undo().await.unwrap();

    store.fail_next(ExecutorError::with_status("Too Many Requests", 429));
    let err = history.redo().await.unwrap_err();
    assert!(matches!(err, HistoryError::RateLimited { .. }));
    assert!(history.can_redo());
    assert!(store.is_empty());
}

#[tokio::test]
async fn redo_against_deleted_task_marks_entry_dead() {
    let store = Arc::new(InMemoryStore::new());
    let history = manager_with(&store, 20);
    let task = create(&store, &history, "Fix bike").await;
    let second = create(&store, &history, "Oil chain").await;
    edit(&store, &history, &task.id, TaskPatch::status(TaskStatus::Completed)).await;

    history.undo().await.unwrap();
    // someone else removes the task
    store.delete(&task.id).await.unwrap();

    assert_eq!(
        history.redo().await,
        Err(HistoryError::TargetMissing {
            id: task.id.clone()
        })
    );
    assert!(!history.can_redo());
    assert_eq!(history.redo().await, Err(HistoryError::NothingToRedo));

    let states: Vec<_> = history.entries().into_iter().map(|e| e.state).collect();
    assert_eq!(
        states,
        vec![EntryState::Applied, EntryState::Applied, EntryState::Dead]
    );

    // the remaining entries still work
    history.undo().await.unwrap();
    assert!(!store.contains(&second.id));
}

// ---------------------------------------------------------------------------
// Serialization of in-flight calls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_call_while_in_flight_is_busy() {
    let inner = Arc::new(InMemoryStore::with_tasks([Task::new(
        "t1",
        TaskFields::titled("Read book"),
    )]));
    let gated = GatedStore::new(inner.clone());
    let history = Arc::new(HistoryManager::for_store(
        gated.clone(),
        HistoryConfig::default(),
    ));
    let prior = inner.get(&TaskId::from("t1")).unwrap();
    let subject = prior.patched(&TaskPatch::status(TaskStatus::Completed));
    inner.insert(subject.clone());
    history.record(OperationRecord::status_change(prior, subject));

    let pending = tokio::spawn({
        let history = history.clone();
        async move { history.undo().await }
    });
    wait_until_busy(&history).await;

    assert_eq!(history.undo().await, Err(HistoryError::Busy));
    assert_eq!(
        history.dispatch(HistoryAction::Redo).await,
        Err(HistoryError::Busy)
    );

    gated.gate.add_permits(1);
    pending.await.unwrap().unwrap();
    assert!(!history.is_busy());
    assert_eq!(history.cursor(), -1);
    assert_eq!(inner.calls().len(), 1);
}

#[tokio::test]
async fn record_during_flight_supersedes_the_undo() {
    let inner = Arc::new(InMemoryStore::new());
    let gated = GatedStore::new(inner.clone());
    let history = Arc::new(HistoryManager::for_store(
        gated.clone(),
        HistoryConfig::default(),
    ));
    let first = inner.create(TaskFields::titled("first")).await.unwrap();
    history.record(OperationRecord::create(first));

    let pending = tokio::spawn({
        let history = history.clone();
        async move { history.undo().await }
    });
    wait_until_busy(&history).await;

    let second = inner.create(TaskFields::titled("second")).await.unwrap();
    history.record(OperationRecord::create(second.clone()));

    gated.gate.add_permits(1);
    assert_eq!(pending.await.unwrap(), Err(HistoryError::Superseded));
    assert_eq!(history.cursor(), 1);
    assert_eq!(history.entries()[1].task_id, second.id);

    let states: Vec<_> = history.entries().into_iter().map(|e| e.state).collect();
    assert_eq!(states, vec![EntryState::Dead, EntryState::Applied]);
}

#[tokio::test]
async fn superseded_delete_undo_never_restores_twice() {
    let inner = Arc::new(InMemoryStore::with_tasks([Task::new(
        "keep",
        TaskFields::titled("keep"),
    )]));
    let gated = GatedStore::new(inner.clone());
    let history = Arc::new(HistoryManager::for_store(
        gated.clone(),
        HistoryConfig::default(),
    ));
    let keep = inner.get(&TaskId::from("keep")).unwrap();
    inner.delete(&keep.id).await.unwrap();
    history.record(OperationRecord::delete(keep));

    let pending = tokio::spawn({
        let history = history.clone();
        async move { history.undo().await }
    });
    wait_until_busy(&history).await;

    let other = inner.create(TaskFields::titled("other")).await.unwrap();
    history.record(OperationRecord::create(other.clone()));

    gated.gate.add_permits(1);
    assert_eq!(pending.await.unwrap(), Err(HistoryError::Superseded));
    assert_eq!(titles(&inner), vec!["other", "keep"]);

    // only the newer entry is still undoable
    gated.gate.add_permits(1);
    history.undo().await.unwrap();
    assert_eq!(history.undo().await, Err(HistoryError::NothingToUndo));
    let states: Vec<_> = history.entries().into_iter().map(|e| e.state).collect();
    assert_eq!(states, vec![EntryState::Dead, EntryState::Undone]);
    assert_eq!(titles(&inner), vec!["keep"]);
    assert!(!inner.contains(&other.id));
}

#[tokio::test]
async fn shortcuts_share_the_entry_point() {
    let store = Arc::new(InMemoryStore::new());
    let history = manager_with(&store, 20);
    create(&store, &history, "Sweep").await;

    let undo: KeyChord = "ctrl+z".parse().unwrap();
    let redo: KeyChord = "cmd+shift+z".parse().unwrap();

    let action = HistoryAction::from_chord(&undo).unwrap();
    history.dispatch(action).await.unwrap();
    assert!(store.is_empty());

    let action = HistoryAction::from_chord(&redo).unwrap();
    history.dispatch(action).await.unwrap();
    assert_eq!(titles(&store), vec!["Sweep"]);
}

#[tokio::test]
async fn clear_discards_everything() {
    let store = Arc::new(InMemoryStore::new());
    let history = manager_with(&store, 20);
    create(&store, &history, "a").await;
    create(&store, &history, "b").await;
    history.undo().await.unwrap();

    history.clear();
    assert!(history.is_empty());
    assert!(!history.can_undo());
    assert!(!history.can_redo());
    assert_eq!(titles(&store), vec!["a"]);
}
