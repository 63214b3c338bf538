//! The command history manager.
//!
//! [`HistoryManager`] wraps a [`HistoryLog`] and reverses or reapplies its
//! entries through a [`MutationExecutor`]. All methods take `&self`, so one
//! manager can be shared between the undo/redo buttons and a shortcut
//! listener. The log sits behind a `std::sync::Mutex` that is only held for
//! bookkeeping, never across the executor call.
//!
//! Only one undo or redo may be in flight. A second call issued before the
//! first settles fails with [`HistoryError::Busy`] instead of queueing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};

use taskhist_core::TaskId;
use taskhist_storage::{MutationExecutor, TaskCollection};

use crate::config::HistoryConfig;
use crate::error::HistoryError;
use crate::log::{HistoryEntry, HistoryLog};
use crate::record::{OperationKind, OperationRecord, Step};
use crate::shortcut::HistoryAction;

/// Which way an entry was moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Undo,
    Redo,
}

/// Emitted after every successful undo or redo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEvent {
    pub direction: Direction,
    pub kind: OperationKind,
    /// The task acted on. For steps that re-create a task this is the new id.
    pub task_id: TaskId,
    /// The id the task had before it was re-created, if it changed.
    pub previous_id: Option<TaskId>,
}

type Listener = Box<dyn Fn(&HistoryEvent) + Send + Sync>;

/// Clears the in-flight flag when the undo/redo call ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Bounded undo/redo history over a task collection the caller owns.
pub struct HistoryManager {
    executor: Arc<dyn MutationExecutor>,
    collection: Arc<dyn TaskCollection>,
    log: Mutex<HistoryLog>,
    in_flight: AtomicBool,
    listener: Option<Listener>,
    config: HistoryConfig,
}

impl HistoryManager {
    /// Creates an empty history that executes through `executor` and checks
    /// targets against `collection`.
    pub fn new(
        executor: Arc<dyn MutationExecutor>,
        collection: Arc<dyn TaskCollection>,
        config: HistoryConfig,
    ) -> Self {
        HistoryManager {
            executor,
            collection,
            log: Mutex::new(HistoryLog::new(config.max_history)),
            in_flight: AtomicBool::new(false),
            listener: None,
            config,
        }
    }

    /// Creates a history over a backend that is both executor and collection.
    pub fn for_store<S>(store: Arc<S>, config: HistoryConfig) -> Self
    where
        S: MutationExecutor + TaskCollection + 'static,
    {
        Self::new(store.clone(), store, config)
    }

    /// Registers the callback invoked after each successful undo or redo,
    /// typically to refresh the displayed task list.
    pub fn with_listener(
        mut self,
        listener: impl Fn(&HistoryEvent) + Send + Sync + 'static,
    ) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    fn log(&self) -> MutexGuard<'_, HistoryLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an operation the caller has already performed. Discards any
    /// redo branch and evicts the oldest entry when full.
    pub fn record(&self, op: OperationRecord) {
        let kind = op.kind();
        let task_id = op.task_id().clone();
        let seq = self.log().record(op);
        debug!("recorded {} of task {} as #{}", kind, task_id, seq);
    }

    pub fn can_undo(&self) -> bool {
        self.log().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log().can_redo()
    }

    /// Whether an undo or redo is currently awaiting the executor.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.log().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log().is_empty()
    }

    /// Index of the most recently applied entry, `-1` if none.
    pub fn cursor(&self) -> isize {
        self.log().cursor()
    }

    /// Views of all entries, oldest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.log().entries()
    }

    /// Drops every entry, e.g. on logout or navigation.
    pub fn clear(&self) {
        self.log().clear();
        debug!("history cleared");
    }

    /// Runs `action`. Buttons and keyboard shortcuts both come through here.
    pub async fn dispatch(&self, action: HistoryAction) -> Result<(), HistoryError> {
        match action {
            HistoryAction::Undo => self.undo().await,
            HistoryAction::Redo => self.redo().await,
        }
    }

    /// Reverses the most recently applied live entry.
    ///
    /// On failure the cursor does not move and the entry stays, so the call
    /// can be retried; a missing target additionally marks the entry dead.
    ///
    /// If `record` or `clear` changed the log while the executor call was in
    /// flight, the entry is marked dead and [`HistoryError::Superseded`] is
    /// returned.
    pub async fn undo(&self) -> Result<(), HistoryError> {
        let _in_flight = self.begin()?;

        let (seq, record) = {
            let log = self.log();
            let index = log.undo_index().ok_or(HistoryError::NothingToUndo)?;
            let (seq, record) = log.get(index).ok_or(HistoryError::NothingToUndo)?;
            (seq, record.clone())
        };

        let (task_id, previous_id) = self
            .execute(seq, &record, record.undo_step())
            .await?;

        if !self.commit(seq, Direction::Undo) {
            return Err(HistoryError::Superseded);
        }

        debug!("undid {} of task {}", record.kind(), task_id);
        self.notify(HistoryEvent {
            direction: Direction::Undo,
            kind: record.kind(),
            task_id,
            previous_id,
        });
        Ok(())
    }

    /// Reapplies the oldest undone live entry.
    ///
    /// On failure the cursor does not move; a missing target additionally
    /// marks the entry dead.
    pub async fn redo(&self) -> Result<(), HistoryError> {
        let _in_flight = self.begin()?;

        let (seq, record) = {
            let log = self.log();
            let index = log.redo_index().ok_or(HistoryError::NothingToRedo)?;
            let (seq, record) = log.get(index).ok_or(HistoryError::NothingToRedo)?;
            (seq, record.clone())
        };

        let (task_id, previous_id) = self
            .execute(seq, &record, record.redo_step())
            .await?;

        if !self.commit(seq, Direction::Redo) {
            return Err(HistoryError::Superseded);
        }

        debug!("redid {} of task {}", record.kind(), task_id);
        self.notify(HistoryEvent {
            direction: Direction::Redo,
            kind: record.kind(),
            task_id,
            previous_id,
        });
        Ok(())
    }

    /// Moves the cursor over entry `seq` after its step ran. If the log
    /// changed meanwhile the step's effect no longer matches the entry's
    /// position, so the entry is retired and never runs again.
    fn commit(&self, seq: u64, direction: Direction) -> bool {
        let mut log = self.log();
        let committed = match direction {
            Direction::Undo => log.commit_undo(seq),
            Direction::Redo => log.commit_redo(seq),
        };
        if !committed {
            log.mark_dead(seq);
            warn!(
                "{:?} of #{} finished after the history changed; entry retired",
                direction, seq
            );
        }
        committed
    }

    fn begin(&self) -> Result<InFlight<'_>, HistoryError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| HistoryError::Busy)?;
        Ok(InFlight(&self.in_flight))
    }

    /// Performs `step` for entry `seq`. Returns the id of the task acted on
    /// and, when a re-created task got a new id, the id it replaced.
    async fn execute(
        &self,
        seq: u64,
        record: &OperationRecord,
        step: Step,
    ) -> Result<(TaskId, Option<TaskId>), HistoryError> {
        match step {
            Step::Create(fields) => {
                let created = self
                    .executor
                    .create(fields)
                    .await
                    .map_err(|e| self.fail(seq, e.into()))?;
                let old = record.task_id();
                if created.id == *old {
                    return Ok((created.id, None));
                }
                let touched = self.log().retarget(old, &created.id);
                debug!("task {} is now {} in {} entries", old, created.id, touched);
                Ok((created.id, Some(old.clone())))
            }
            Step::Update(id, patch) => {
                self.ensure_present(seq, &id)?;
                self.executor
                    .update(&id, patch)
                    .await
                    .map_err(|e| self.fail(seq, e.into()))?;
                Ok((id, None))
            }
            Step::Delete(id) => {
                self.ensure_present(seq, &id)?;
                self.executor
                    .delete(&id)
                    .await
                    .map_err(|e| self.fail(seq, e.into()))?;
                Ok((id, None))
            }
        }
    }

    fn ensure_present(&self, seq: u64, id: &TaskId) -> Result<(), HistoryError> {
        if self.collection.contains(id) {
            Ok(())
        } else {
            Err(self.fail(seq, HistoryError::TargetMissing { id: id.clone() }))
        }
    }

    /// Bookkeeping for a failed step. Missing targets retire the entry.
    fn fail(&self, seq: u64, err: HistoryError) -> HistoryError {
        match &err {
            HistoryError::TargetMissing { id } => {
                warn!("task {} for history entry #{} no longer exists", id, seq);
                self.log().mark_dead(seq);
            }
            other => debug!("history entry #{} failed: {}", seq, other),
        }
        err
    }

    fn notify(&self, event: HistoryEvent) {
        if let Some(listener) = &self.listener {
            listener(&event);
        }
    }
}
