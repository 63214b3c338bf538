//! Replay scripts: a JSON description of a client session.
//!
//! A script seeds the in-memory store with tasks and then lists steps. Task
//! mutations are performed through the store and recorded in the history,
//! exactly as a client does; undo/redo and key chords go through the
//! history's single dispatch entry point.
//!
//! ```json
//! {
//!   "tasks": [{ "id": "t1", "title": "Water plants" }],
//!   "steps": [
//!     { "op": "status", "task": "t1", "status": "completed" },
//!     { "op": "create", "fields": { "title": "Call mom" }, "as": "call" },
//!     { "op": "key", "chord": "ctrl+z" },
//!     { "op": "fail_next", "message": "Too Many Requests", "status": 429 },
//!     { "op": "redo" }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use taskhist_core::{Task, TaskFields, TaskId, TaskPatch, TaskStatus};
use taskhist_history::{
    HistoryAction, HistoryConfig, HistoryEntry, HistoryEvent, HistoryManager, KeyChord,
    OperationRecord,
};
use taskhist_storage::{ExecutorError, InMemoryStore, MutationExecutor};

/// A parsed replay script.
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// Tasks present before the first step.
    #[serde(default)]
    pub tasks: Vec<Task>,
    pub steps: Vec<ScriptStep>,
}

/// One step of a script. Task references are labels given with `as`, or
/// literal task ids.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    Create {
        fields: TaskFields,
        #[serde(default, rename = "as")]
        label: Option<String>,
    },
    Update {
        task: String,
        patch: TaskPatch,
    },
    Status {
        task: String,
        status: TaskStatus,
    },
    Delete {
        task: String,
    },
    Undo,
    Redo,
    /// A keyboard chord such as `ctrl+z`.
    Key {
        chord: String,
    },
    /// Fails the next executor call with a network error.
    FailNext {
        message: String,
        #[serde(default)]
        status: Option<u16>,
    },
    Clear,
}

impl ScriptStep {
    pub fn op(&self) -> &'static str {
        match self {
            ScriptStep::Create { .. } => "create",
            ScriptStep::Update { .. } => "update",
            ScriptStep::Status { .. } => "status",
            ScriptStep::Delete { .. } => "delete",
            ScriptStep::Undo => "undo",
            ScriptStep::Redo => "redo",
            ScriptStep::Key { .. } => "key",
            ScriptStep::FailNext { .. } => "fail_next",
            ScriptStep::Clear => "clear",
        }
    }
}

/// Outcome of one step, printed as a JSON line.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub op: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub cursor: isize,
    pub tasks: usize,
}

/// Final state after a script ran.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub tasks: Vec<Task>,
    pub history: Vec<HistoryEntry>,
}

/// A store, its history, and the labels a script has assigned.
pub struct Session {
    store: Arc<InMemoryStore>,
    history: HistoryManager,
    labels: HashMap<String, TaskId>,
    events: Arc<Mutex<Vec<HistoryEvent>>>,
}

impl Session {
    pub fn new(tasks: Vec<Task>, config: HistoryConfig) -> Self {
        let store = Arc::new(InMemoryStore::with_tasks(tasks));
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let history = HistoryManager::for_store(store.clone(), config).with_listener(
            move |event: &HistoryEvent| {
                sink.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(event.clone());
            },
        );
        Session {
            store,
            history,
            labels: HashMap::new(),
            events,
        }
    }

    /// Runs one step. Failures are reported, not returned.
    pub async fn step(&mut self, index: usize, step: ScriptStep) -> StepReport {
        let op = step.op();
        let outcome = self.apply(step).await;
        self.follow_recreated_tasks();
        if let Err(err) = &outcome {
            debug!("step {} ({}) failed: {}", index, op, err);
        }

        StepReport {
            step: index,
            op,
            ok: outcome.is_ok(),
            error: outcome.err(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            cursor: self.history.cursor(),
            tasks: self.store.len(),
        }
    }

    pub fn summary(&self) -> Summary {
        Summary {
            tasks: self.store.tasks(),
            history: self.history.entries(),
        }
    }

    async fn apply(&mut self, step: ScriptStep) -> Result<(), String> {
        match step {
            ScriptStep::Create { fields, label } => {
                let task = self.store.create(fields).await.map_err(|e| e.to_string())?;
                if let Some(label) = label {
                    self.labels.insert(label, task.id.clone());
                }
                self.history.record(OperationRecord::create(task));
                Ok(())
            }
            ScriptStep::Update { task, patch } => {
                let (prior, id) = self.current(&task)?;
                let subject = self
                    .store
                    .update(&id, patch)
                    .await
                    .map_err(|e| e.to_string())?;
                self.history.record(OperationRecord::edit(prior, subject));
                Ok(())
            }
            ScriptStep::Status { task, status } => {
                let (prior, id) = self.current(&task)?;
                let subject = self
                    .store
                    .update(&id, TaskPatch::status(status))
                    .await
                    .map_err(|e| e.to_string())?;
                self.history
                    .record(OperationRecord::status_change(prior, subject));
                Ok(())
            }
            ScriptStep::Delete { task } => {
                let (prior, id) = self.current(&task)?;
                self.store.delete(&id).await.map_err(|e| e.to_string())?;
                self.history.record(OperationRecord::delete(prior));
                Ok(())
            }
            ScriptStep::Undo => self.dispatch(HistoryAction::Undo).await,
            ScriptStep::Redo => self.dispatch(HistoryAction::Redo).await,
            ScriptStep::Key { chord } => {
                let parsed: KeyChord = chord.parse().map_err(|e| format!("{}", e))?;
                match HistoryAction::from_chord(&parsed) {
                    Some(action) => self.dispatch(action).await,
                    None => Err(format!("no history action bound to '{}'", chord)),
                }
            }
            ScriptStep::FailNext { message, status } => {
                self.store.fail_next(match status {
                    Some(status) => ExecutorError::with_status(message, status),
                    None => ExecutorError::network(message),
                });
                Ok(())
            }
            ScriptStep::Clear => {
                self.history.clear();
                Ok(())
            }
        }
    }

    async fn dispatch(&self, action: HistoryAction) -> Result<(), String> {
        self.history.dispatch(action).await.map_err(|e| e.to_string())
    }

    /// Resolves a label or id and returns the task's current value.
    fn current(&self, reference: &str) -> Result<(Task, TaskId), String> {
        let id = self
            .labels
            .get(reference)
            .cloned()
            .unwrap_or_else(|| TaskId::from(reference));
        match self.store.get(&id) {
            Some(task) => Ok((task, id)),
            None => Err(ExecutorError::NotFound(id).to_string()),
        }
    }

    /// Points labels at the new id of any task undo/redo re-created.
    fn follow_recreated_tasks(&mut self) {
        let events: Vec<HistoryEvent> = self
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for event in events {
            let Some(previous) = event.previous_id else {
                continue;
            };
            for id in self.labels.values_mut() {
                if *id == previous {
                    *id = event.task_id.clone();
                }
            }
        }
    }
}
