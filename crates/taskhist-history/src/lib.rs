//! Undo/redo history for task mutations.
//!
//! A [`HistoryManager`] keeps a bounded, linear log of reversible task
//! operations and reverses or reapplies them through a caller-supplied
//! [`MutationExecutor`](taskhist_storage::MutationExecutor). It never owns
//! the task collection; after each successful undo or redo it notifies a
//! listener so the caller can refresh its view.
//!
//! # Modules
//!
//! - [`record`]: OperationRecord, the tagged reversible operation
//! - [`log`]: HistoryLog, the bounded entry list and its cursor
//! - [`manager`]: HistoryManager, async undo/redo over an executor
//! - [`scope`]: UndoScope trait and layered precedence between scopes
//! - [`shortcut`]: keyboard chord to undo/redo action mapping
//! - [`config`]: HistoryConfig and environment loading
//! - [`error`]: HistoryError, ConfigError, ShortcutError

pub mod config;
pub mod error;
pub mod log;
pub mod manager;
pub mod record;
pub mod scope;
pub mod shortcut;

pub use config::{HistoryConfig, DEFAULT_MAX_HISTORY, MAX_HISTORY_ENV};
pub use error::{ConfigError, HistoryError, ShortcutError};
pub use log::{EntryState, HistoryEntry, HistoryLog};
pub use manager::{Direction, HistoryEvent, HistoryManager};
pub use record::{OperationKind, OperationRecord, Step};
pub use scope::{LayeredScopes, UndoScope};
pub use shortcut::{HistoryAction, KeyChord};
