//! The bounded history log and its cursor.
//!
//! [`HistoryLog`] is plain owned state: an ordered list of entries plus a
//! cursor pointing at the most recently applied entry (`-1` when nothing is
//! applied). Whether undo or redo is available is derived from the entries
//! on every query rather than cached.
//!
//! Entries whose task disappeared out-of-band are marked dead. Dead entries
//! stay in place so positions do not shift, but they are never selected for
//! undo or redo and the cursor steps over them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use taskhist_core::TaskId;

use crate::record::{OperationKind, OperationRecord};

#[derive(Debug, Clone)]
struct LogEntry {
    seq: u64,
    recorded_at: DateTime<Utc>,
    record: OperationRecord,
    dead: bool,
}

/// Where an entry sits relative to the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    Applied,
    Undone,
    Dead,
}

/// A read-only view of one log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// Sequence number, unique for the lifetime of the log.
    pub seq: u64,
    pub kind: OperationKind,
    pub task_id: TaskId,
    pub title: String,
    pub recorded_at: DateTime<Utc>,
    pub state: EntryState,
}

/// Ordered, bounded list of operation records with an undo cursor.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: Vec<LogEntry>,
    cursor: isize,
    capacity: usize,
    next_seq: u64,
}

impl HistoryLog {
    /// Creates an empty log. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        HistoryLog {
            entries: Vec::new(),
            cursor: -1,
            capacity: capacity.max(1),
            next_seq: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Index of the most recently applied entry, `-1` if none.
    pub fn cursor(&self) -> isize {
        self.cursor
    }

    /// Appends `record` after the cursor, discarding any redo branch, and
    /// evicts the oldest entry when over capacity. Returns the entry's
    /// sequence number.
    pub fn record(&mut self, record: OperationRecord) -> u64 {
        self.entries.truncate((self.cursor + 1) as usize);

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(LogEntry {
            seq,
            recorded_at: Utc::now(),
            record,
            dead: false,
        });
        self.cursor = self.entries.len() as isize - 1;

        if self.entries.len() > self.capacity {
            self.entries.remove(0);
            self.cursor -= 1;
        }
        seq
    }

    /// Index of the entry the next undo reverses: the newest live entry at
    /// or below the cursor.
    pub fn undo_index(&self) -> Option<usize> {
        if self.cursor < 0 {
            return None;
        }
        (0..=self.cursor as usize)
            .rev()
            .find(|&i| !self.entries[i].dead)
    }

    /// Index of the entry the next redo reapplies: the oldest live entry
    /// above the cursor.
    pub fn redo_index(&self) -> Option<usize> {
        let start = (self.cursor + 1) as usize;
        (start..self.entries.len()).find(|&i| !self.entries[i].dead)
    }

    pub fn can_undo(&self) -> bool {
        self.undo_index().is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.redo_index().is_some()
    }

    /// Sequence number and record at `index`.
    pub fn get(&self, index: usize) -> Option<(u64, &OperationRecord)> {
        self.entries.get(index).map(|e| (e.seq, &e.record))
    }

    fn position(&self, seq: u64) -> Option<usize> {
        self.entries.iter().position(|e| e.seq == seq)
    }

    /// Moves the cursor below entry `seq` if it is still the next undo.
    /// Returns false when the log changed underneath.
    pub fn commit_undo(&mut self, seq: u64) -> bool {
        match self.position(seq) {
            Some(pos) if self.undo_index() == Some(pos) => {
                self.cursor = pos as isize - 1;
                true
            }
            _ => false,
        }
    }

    /// Moves the cursor onto entry `seq` if it is still the next redo.
    /// Returns false when the log changed underneath.
    pub fn commit_redo(&mut self, seq: u64) -> bool {
        match self.position(seq) {
            Some(pos) if self.redo_index() == Some(pos) => {
                self.cursor = pos as isize;
                true
            }
            _ => false,
        }
    }

    /// Marks entry `seq` dead, if it is still present.
    pub fn mark_dead(&mut self, seq: u64) {
        if let Some(pos) = self.position(seq) {
            self.entries[pos].dead = true;
        }
    }

    /// Points every record that refers to task `from` at `to` instead.
    /// Returns the number of records changed.
    pub fn retarget(&mut self, from: &TaskId, to: &TaskId) -> usize {
        self.entries
            .iter_mut()
            .map(|e| e.record.retarget(from, to))
            .filter(|&changed| changed)
            .count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = -1;
    }

    /// Views of all entries, oldest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| HistoryEntry {
                seq: e.seq,
                kind: e.record.kind(),
                task_id: e.record.task_id().clone(),
                title: e.record.subject().fields.title.clone(),
                recorded_at: e.recorded_at,
                state: if e.dead {
                    EntryState::Dead
                } else if i as isize <= self.cursor {
                    EntryState::Applied
                } else {
                    EntryState::Undone
                },
            })
            .collect()
    }
}
