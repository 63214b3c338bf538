//! Keyboard shortcut routing.
//!
//! Shortcut handlers must go through the same entry point as the undo/redo
//! buttons, so they only translate a [`KeyChord`] into a [`HistoryAction`]
//! and leave execution to [`HistoryManager::dispatch`](crate::HistoryManager::dispatch).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ShortcutError;

/// What a shortcut or button asks the history to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Undo,
    Redo,
}

/// A key press with its modifier state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyChord {
    /// The key, lowercased (`"z"`, `"y"`, ...).
    pub key: String,
    pub ctrl: bool,
    /// Command on macOS, Windows key elsewhere.
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
    /// The key went to a text field, whose own undo takes over.
    pub in_text_input: bool,
}

impl KeyChord {
    pub fn new(key: impl Into<String>) -> Self {
        KeyChord {
            key: key.into().to_lowercase(),
            ..Default::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn in_text_input(mut self) -> Self {
        self.in_text_input = true;
        self
    }
}

impl FromStr for KeyChord {
    type Err = ShortcutError;

    /// Parses chords like `ctrl+z`, `cmd+shift+z` or `Ctrl+Y`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ShortcutError::Empty);
        }

        let mut parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let key = parts
            .pop()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ShortcutError::MissingKey(s.to_string()))?;

        let mut chord = KeyChord::new(key);
        for modifier in parts {
            match modifier.to_lowercase().as_str() {
                "ctrl" | "control" => chord.ctrl = true,
                "cmd" | "meta" | "super" => chord.meta = true,
                "shift" => chord.shift = true,
                "alt" | "option" => chord.alt = true,
                _ => return Err(ShortcutError::UnknownModifier(modifier.to_string())),
            }
        }
        Ok(chord)
    }
}

impl HistoryAction {
    /// Maps a chord to an action.
    ///
    /// Ctrl/Cmd+Z undoes; Ctrl/Cmd+Shift+Z and Ctrl/Cmd+Y redo. Chords typed
    /// into a text input or held with Alt are left alone.
    pub fn from_chord(chord: &KeyChord) -> Option<Self> {
        if chord.in_text_input || chord.alt || !(chord.ctrl || chord.meta) {
            return None;
        }
        match (chord.key.as_str(), chord.shift) {
            ("z", false) => Some(HistoryAction::Undo),
            ("z", true) | ("y", false) => Some(HistoryAction::Redo),
            _ => None,
        }
    }
}
