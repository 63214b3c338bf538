//! Undo scopes and precedence between them.
//!
//! A page can have more than one undo history: a detail view's own history
//! and a page-level one behind it. The manager never falls through to
//! another history on its own; the caller stacks scopes in a
//! [`LayeredScopes`] and the first scope that has something to do wins.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HistoryError;
use crate::manager::HistoryManager;
use crate::shortcut::HistoryAction;

/// Anything that can undo and redo.
#[async_trait]
pub trait UndoScope: Send + Sync {
    fn can_undo(&self) -> bool;

    fn can_redo(&self) -> bool;

    async fn undo(&self) -> Result<(), HistoryError>;

    async fn redo(&self) -> Result<(), HistoryError>;
}

#[async_trait]
impl UndoScope for HistoryManager {
    fn can_undo(&self) -> bool {
        HistoryManager::can_undo(self)
    }

    fn can_redo(&self) -> bool {
        HistoryManager::can_redo(self)
    }

    async fn undo(&self) -> Result<(), HistoryError> {
        HistoryManager::undo(self).await
    }

    async fn redo(&self) -> Result<(), HistoryError> {
        HistoryManager::redo(self).await
    }
}

/// Scopes in precedence order, innermost first.
#[derive(Default, Clone)]
pub struct LayeredScopes {
    scopes: Vec<Arc<dyn UndoScope>>,
}

impl LayeredScopes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `scope` below every scope already present.
    pub fn with(mut self, scope: Arc<dyn UndoScope>) -> Self {
        self.scopes.push(scope);
        self
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub async fn dispatch(&self, action: HistoryAction) -> Result<(), HistoryError> {
        match action {
            HistoryAction::Undo => UndoScope::undo(self).await,
            HistoryAction::Redo => UndoScope::redo(self).await,
        }
    }
}

#[async_trait]
impl UndoScope for LayeredScopes {
    fn can_undo(&self) -> bool {
        self.scopes.iter().any(|s| s.can_undo())
    }

    fn can_redo(&self) -> bool {
        self.scopes.iter().any(|s| s.can_redo())
    }

    async fn undo(&self) -> Result<(), HistoryError> {
        match self.scopes.iter().find(|s| s.can_undo()) {
            Some(scope) => scope.undo().await,
            None => Err(HistoryError::NothingToUndo),
        }
    }

    async fn redo(&self) -> Result<(), HistoryError> {
        match self.scopes.iter().find(|s| s.can_redo()) {
            Some(scope) => scope.redo().await,
            None => Err(HistoryError::NothingToRedo),
        }
    }
}
