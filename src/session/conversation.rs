//! Append-only conversation log.

use crate::models::{ConversationTurn, Role};

/// Ordered log of turns for one session.
///
/// Turns are never edited or removed one by one; the only removal is
/// [`Conversation::clear`], which dismisses the whole log.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn.
    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recent assistant turn, if any.
    pub fn last_assistant(&self) -> Option<&ConversationTurn> {
        self.turns.iter().rev().find(|t| t.role == Role::Assistant)
    }

    /// Dismisses the whole log.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
