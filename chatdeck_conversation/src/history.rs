//! Conversation history statistics shown alongside the chat.

use chatdeck_core::{Role, estimate_token_count};

use crate::session::{ConversationSession, Turn};

/// Statistics about conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryStats {
    pub total_turns: usize,
    pub user_turns: usize,
    pub assistant_turns: usize,
    pub total_characters: usize,
    /// Display-only estimate, see [`estimate_token_count`].
    pub estimated_tokens: usize,
}

impl HistoryStats {
    #[must_use]
    pub fn from_turns(turns: &[Turn]) -> Self {
        turns.iter().fold(Self::default(), |mut stats, turn| {
            stats.total_turns += 1;
            match turn.role() {
                Role::User => stats.user_turns += 1,
                Role::Assistant => stats.assistant_turns += 1,
            }
            stats.total_characters += turn.content().chars().count();
            stats.estimated_tokens += estimate_token_count(turn.content());
            stats
        })
    }
}

impl ConversationSession {
    #[must_use]
    pub fn stats(&self) -> HistoryStats {
        HistoryStats::from_turns(self.turns())
    }
}
