//! The conversation session: configuration plus an ordered list of turns.
//!
//! All reads and writes go through [`ConversationSession`]. Turns are never
//! edited after they are appended; the sequence only grows or is reset as a
//! whole.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use chatdeck_core::{ChatMessage, DispatchRequest, Role};

use crate::config::{ConfigField, ConfigValue, SessionConfig};
use crate::error::{ConversationError, Result};

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    content: String,
    created_at: Option<DateTime<Utc>>,
}

impl Turn {
    pub(crate) const fn restored(
        role: Role,
        content: String,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            role,
            content,
            created_at,
        }
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// `None` only for turns imported without a readable timestamp.
    #[must_use]
    pub const fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    #[must_use]
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// A conversation with its configuration and full turn history.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    /// Process-local identifier for log correlation; not exported.
    id: Uuid,
    config: SessionConfig,
    turns: Vec<Turn>,
}

impl ConversationSession {
    /// Create an empty session with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    #[must_use]
    pub fn with_config(config: SessionConfig) -> Self {
        let session = Self {
            id: Uuid::now_v7(),
            config,
            turns: Vec::new(),
        };
        debug!(
            "Created session {} ({})",
            session.id,
            session.config.session_name()
        );
        session
    }

    pub(crate) fn from_parts(config: SessionConfig, turns: Vec<Turn>) -> Self {
        Self {
            id: Uuid::now_v7(),
            config,
            turns,
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub const fn turn_count(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append a turn stamped with the current time.
    ///
    /// User turns must contain something other than whitespace. Assistant
    /// turns are stored as given.
    pub fn append_turn(&mut self, role: Role, content: impl Into<String>) -> Result<Turn> {
        let content = content.into();
        if role == Role::User && content.trim().is_empty() {
            return Err(ConversationError::InvalidInput);
        }

        let turn = Turn {
            role,
            content,
            created_at: Some(self.next_timestamp()),
        };
        self.turns.push(turn.clone());
        debug!(
            "Session {}: appended {} turn #{}",
            self.id,
            role,
            self.turns.len()
        );

        Ok(turn)
    }

    /// Drop every turn and start over under a freshly derived name.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.config.regenerate_session_name();
        info!(
            "Session {} cleared, now named {}",
            self.id,
            self.config.session_name()
        );
    }

    /// Validate and store one configuration field.
    pub fn set_config_field(&mut self, field: ConfigField, value: ConfigValue) -> Result<ConfigValue> {
        let accepted = self.config.set(field, value)?;
        debug!("Session {}: {field} = {accepted}", self.id);
        Ok(accepted)
    }


    /// Everything the dispatcher needs for the next reply.
    #[must_use]
    pub fn dispatch_request(&self) -> DispatchRequest {
        DispatchRequest {
            messages: self.turns.iter().map(Turn::to_chat_message).collect(),
            system_instruction: self.config.system_instruction().to_string(),
            model: self.config.model_id().as_str().to_string(),
            temperature: self.config.temperature(),
            max_output_tokens: self.config.max_output_tokens(),
        }
    }

    /// Now, but never earlier than the newest timestamp already recorded.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        self.turns
            .iter()
            .rev()
            .find_map(|t| t.created_at)
            .map_or(now, |last| last.max(now))
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_call_order() {
        let mut session = ConversationSession::new();
        assert!(session.is_empty());

        for i in 0..5 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert!(session.append_turn(role, format!("message {i}")).is_ok());
        }

        assert_eq!(session.turn_count(), 5);
        let contents: Vec<&str> = session.turns().iter().map(Turn::content).collect();
        assert_eq!(
            contents,
            ["message 0", "message 1", "message 2", "message 3", "message 4"]
        );
    }

    #[test]
    fn blank_user_turns_are_refused() {
        let mut session = ConversationSession::new();

        assert!(matches!(
            session.append_turn(Role::User, ""),
            Err(ConversationError::InvalidInput)
        ));
        assert!(matches!(
            session.append_turn(Role::User, "   "),
            Err(ConversationError::InvalidInput)
        ));
        assert_eq!(session.turn_count(), 0);
    }

    #[test]
    fn assistant_turns_may_be_empty() {
        let mut session = ConversationSession::new();
        assert!(session.append_turn(Role::Assistant, "").is_ok());
        assert_eq!(session.turn_count(), 1);
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let mut session = ConversationSession::new();
        for _ in 0..20 {
            assert!(session.append_turn(Role::User, "tick").is_ok());
        }

        let stamps: Vec<_> = session
            .turns()
            .iter()
            .filter_map(Turn::created_at)
            .collect();
        assert_eq!(stamps.len(), 20);
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn clear_resets_turns_and_name_only() {
        let mut session = ConversationSession::new();
        assert!(session
            .set_config_field(ConfigField::SessionName, ConfigValue::Text("old".to_string()))
            .is_ok());
        assert!(session
            .set_config_field(ConfigField::Temperature, ConfigValue::Number(0.2))
            .is_ok());
        assert!(session.append_turn(Role::User, "hello").is_ok());

        session.clear();

        assert!(session.is_empty());
        assert_ne!(session.config().session_name(), "old");
        assert!(session.config().session_name().starts_with("chat_"));
        assert!((session.config().temperature() - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn dispatch_request_carries_config() {
        let mut session = ConversationSession::new();
        assert!(session
            .set_config_field(
                ConfigField::SystemInstruction,
                ConfigValue::Text("Answer in Thai.".to_string())
            )
            .is_ok());
        assert!(session.append_turn(Role::User, "hello").is_ok());
        assert!(session.append_turn(Role::Assistant, "hi there").is_ok());

        let request = session.dispatch_request();
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1].role, Role::Assistant);
        assert_eq!(request.system_instruction, "Answer in Thai.");
        assert_eq!(request.model, "gemini-1.5-flash");
        assert_eq!(request.max_output_tokens, 2048);
    }
}
