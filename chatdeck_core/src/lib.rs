#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub mod reply;
pub mod util;

pub use reply::{CannedDispatcher, ReplyBook, ReplyRule};
pub use util::estimate_token_count;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Parse the wire name of a role. Anything other than `user` or
    /// `assistant` is not a conversation role.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Everything a dispatcher needs to produce the next assistant reply.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    pub messages: Vec<ChatMessage>,
    pub system_instruction: String,
    pub model: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl DispatchRequest {
    /// The most recent user-authored message, if any.
    #[must_use]
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("quota exceeded: {0}")]
    Quota(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Sends a conversation to a text-generation backend and returns the reply.
///
/// Implementations must not retry on their own; a failure is reported once
/// and the caller decides what to surface.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, request: &DispatchRequest) -> Result<String, DispatchError>;

    /// Short label used in logs and the `info` command.
    fn name(&self) -> &str;
}

#[async_trait]
impl<D: Dispatcher + ?Sized> Dispatcher for std::sync::Arc<D> {
    async fn dispatch(&self, request: &DispatchRequest) -> Result<String, DispatchError> {
        (**self).dispatch(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_wire_names() {
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("assistant"), Some(Role::Assistant));
        assert_eq!(Role::parse("system"), None);
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn last_user_message_skips_assistant_turns() {
        let request = DispatchRequest {
            messages: vec![
                ChatMessage {
                    role: Role::User,
                    content: "first".to_string(),
                },
                ChatMessage {
                    role: Role::Assistant,
                    content: "reply".to_string(),
                },
                ChatMessage {
                    role: Role::User,
                    content: "second".to_string(),
                },
                ChatMessage {
                    role: Role::Assistant,
                    content: "another".to_string(),
                },
            ],
            system_instruction: String::new(),
            model: "m".to_string(),
            temperature: 0.5,
            max_output_tokens: 256,
        };

        assert_eq!(request.last_user_message(), Some("second"));
    }
}
