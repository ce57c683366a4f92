use chatdeck_core::DispatchError;
use thiserror::Error;

use crate::config::ConfigField;

pub type Result<T> = std::result::Result<T, ConversationError>;

/// Errors raised while reading or mutating a conversation.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("Message must not be empty")]
    InvalidInput,

    #[error("Invalid value for {field}: {reason}")]
    InvalidConfig { field: ConfigField, reason: String },

    #[error("Snapshot is not valid structured data: {0}")]
    MalformedSnapshot(String),

    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Empty reply from dispatcher")]
    EmptyReply,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConversationError {
    pub(crate) fn invalid_config(field: ConfigField, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
