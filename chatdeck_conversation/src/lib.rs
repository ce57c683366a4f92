#![warn(
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

//! Conversation state for the chat front end.
//!
//! A [`ConversationSession`] owns one conversation: its [`SessionConfig`]
//! and the ordered [`Turn`]s exchanged so far. It is the only way to read
//! or change that state, and it round-trips through a JSON [`Snapshot`].
//! [`SessionContext`] pairs a session with a dispatcher and runs the
//! interactive loop.
//!
//! # Key Features
//! - Validated configuration with a fixed model allow-list and locale set
//! - Lenient snapshot import that reports every defaulted field
//! - Display-only token estimates and history statistics

mod command;
mod config;
mod context;
mod error;
mod history;
mod session;
mod snapshot;

pub use command::ReplCommand;
pub use config::{
    ConfigField, ConfigValue, DEFAULT_OUTPUT_TOKENS, DEFAULT_TEMPERATURE, Locale,
    MAX_OUTPUT_TOKENS, MAX_TEMPERATURE, MIN_OUTPUT_TOKENS, MIN_TEMPERATURE, ModelId,
    SessionConfig, derive_session_name,
};
pub use context::SessionContext;
pub use error::{ConversationError, Result};
pub use history::HistoryStats;
pub use session::{ConversationSession, Turn};
pub use snapshot::{ImportedSession, Snapshot, SnapshotMessage, SnapshotWarning};
