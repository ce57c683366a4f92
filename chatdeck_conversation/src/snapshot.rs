//! Export and import of a whole session as a JSON snapshot.
//!
//! Export is strict and deterministic for a given `exported_at`. Import is
//! lenient: only text that is not JSON at all (or JSON that is not an object)
//! is refused. Every other gap is filled with a default and reported as a
//! [`SnapshotWarning`].

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

use chatdeck_core::Role;

use crate::config::{
    DEFAULT_OUTPUT_TOKENS, DEFAULT_TEMPERATURE, Locale, ModelId, SessionConfig, clamp_output_tokens,
    clamp_temperature, derive_session_name,
};
use crate::error::{ConversationError, Result};
use crate::session::{ConversationSession, Turn};

/// Serializable record of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub conversation_name: String,
    pub language: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub system_prompt: String,
    pub exported_at: String,
    pub messages: Vec<SnapshotMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: Option<String>,
}

impl Snapshot {
    /// Pretty JSON with non-ASCII text written as-is.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConversationError::MalformedSnapshot(e.to_string()))
    }

    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| ConversationError::MalformedSnapshot(e.to_string()))
    }
}

/// Something the importer had to default, clamp or skip.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotWarning {
    MissingField(&'static str),
    InvalidField { field: &'static str, found: String },
    Clamped { field: &'static str, found: String, stored: String },
    SkippedMessage { index: usize, reason: String },
    UnreadableTimestamp { index: usize },
}

impl fmt::Display for SnapshotWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "'{field}' missing, using default"),
            Self::InvalidField { field, found } => {
                write!(f, "'{field}' has unusable value {found}, using default")
            }
            Self::Clamped {
                field,
                found,
                stored,
            } => write!(f, "'{field}' value {found} out of range, stored {stored}"),
            Self::SkippedMessage { index, reason } => {
                write!(f, "message #{index} skipped: {reason}")
            }
            Self::UnreadableTimestamp { index } => {
                write!(f, "message #{index} has no readable timestamp")
            }
        }
    }
}

/// A session decoded from a snapshot together with what was patched up.
#[derive(Debug, Clone)]
pub struct ImportedSession {
    pub session: ConversationSession,
    pub warnings: Vec<SnapshotWarning>,
}

impl ConversationSession {
    /// Snapshot stamped with the current time.
    #[must_use]
    pub fn to_snapshot(&self) -> Snapshot {
        self.snapshot_at(Utc::now())
    }

    /// Snapshot stamped with `exported_at`. Same state, same output.
    #[must_use]
    pub fn snapshot_at(&self, exported_at: DateTime<Utc>) -> Snapshot {
        let config = self.config();
        Snapshot {
            conversation_name: config.session_name().to_string(),
            language: config.display_language().code().to_string(),
            model: config.model_id().as_str().to_string(),
            temperature: config.temperature(),
            max_tokens: config.max_output_tokens(),
            system_prompt: config.system_instruction().to_string(),
            exported_at: format_timestamp(exported_at),
            messages: self
                .turns()
                .iter()
                .map(|turn| SnapshotMessage {
                    role: turn.role(),
                    content: turn.content().to_string(),
                    timestamp: turn.created_at().map(format_timestamp),
                })
                .collect(),
        }
    }

    /// Rebuild a session from a decoded snapshot record.
    pub fn from_snapshot(record: &Value) -> Result<Self> {
        Self::from_snapshot_with_warnings(record).map(|imported| imported.session)
    }

    /// Parse snapshot text and rebuild the session from it.
    pub fn from_snapshot_str(text: &str) -> Result<Self> {
        Self::import_snapshot_str(text).map(|imported| imported.session)
    }

    /// Like [`Self::from_snapshot_str`], also returning the import warnings.
    ///
    /// Numbers JSON cannot hold as `f64` (such as `1e400`) fail parsing, so
    /// the whole text is malformed rather than clamped.
    pub fn import_snapshot_str(text: &str) -> Result<ImportedSession> {
        let record: Value = serde_json::from_str(text)
            .map_err(|e| ConversationError::MalformedSnapshot(e.to_string()))?;
        Self::from_snapshot_with_warnings(&record)
    }

    /// Rebuild a session, reporting every field that fell back to a default.
    pub fn from_snapshot_with_warnings(record: &Value) -> Result<ImportedSession> {
        let object = record.as_object().ok_or_else(|| {
            ConversationError::MalformedSnapshot(format!(
                "expected a JSON object, found {}",
                kind_of(record)
            ))
        })?;

        let mut warnings = Vec::new();
        let config = decode_config(object, &mut warnings);
        let turns = decode_turns(object, &mut warnings);

        for warning in &warnings {
            debug!("Snapshot import: {warning}");
        }

        Ok(ImportedSession {
            session: Self::from_parts(config, turns),
            warnings,
        })
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// RFC 3339, or an offset-less ISO-8601 date-time taken as UTC.
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Present and non-null.
fn field<'a>(
    object: &'a Map<String, Value>,
    name: &'static str,
    warnings: &mut Vec<SnapshotWarning>,
) -> Option<&'a Value> {
    match object.get(name) {
        None | Some(Value::Null) => {
            warnings.push(SnapshotWarning::MissingField(name));
            None
        }
        Some(value) => Some(value),
    }
}

fn invalid(field: &'static str, found: &Value) -> SnapshotWarning {
    SnapshotWarning::InvalidField {
        field,
        found: found.to_string(),
    }
}

fn decode_config(object: &Map<String, Value>, warnings: &mut Vec<SnapshotWarning>) -> SessionConfig {
    let session_name = match field(object, "conversation_name", warnings) {
        Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
        Some(other) => {
            warnings.push(invalid("conversation_name", other));
            derive_session_name()
        }
        None => derive_session_name(),
    };

    let display_language = match field(object, "language", warnings) {
        Some(value) => match value.as_str().and_then(Locale::parse) {
            Some(locale) => locale,
            None => {
                warnings.push(invalid("language", value));
                Locale::default()
            }
        },
        None => Locale::default(),
    };

    let model_id = match field(object, "model", warnings) {
        Some(value) => match value.as_str().and_then(ModelId::parse) {
            Some(model) => model,
            None => {
                warnings.push(invalid("model", value));
                ModelId::default()
            }
        },
        None => ModelId::default(),
    };

    let temperature = match field(object, "temperature", warnings) {
        Some(value) => match value.as_f64() {
            Some(found) => {
                let stored = clamp_temperature(found);
                if (stored - found).abs() > f64::EPSILON {
                    warnings.push(SnapshotWarning::Clamped {
                        field: "temperature",
                        found: found.to_string(),
                        stored: stored.to_string(),
                    });
                }
                stored
            }
            None => {
                warnings.push(invalid("temperature", value));
                DEFAULT_TEMPERATURE
            }
        },
        None => DEFAULT_TEMPERATURE,
    };

    let max_output_tokens = match field(object, "max_tokens", warnings) {
        Some(value) => match value.as_f64() {
            Some(found) => {
                let stored = clamp_output_tokens(found);
                if (f64::from(stored) - found).abs() > f64::EPSILON {
                    warnings.push(SnapshotWarning::Clamped {
                        field: "max_tokens",
                        found: value.to_string(),
                        stored: stored.to_string(),
                    });
                }
                stored
            }
            None => {
                warnings.push(invalid("max_tokens", value));
                DEFAULT_OUTPUT_TOKENS
            }
        },
        None => DEFAULT_OUTPUT_TOKENS,
    };

    let system_instruction = match field(object, "system_prompt", warnings) {
        Some(Value::String(text)) => text.clone(),
        Some(other) => {
            warnings.push(invalid("system_prompt", other));
            String::new()
        }
        None => String::new(),
    };

    SessionConfig::restore(
        model_id,
        temperature,
        max_output_tokens,
        system_instruction,
        display_language,
        session_name,
    )
}

fn decode_turns(object: &Map<String, Value>, warnings: &mut Vec<SnapshotWarning>) -> Vec<Turn> {
    let entries = match field(object, "messages", warnings) {
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            warnings.push(invalid("messages", other));
            return Vec::new();
        }
        None => return Vec::new(),
    };

    let mut turns = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match decode_turn(index, entry, warnings) {
            Ok(turn) => turns.push(turn),
            Err(reason) => warnings.push(SnapshotWarning::SkippedMessage { index, reason }),
        }
    }
    turns
}

fn decode_turn(
    index: usize,
    entry: &Value,
    warnings: &mut Vec<SnapshotWarning>,
) -> std::result::Result<Turn, String> {
    let Some(message) = entry.as_object() else {
        return Err(format!("expected an object, found {}", kind_of(entry)));
    };

    let role = match message.get("role") {
        Some(Value::String(name)) => {
            Role::parse(name).ok_or_else(|| format!("unknown role '{name}'"))?
        }
        _ => return Err("missing role".to_string()),
    };

    let content = match message.get("content") {
        Some(Value::String(text)) => text.clone(),
        _ => return Err("missing content".to_string()),
    };

    if role == Role::User && content.trim().is_empty() {
        return Err("blank user message".to_string());
    }

    let created_at = match message.get("timestamp") {
        Some(Value::String(text)) => {
            let parsed = parse_timestamp(text);
            if parsed.is_none() {
                warnings.push(SnapshotWarning::UnreadableTimestamp { index });
            }
            parsed
        }
        None | Some(Value::Null) => None,
        Some(_) => {
            warnings.push(SnapshotWarning::UnreadableTimestamp { index });
            None
        }
    };

    Ok(Turn::restored(role, content, created_at))
}
