//! Per-session configuration and its validation rules.
//!
//! Every field has a fixed domain. [`SessionConfig::set`] refuses values
//! outside it and leaves the config untouched; snapshot import goes through
//! the clamping helpers instead so that old or hand-edited files still load.

use chrono::Local;
use std::fmt;

use crate::error::{ConversationError, Result};

pub const MIN_TEMPERATURE: f64 = 0.0;
pub const MAX_TEMPERATURE: f64 = 1.0;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

pub const MIN_OUTPUT_TOKENS: u32 = 256;
pub const MAX_OUTPUT_TOKENS: u32 = 4096;
pub const DEFAULT_OUTPUT_TOKENS: u32 = 2048;

/// Models a session may talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ModelId {
    #[default]
    Gemini15Flash,
    Gemini15Pro,
    Gemini10Pro,
}

impl ModelId {
    pub const ALL: [Self; 3] = [Self::Gemini15Flash, Self::Gemini15Pro, Self::Gemini10Pro];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gemini15Flash => "gemini-1.5-flash",
            Self::Gemini15Pro => "gemini-1.5-pro",
            Self::Gemini10Pro => "gemini-1.0-pro",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == value)
    }

    fn allowed() -> String {
        Self::ALL.map(Self::as_str).join(", ")
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display languages the front end ships labels for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Locale {
    Thai,
    #[default]
    English,
    Chinese,
}

impl Locale {
    pub const ALL: [Self; 3] = [Self::Thai, Self::English, Self::Chinese];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Thai => "th",
            Self::English => "en",
            Self::Chinese => "zh",
        }
    }

    /// Native name shown in the language selector.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Thai => "ไทย",
            Self::English => "English",
            Self::Chinese => "中文",
        }
    }

    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == code)
    }

    fn allowed() -> String {
        Self::ALL.map(Self::code).join(", ")
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Names of the configurable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    Model,
    Temperature,
    MaxOutputTokens,
    SystemInstruction,
    DisplayLanguage,
    SessionName,
}

impl ConfigField {
    pub const ALL: [Self; 6] = [
        Self::Model,
        Self::Temperature,
        Self::MaxOutputTokens,
        Self::SystemInstruction,
        Self::DisplayLanguage,
        Self::SessionName,
    ];

    /// Name used in snapshots and on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Temperature => "temperature",
            Self::MaxOutputTokens => "max_tokens",
            Self::SystemInstruction => "system_prompt",
            Self::DisplayLanguage => "language",
            Self::SessionName => "session_name",
        }
    }

    /// Accepts the short name or the long alias.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "model" | "model_id" => Some(Self::Model),
            "temperature" => Some(Self::Temperature),
            "max_tokens" | "max_output_tokens" => Some(Self::MaxOutputTokens),
            "system_prompt" | "system_instruction" => Some(Self::SystemInstruction),
            "language" | "display_language" => Some(Self::DisplayLanguage),
            "session_name" | "name" | "conversation_name" => Some(Self::SessionName),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value offered to, or accepted by, a config field.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Text(String),
    Number(f64),
    Integer(i64),
}

impl ConfigValue {
    /// Parse raw command-line text into the value type `field` expects.
    pub fn parse(field: ConfigField, raw: &str) -> Result<Self> {
        match field {
            ConfigField::Temperature => raw.trim().parse::<f64>().map(Self::Number).map_err(|e| {
                ConversationError::invalid_config(field, format!("'{raw}' is not a number: {e}"))
            }),
            ConfigField::MaxOutputTokens => {
                raw.trim().parse::<i64>().map(Self::Integer).map_err(|e| {
                    ConversationError::invalid_config(
                        field,
                        format!("'{raw}' is not an integer: {e}"),
                    )
                })
            }
            ConfigField::Model
            | ConfigField::SystemInstruction
            | ConfigField::DisplayLanguage
            | ConfigField::SessionName => Ok(Self::Text(raw.to_string())),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Integer(i) => write!(f, "{i}"),
        }
    }
}

/// Session name derived from the local wall clock, e.g. `chat_20261019_142305`.
#[must_use]
pub fn derive_session_name() -> String {
    Local::now().format("chat_%Y%m%d_%H%M%S").to_string()
}

/// Mutable settings of one conversation, independent of its turns.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    model_id: ModelId,
    temperature: f64,
    max_output_tokens: u32,
    system_instruction: String,
    display_language: Locale,
    session_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model_id: ModelId::default(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_OUTPUT_TOKENS,
            system_instruction: String::new(),
            display_language: Locale::default(),
            session_name: derive_session_name(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub const fn model_id(&self) -> ModelId {
        self.model_id
    }

    #[must_use]
    pub const fn temperature(&self) -> f64 {
        self.temperature
    }

    #[must_use]
    pub const fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    #[must_use]
    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    #[must_use]
    pub const fn display_language(&self) -> Locale {
        self.display_language
    }

    #[must_use]
    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// Current value of `field`.
    #[must_use]
    pub fn get(&self, field: ConfigField) -> ConfigValue {
        match field {
            ConfigField::Model => ConfigValue::Text(self.model_id.as_str().to_string()),
            ConfigField::Temperature => ConfigValue::Number(self.temperature),
            ConfigField::MaxOutputTokens => {
                ConfigValue::Integer(i64::from(self.max_output_tokens))
            }
            ConfigField::SystemInstruction => ConfigValue::Text(self.system_instruction.clone()),
            ConfigField::DisplayLanguage => {
                ConfigValue::Text(self.display_language.code().to_string())
            }
            ConfigField::SessionName => ConfigValue::Text(self.session_name.clone()),
        }
    }

    /// Validate `value` against the domain of `field` and store it.
    ///
    /// Out-of-range numbers, unknown models and unknown locales are refused;
    /// nothing is clamped here. Returns the value as stored.
    pub fn set(&mut self, field: ConfigField, value: ConfigValue) -> Result<ConfigValue> {
        match (field, value) {
            (ConfigField::Model, ConfigValue::Text(id)) => {
                let model = ModelId::parse(id.trim()).ok_or_else(|| {
                    ConversationError::invalid_config(
                        field,
                        format!("unknown model '{id}', expected one of: {}", ModelId::allowed()),
                    )
                })?;
                self.model_id = model;
            }
            (ConfigField::Temperature, ConfigValue::Number(t)) => {
                self.temperature = validate_temperature(t)?;
            }
            (ConfigField::Temperature, ConfigValue::Integer(t)) => {
                let t = i32::try_from(t).map_or(f64::INFINITY, f64::from);
                self.temperature = validate_temperature(t)?;
            }
            (ConfigField::MaxOutputTokens, ConfigValue::Integer(n)) => {
                self.max_output_tokens = validate_output_tokens(n)?;
            }
            (ConfigField::SystemInstruction, ConfigValue::Text(text)) => {
                self.system_instruction = text;
            }
            (ConfigField::DisplayLanguage, ConfigValue::Text(code)) => {
                let locale = Locale::parse(code.trim()).ok_or_else(|| {
                    ConversationError::invalid_config(
                        field,
                        format!("unsupported language '{code}', expected one of: {}", Locale::allowed()),
                    )
                })?;
                self.display_language = locale;
            }
            (ConfigField::SessionName, ConfigValue::Text(name)) => {
                if name.trim().is_empty() {
                    return Err(ConversationError::invalid_config(
                        field,
                        "session name must not be blank",
                    ));
                }
                self.session_name = name;
            }
            (field, value) => {
                return Err(ConversationError::invalid_config(
                    field,
                    format!("value '{value}' has the wrong type"),
                ));
            }
        }

        Ok(self.get(field))
    }

    pub(crate) fn regenerate_session_name(&mut self) {
        self.session_name = derive_session_name();
    }

    pub(crate) const fn restore(
        model_id: ModelId,
        temperature: f64,
        max_output_tokens: u32,
        system_instruction: String,
        display_language: Locale,
        session_name: String,
    ) -> Self {
        Self {
            model_id,
            temperature,
            max_output_tokens,
            system_instruction,
            display_language,
            session_name,
        }
    }
}

fn validate_temperature(value: f64) -> Result<f64> {
    if value.is_finite() && (MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&value) {
        Ok(value)
    } else {
        Err(ConversationError::invalid_config(
            ConfigField::Temperature,
            format!("{value} is outside [{MIN_TEMPERATURE}, {MAX_TEMPERATURE}]"),
        ))
    }
}

fn validate_output_tokens(value: i64) -> Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|n| (MIN_OUTPUT_TOKENS..=MAX_OUTPUT_TOKENS).contains(n))
        .ok_or_else(|| {
            ConversationError::invalid_config(
                ConfigField::MaxOutputTokens,
                format!("{value} is outside [{MIN_OUTPUT_TOKENS}, {MAX_OUTPUT_TOKENS}]"),
            )
        })
}

/// Pull a temperature into range. Non-finite input yields the default.
pub(crate) fn clamp_temperature(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE)
    } else {
        DEFAULT_TEMPERATURE
    }
}

/// Round and pull a token budget into range. Non-finite input yields the default.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is clamped to [256, 4096] before the cast"
)]
pub(crate) fn clamp_output_tokens(value: f64) -> u32 {
    if value.is_finite() {
        value
            .round()
            .clamp(f64::from(MIN_OUTPUT_TOKENS), f64::from(MAX_OUTPUT_TOKENS)) as u32
    } else {
        DEFAULT_OUTPUT_TOKENS
    }
}
