//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy with its own input type, so the
//! dispatch in `main` is resolved at compile time.

use chatdeck_config::Config;
use chatdeck_conversation::{ConfigField, ConfigValue, SessionConfig, SessionContext};
use chatdeck_core::Dispatcher;
use tracing::info;

mod chat;
mod info;
mod init;
mod reply;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use reply::{ReplyInput, ReplyStrategy};
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
///
/// # Example
/// ```rust,ignore
/// struct MyStrategy;
///
/// impl CommandStrategy for MyStrategy {
///     type Input = MyInput;
///
///     async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
///         // Command logic here
///         Ok(())
///     }
/// }
/// ```
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Build the starting session settings from the config file defaults.
///
/// Every default goes through the same validation as an interactive
/// `/set`, so a bad config file fails at startup instead of mid-chat.
fn build_session_config(config: &Config) -> anyhow::Result<SessionConfig> {
    let defaults = &config.defaults;
    let mut session_config = SessionConfig::default();

    let values = [
        (ConfigField::Model, ConfigValue::Text(defaults.model.clone())),
        (
            ConfigField::Temperature,
            ConfigValue::Number(defaults.temperature),
        ),
        (
            ConfigField::MaxOutputTokens,
            ConfigValue::Integer(i64::from(defaults.max_tokens)),
        ),
        (
            ConfigField::DisplayLanguage,
            ConfigValue::Text(defaults.language.clone()),
        ),
        (
            ConfigField::SystemInstruction,
            ConfigValue::Text(defaults.system_prompt.clone().unwrap_or_default()),
        ),
    ];

    for (field, value) in values {
        session_config
            .set(field, value)
            .map_err(|e| anyhow::anyhow!("Invalid default in config file: {e}"))?;
    }

    info!(
        "Session defaults: model={}, temperature={}, max_tokens={}, language={}",
        session_config.model_id(),
        session_config.temperature(),
        session_config.max_output_tokens(),
        session_config.display_language()
    );

    Ok(session_config)
}

/// Apply command-line overrides on top of whatever the session holds.
fn apply_overrides<D: Dispatcher>(
    context: &mut SessionContext<D>,
    overrides: &[(ConfigField, Option<&str>)],
) -> anyhow::Result<()> {
    for (field, raw) in overrides {
        if let Some(raw) = raw {
            context.set_from_str(*field, raw)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatdeck_conversation::{Locale, ModelId};

    #[test]
    fn defaults_become_session_config() {
        let mut config = Config::default();
        config.defaults.model = "gemini-1.0-pro".to_string();
        config.defaults.language = "zh".to_string();
        config.defaults.system_prompt = Some("Be brief.".to_string());

        let session_config = build_session_config(&config);

        assert!(matches!(
            session_config,
            Ok(ref c) if c.model_id() == ModelId::Gemini10Pro
                && c.display_language() == Locale::Chinese
                && c.system_instruction() == "Be brief."
        ));
    }

    #[test]
    fn out_of_range_default_is_fatal() {
        let mut config = Config::default();
        config.defaults.max_tokens = 10_000;

        assert!(build_session_config(&config).is_err());
    }
}
