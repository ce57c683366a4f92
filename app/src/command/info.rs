use chatdeck_config::{API_KEY_ENV_VARS, Config, mask_secret};
use chatdeck_conversation::{Locale, ModelId};
use chatdeck_providers::DEFAULT_BASE_URL;
use tracing::info;

/// Strategy for displaying configuration information.
///
/// This strategy outputs:
/// - Config file location
/// - API key (masked) and where it came from
/// - Session defaults (model, tokens, temperature, language, system prompt)
/// - Supported models and languages
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        info!("Displaying configuration");

        println!("=== chatdeck Configuration ===\n");

        let path = Config::config_path()?;
        println!("Config file: {}", path.display());
        if !path.exists() {
            println!("  (not found, built-in defaults in use; run 'chatdeck init')");
        }
        println!();

        println!("Provider:");
        match config.api_key() {
            Ok(key) => {
                let from_env = API_KEY_ENV_VARS
                    .iter()
                    .any(|name| std::env::var(name).is_ok_and(|v| !v.trim().is_empty()));
                let source = if from_env { "environment" } else { "config file" };
                println!("  API Key: {} (from {source})", mask_secret(&key));
            }
            Err(_) => println!("  API Key: (not set)"),
        }
        println!(
            "  Base URL: {}",
            config.provider.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
        );
        match config.timeout() {
            Some(timeout) => println!("  Timeout: {}s", timeout.as_secs()),
            None => println!("  Timeout: none"),
        }
        println!();

        println!("Session Defaults:");
        println!("  Model: {}", config.defaults.model);
        println!("  Max Tokens: {}", config.defaults.max_tokens);
        println!("  Temperature: {}", config.defaults.temperature);
        println!("  Language: {}", config.defaults.language);
        if let Some(ref prompt) = config.defaults.system_prompt {
            println!("  System Prompt: {}", truncate(prompt, 60));
        }
        println!();

        println!("Available models:");
        for model in ModelId::ALL {
            println!("  {model}");
        }
        println!("Available languages:");
        for locale in Locale::ALL {
            println!("  {locale} ({})", locale.label());
        }

        Ok(())
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 60), "short");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
        assert_eq!(truncate("ดวงดวงดวง", 6), "ดวง...");
    }
}
