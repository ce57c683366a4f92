use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use chatdeck_conversation::{DEFAULT_OUTPUT_TOKENS, DEFAULT_TEMPERATURE, Locale, ModelId};
use chatdeck_core::util::DEFAULT_SYSTEM_INSTRUCTION;

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["CHATDECK_API_KEY", "GEMINI_API_KEY"];

const API_KEY_PLACEHOLDER: &str = "your-gemini-api-key-here";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: SessionDefaults,
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Initial settings for every new session.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionDefaults {
    #[serde(default = "SessionDefaults::default_model")]
    pub model: String,
    #[serde(default = "SessionDefaults::default_temperature")]
    pub temperature: f64,
    #[serde(default = "SessionDefaults::default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default = "SessionDefaults::default_language")]
    pub language: String,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            model: Self::default_model(),
            temperature: Self::default_temperature(),
            max_tokens: Self::default_max_tokens(),
            system_prompt: None,
            language: Self::default_language(),
        }
    }
}

impl SessionDefaults {
    fn default_model() -> String {
        ModelId::default().as_str().to_string()
    }

    const fn default_temperature() -> f64 {
        DEFAULT_TEMPERATURE
    }

    const fn default_max_tokens() -> u32 {
        DEFAULT_OUTPUT_TOKENS
    }

    fn default_language() -> String {
        Locale::default().code().to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("chatdeck"))
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load `~/chatdeck/config.json`, or built-in defaults when it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {e}", path.display()))?;
        info!("Loaded config from {}", path.display());

        Ok(config)
    }

    /// Resolve the dispatcher credential from the environment or the file.
    pub fn api_key(&self) -> anyhow::Result<String> {
        self.api_key_with(|name| std::env::var(name).ok())
    }

    fn api_key_with(&self, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<String> {
        if let Some(key) = API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| env(name))
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
        {
            return Ok(key);
        }

        let key = self.provider.api_key.trim();
        if key.is_empty() || key == API_KEY_PLACEHOLDER {
            anyhow::bail!(
                "No API key configured. Set {} or add provider.api_key to the config file (run 'chatdeck init').",
                API_KEY_ENV_VARS.join(" or ")
            );
        }

        Ok(key.to_string())
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.provider
            .timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        std::fs::write(&config_path, Self::template()?)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Edit the config file and add your Gemini API key");
        println!("      (or export CHATDECK_API_KEY instead)");
        println!("   2. Run 'chatdeck chat' to start a conversation");
        println!();
        println!("🔧 Configuration options:");
        println!("   - model: gemini-1.5-flash, gemini-1.5-pro or gemini-1.0-pro");
        println!("   - temperature: 0.0 to 1.0");
        println!("   - max_tokens: 256 to 4096");
        println!("   - language: th, en or zh");
        println!("   - timeout_secs: give up on a reply after this many seconds");
        println!();
        Ok(())
    }

    fn template() -> anyhow::Result<String> {
        let template = Self {
            defaults: SessionDefaults {
                system_prompt: Some(DEFAULT_SYSTEM_INSTRUCTION.to_string()),
                ..SessionDefaults::default()
            },
            provider: ProviderConfig {
                api_key: API_KEY_PLACEHOLDER.to_string(),
                base_url: None,
                timeout_secs: Some(60),
            },
        };
        Ok(serde_json::to_string_pretty(&template)?)
    }
}

/// Keep the first and last four characters of a secret.
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}
