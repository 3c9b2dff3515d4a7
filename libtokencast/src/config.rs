//! Configuration management for Tokencast
//!
//! Credentials are never stored in the config file; each section names the
//! environment variable the secret is read from, matching how the deployed
//! agent is provisioned.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub model: ModelConfig,
    pub twitter: Option<TwitterConfig>,
    pub telegram: Option<TelegramConfig>,
    pub discord: Option<DiscordConfig>,
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Language-model endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_base_url")]
    pub base_url: String,
    #[serde(default = "default_model_name")]
    pub model: String,
    #[serde(default = "default_model_key_env")]
    pub api_key_env: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_model_base_url(),
            model: default_model_name(),
            api_key_env: default_model_key_env(),
        }
    }
}

fn default_model_base_url() -> String {
    "https://api.x.ai/v1".to_string()
}

fn default_model_name() -> String {
    "grok-2".to_string()
}

fn default_model_key_env() -> String {
    "XAI_API_KEY".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    pub enabled: bool,
    #[serde(default = "default_twitter_token_env")]
    pub bearer_token_env: String,
}

fn default_twitter_token_env() -> String {
    "TWITTER_BEARER_TOKEN".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub enabled: bool,
    #[serde(default = "default_telegram_token_env")]
    pub bot_token_env: String,
    pub chat_id: String,
}

fn default_telegram_token_env() -> String {
    "TELEGRAM_BOT_TOKEN".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub enabled: bool,
    #[serde(default = "default_discord_token_env")]
    pub bot_token_env: String,
    pub channel_id: Option<String>,
    /// When false (the default), an uninitialized Discord client makes
    /// posting a silent no-op instead of an error.
    #[serde(default)]
    pub strict: bool,
}

fn default_discord_token_env() -> String {
    "DISCORD_BOT_TOKEN".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    pub platforms: Vec<String>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            database: DatabaseConfig {
                path: "~/.local/share/tokencast/tokencast.db".to_string(),
            },
            model: ModelConfig::default(),
            twitter: Some(TwitterConfig {
                enabled: true,
                bearer_token_env: default_twitter_token_env(),
            }),
            telegram: Some(TelegramConfig {
                enabled: true,
                bot_token_env: default_telegram_token_env(),
                chat_id: String::new(),
            }),
            discord: Some(DiscordConfig {
                enabled: false,
                bot_token_env: default_discord_token_env(),
                channel_id: None,
                strict: false,
            }),
            defaults: DefaultsConfig {
                platforms: vec!["twitter".to_string()],
            },
        }
    }
}

/// Read a secret from the environment variable named by `env_name`.
/// Empty values count as missing.
pub fn secret_from_env(env_name: &str) -> Option<SecretString> {
    match std::env::var(env_name) {
        Ok(value) if !value.trim().is_empty() => Some(SecretString::from(value)),
        _ => None,
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("TOKENCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("tokencast").join("config.toml"))
}

/// Resolve the data directory path following XDG Base Directory spec
pub fn resolve_data_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| ConfigError::MissingField("data directory".to_string()))?;

    Ok(data_dir.join("tokencast"))
}
