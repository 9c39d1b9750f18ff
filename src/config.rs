//! Environment-driven configuration.

use std::path::{Path, PathBuf};

use clap::Parser;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The cattackles directory exists but could not be read.
    #[error("cattackles directory {path} exists but is not readable: {source}")]
    CattacklesDirUnreadable {
        /// The offending path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The bot token was empty.
    #[error("telegram bot token must not be empty")]
    MissingBotToken,
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Runtime configuration for relaybot, loaded from CLI flags with
/// environment-variable fallbacks.
#[derive(Debug, Clone, Parser)]
#[command(name = "relaybot", author, version, about = "Chat-bot core mediating between a messaging platform and MCP plugin workers")]
pub struct Config {
    /// Bot token for the messaging platform API.
    #[arg(long = "bot-token", env = "RELAYBOT_BOT_TOKEN")]
    pub telegram_bot_token: String,

    /// Directory to scan for plugin manifests.
    #[arg(long = "cattackles-dir", env = "RELAYBOT_CATTACKLES_DIR", default_value = "./cattackles")]
    pub cattackles_dir: PathBuf,

    /// Path to the persisted offset file.
    #[arg(long = "offset-file", env = "RELAYBOT_OFFSET_FILE", default_value = "./data/update_id")]
    pub update_id_file_path: PathBuf,

    /// Maximum free-form messages retained per chat before eviction.
    #[arg(long, env = "RELAYBOT_MAX_MESSAGES_PER_CHAT", default_value_t = 100)]
    pub max_messages_per_chat: usize,

    /// Maximum length of a single accumulated message; 0 drops everything.
    #[arg(long, env = "RELAYBOT_MAX_MESSAGE_LENGTH", default_value_t = 1000)]
    pub max_message_length: usize,

    /// Whether `add` returns a "stored, you now have N" feedback string.
    #[arg(long, env = "RELAYBOT_FEEDBACK_ENABLED", default_value_t = true)]
    pub feedback_enabled: bool,

    /// Tracing level filter (e.g. `info`, `debug`).
    #[arg(long, env = "RELAYBOT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format: `compact`, `json`, or `pretty`.
    #[arg(long, env = "RELAYBOT_LOG_FORMAT", default_value = "compact")]
    pub log_format: String,
}

impl Config {
    /// Validates configuration that can't be expressed in `clap`'s type
    /// system alone: a non-empty token, and a cattackles directory that,
    /// if present, is actually readable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.telegram_bot_token.trim().is_empty() {
            return Err(ConfigError::MissingBotToken);
        }
        check_readable_if_present(&self.cattackles_dir)?;
        Ok(())
    }
}

fn check_readable_if_present(path: &Path) -> ConfigResult<()> {
    match std::fs::read_dir(path) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ConfigError::CattacklesDirUnreadable {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            telegram_bot_token: "token".into(),
            cattackles_dir: PathBuf::from("./does-not-exist"),
            update_id_file_path: PathBuf::from("./data/update_id"),
            max_messages_per_chat: 100,
            max_message_length: 1000,
            feedback_enabled: true,
            log_level: "info".into(),
            log_format: "compact".into(),
        }
    }

    #[test]
    fn missing_token_is_rejected() {
        let mut config = base_config();
        config.telegram_bot_token = "   ".into();
        assert!(matches!(config.validate(), Err(ConfigError::MissingBotToken)));
    }

    #[test]
    fn missing_cattackles_dir_is_tolerated() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn existing_readable_cattackles_dir_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = base_config();
        config.cattackles_dir = dir.path().to_path_buf();
        assert!(config.validate().is_ok());
    }
}
