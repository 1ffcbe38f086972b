//! Application configuration.
//!
//! YAML-based configuration with validation for:
//! - Server settings (bind address, port)
//! - Store settings (connection URL, command timeout, retry budget)
//! - Indexer settings (optional RNG seed)
//!
//! The store URL supports `${VAR}` / `${VAR:-default}` environment
//! expansion so credentials stay out of the config file.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Default server port, matching the original deployment.
pub const DEFAULT_PORT: u16 = 8090;

/// Default per-command store timeout.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(3);

/// Default retry budget for store connectivity errors.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_store_url() -> String {
    "redis://${REDIS_USERNAME:-default}:${REDIS_PASSWORD:-}@${REDIS_HOST:-localhost}:${REDIS_PORT:-6379}/0".to_string()
}

fn default_command_timeout() -> Duration {
    DEFAULT_COMMAND_TIMEOUT
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

/// Web server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 8090).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

/// Backing store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Connection URL. `${VAR}` / `${VAR:-default}` are expanded from the
    /// environment at load time.
    pub url: String,

    /// Per-command timeout (default: "3s").
    #[serde(with = "humantime_serde")]
    pub command_timeout: Duration,

    /// Retry budget for connectivity errors (default: 2).
    pub max_retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            command_timeout: default_command_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

/// Skill index builder configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Fixed RNG seed for reproducible skill assignment. Unset means a
    /// fresh seed per run.
    pub seed: Option<u64>,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Web server configuration.
    pub server: ServerConfig,

    /// Backing store configuration.
    pub store: StoreConfig,

    /// Skill index builder configuration.
    pub indexer: IndexerConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or
    /// validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load from a file if it exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            let mut config = Self::default();
            config.store.url = expand_env_vars(&config.store.url);
            config.validate()?;
            Ok(config)
        }
    }

    /// Parse and validate YAML configuration content.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(content)?;
        config.store.url = expand_env_vars(&config.store.url);
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::Validation` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::Validation(format!(
                "invalid server bind address: '{}'",
                self.server.bind
            ))
        })?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server port must be non-zero".to_string(),
            ));
        }

        if self.store.url.is_empty() {
            return Err(ConfigError::Validation(
                "store url must not be empty".to_string(),
            ));
        }

        if self.store.command_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "store command_timeout must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Expand environment variables in a string.
/// Supports ${VAR} and ${VAR:-default} syntax.
pub fn expand_env_vars(input: &str) -> String {
    static ENV_VAR_REGEX: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();

    let regex = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("failed to compile env var regex")
    });

    regex
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var_name).unwrap_or_else(|_| default_value.to_string())
        })
        .into_owned()
}
