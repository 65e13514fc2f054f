//! Configuration loading for the verification client.
//!
//! All fields are required. The file is TOML; its path comes from
//! `--config <path>` or `SILENCIO_CONFIG`.

use serde::Deserialize;
use silencio_core::{BackoffConfig, QueryConfig};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    /// How often unused queries are swept from the cache.
    pub gc_interval_ms: u64,
    pub query: QueryConfig,
    pub refresh_backoff: BackoffConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientConfigError {
    #[error("Missing configuration file path (use --config or SILENCIO_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error(transparent)]
    Policy(#[from] silencio_core::ConfigError),
}

impl ClientConfig {
    pub fn load() -> Result<Self, ClientConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ClientConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ClientConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ClientConfigError> {
        let config: ClientConfig = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientConfigError> {
        let base_url = self.api_base_url.trim();
        if base_url.is_empty() {
            return Err(ClientConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must start with http:// or https://".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ClientConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.gc_interval_ms == 0 {
            return Err(ClientConfigError::InvalidValue {
                field: "gc_interval_ms",
                reason: "must be > 0".to_string(),
            });
        }
        self.query.validate()?;
        self.refresh_backoff.validate()?;
        Ok(())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("SILENCIO_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
