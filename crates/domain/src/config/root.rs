use serde::{Deserialize, Serialize};
use std::path::Path;

use super::client::ClientConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;

/// Main configuration file layout
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values given on the command line take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub account_id: Option<String>,
    pub secret_key: Option<String>,
    pub region: Option<String>,
    pub timeout_ms: Option<u64>,
    pub retry_times: Option<u32>,
    pub using_https: Option<bool>,
    pub using_cache: Option<bool>,
    pub log_level: Option<String>,
}

impl Config {
    /// Load from a TOML file (or defaults when no path is given), then apply
    /// CLI overrides.
    pub fn load(path: Option<&str>, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(account_id) = overrides.account_id {
            self.client.account_id = account_id;
        }
        if let Some(secret_key) = overrides.secret_key {
            self.client.secret_key = Some(secret_key);
            self.client.using_sign = true;
        }
        if let Some(region) = overrides.region {
            self.client.region = region;
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            self.client.timeout_ms = timeout_ms;
        }
        if let Some(retry_times) = overrides.retry_times {
            self.client.retry_times = retry_times;
        }
        if let Some(using_https) = overrides.using_https {
            self.client.using_https = using_https;
        }
        if let Some(using_cache) = overrides.using_cache {
            self.client.using_cache = using_cache;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.client.validate()?;
        match self.logging.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::Validation(format!(
                "logging.level '{other}' is not a valid level"
            ))),
        }
    }
}
