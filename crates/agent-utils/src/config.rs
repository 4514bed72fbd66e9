//! Application-level configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors raised while reading application configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue {
                key: "log format".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Settings shared by every binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name
    pub app_name: String,
    /// Environment (development, production, ...)
    pub environment: String,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "stock-agent".to_string(),
            environment: "development".to_string(),
            log_filter: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Read `{PREFIX}_ENV`, `{PREFIX}_LOG` and `{PREFIX}_LOG_FORMAT` from the process environment
    pub fn from_env(app_name: &str, prefix: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(app_name, prefix, |key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with a custom variable lookup
    pub fn from_lookup<F>(app_name: &str, prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            app_name: app_name.to_string(),
            ..Self::default()
        };
        let var = |suffix: &str| {
            lookup(&format!("{prefix}_{suffix}")).filter(|v| !v.trim().is_empty())
        };

        if let Some(env) = var("ENV") {
            config.environment = env;
        }
        if let Some(filter) = var("LOG") {
            config.log_filter = filter;
        }
        if let Some(format) = var("LOG_FORMAT") {
            config.log_format = format.parse()?;
        }
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
