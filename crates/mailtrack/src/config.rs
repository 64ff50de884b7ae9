//! Service configuration.
//!
//! Loaded from an optional JSON file, then overridden by `MAILTRACK_*`
//! environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_BIND_ADDR: &str = "MAILTRACK_BIND_ADDR";
pub const ENV_DATABASE: &str = "MAILTRACK_DATABASE";
pub const ENV_CLIENT_IP_HEADER: &str = "MAILTRACK_CLIENT_IP_HEADER";
pub const ENV_LOG_FORMAT: &str = "MAILTRACK_LOG_FORMAT";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation {
                message: format!("Unknown log format '{}' (expected 'pretty' or 'json')", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Socket address the HTTP server listens on.
    pub bind_addr: String,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Proxy header carrying the client IP. The peer address is used when
    /// the header is absent.
    pub client_ip_header: String,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            database_path: crate::db::default_database_path()
                .unwrap_or_else(|| PathBuf::from("emails.db")),
            client_ip_header: "X-Forwarded-For".to_string(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Applies `MAILTRACK_*` environment overrides on top of this config.
    pub fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(addr) = std::env::var(ENV_BIND_ADDR) {
            self.bind_addr = addr;
        }
        if let Ok(path) = std::env::var(ENV_DATABASE) {
            self.database_path = PathBuf::from(path);
        }
        if let Ok(header) = std::env::var(ENV_CLIENT_IP_HEADER) {
            self.client_ip_header = header;
        }
        if let Ok(format) = std::env::var(ENV_LOG_FORMAT) {
            self.log_format = format.parse()?;
        }

        validate_config(&self)?;
        Ok(self)
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.bind_addr.parse::<std::net::SocketAddr>().is_err() {
        return Err(ConfigError::Validation {
            message: format!("Invalid bind address: {}", config.bind_addr),
        });
    }

    if config.database_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation {
            message: "Database path must not be empty".to_string(),
        });
    }

    let header = &config.client_ip_header;
    if header.is_empty()
        || !header
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(ConfigError::Validation {
            message: format!("Invalid client IP header name: '{}'", header),
        });
    }

    Ok(())
}
