/**
 * Server Configuration
 *
 * This module loads and validates the server's runtime settings.
 *
 * # Configuration Sources
 *
 * Later sources win:
 * 1. Built-in defaults (suitable for local development)
 * 2. A TOML file, when `XFCANVAS_CONFIG` points at one
 * 3. Environment variables (`SERVER_HOST`, `SERVER_PORT`,
 *    `SUBSCRIBER_BUFFER`, `GENERATION_TIMEOUT_SECS`, `RUST_LOG`)
 *
 * The binary loads `.env` with `dotenv` before calling [`ServerConfig::load`].
 *
 * ```toml
 * host = "0.0.0.0"
 * port = 3000
 * subscriber_buffer = 256
 * generation_timeout_secs = 60
 * log_filter = "info,xfcanvas=debug"
 * ```
 */

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::backend::realtime::broadcast::DEFAULT_SUBSCRIBER_BUFFER;

/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_VAR: &str = "XFCANVAS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: '{value}'")]
    InvalidEnv { key: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address; must be an IP literal
    pub host: String,
    pub port: u16,
    /// Frames queued per subscriber before it is dropped as lagging
    pub subscriber_buffer: usize,
    pub generation_timeout_secs: u64,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
            generation_timeout_secs: 60,
            log_filter: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Defaults, then the optional TOML file, then the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim()))?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay values found through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(host) = lookup("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.port = parse_env("SERVER_PORT", port)?;
        }
        if let Some(buffer) = lookup("SUBSCRIBER_BUFFER") {
            self.subscriber_buffer = parse_env("SUBSCRIBER_BUFFER", buffer)?;
        }
        if let Some(secs) = lookup("GENERATION_TIMEOUT_SECS") {
            self.generation_timeout_secs = parse_env("GENERATION_TIMEOUT_SECS", secs)?;
        }
        if let Some(filter) = lookup("RUST_LOG") {
            self.log_filter = filter;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must not be 0".into()));
        }
        if self.subscriber_buffer == 0 {
            return Err(ConfigError::Invalid("subscriber_buffer must be at least 1".into()));
        }
        if self.generation_timeout_secs == 0 {
            return Err(ConfigError::Invalid("generation_timeout_secs must be at least 1".into()));
        }
        self.socket_addr().map(|_| ())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("'{}' is not a valid listen host", self.host)))
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}
