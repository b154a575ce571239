//! Exporter configuration.
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then command-line flags, then the `REDIS_URL` environment variable,
//! which wins over everything else for the connection string.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding the Redis connection string.
pub const REDIS_URL_ENV: &str = "REDIS_URL";

#[derive(Debug, Error)]
pub enum ExporterConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid telemetry path {0:?}: must start with '/' and not be '/'")]
    TelemetryPath(String),

    #[error("invalid listen address {0:?}")]
    ListenAddress(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Fully-resolved exporter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExporterConfig {
    /// Connection string of the Redis backing Resque.
    pub redis_url: String,
    /// Namespace Resque prefixes its Redis keys with.
    pub redis_namespace: String,
    /// Address for the HTTP server; `:port` binds all interfaces.
    pub listen_address: String,
    /// Path serving the metrics exposition.
    pub telemetry_path: String,
    /// Default tracing filter; `RUST_LOG` takes precedence.
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            redis_namespace: "resque".to_string(),
            listen_address: ":9447".to_string(),
            telemetry_path: "/metrics".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

/// Values given explicitly on the command line. `None` leaves the lower
/// layer untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub redis_url: Option<String>,
    pub redis_namespace: Option<String>,
    pub listen_address: Option<String>,
    pub telemetry_path: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl ExporterConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ExporterConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ExporterConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ExporterConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Layer command-line values on top.
    pub fn with_overrides(self, o: ConfigOverrides) -> Self {
        Self {
            redis_url: o.redis_url.unwrap_or(self.redis_url),
            redis_namespace: o.redis_namespace.unwrap_or(self.redis_namespace),
            listen_address: o.listen_address.unwrap_or(self.listen_address),
            telemetry_path: o.telemetry_path.unwrap_or(self.telemetry_path),
            log_level: o.log_level.unwrap_or(self.log_level),
            log_format: o.log_format.unwrap_or(self.log_format),
        }
    }

    /// Apply the `REDIS_URL` value, if set and non-empty.
    pub fn with_env_redis_url(self, value: Option<&str>) -> Self {
        match value {
            Some(url) if !url.is_empty() => Self {
                redis_url: url.to_string(),
                ..self
            },
            _ => self,
        }
    }

    pub fn validate(&self) -> Result<(), ExporterConfigError> {
        if !self.telemetry_path.starts_with('/') || self.telemetry_path == "/" {
            return Err(ExporterConfigError::TelemetryPath(self.telemetry_path.clone()));
        }
        let port = self
            .listen_address
            .rsplit_once(':')
            .map(|(_, port)| port)
            .ok_or_else(|| ExporterConfigError::ListenAddress(self.listen_address.clone()))?;
        if port.parse::<u16>().is_err() {
            return Err(ExporterConfigError::ListenAddress(self.listen_address.clone()));
        }
        Ok(())
    }

    /// Address to hand to the listener; `:9447` becomes `0.0.0.0:9447`.
    pub fn bind_address(&self) -> String {
        if self.listen_address.starts_with(':') {
            format!("0.0.0.0{}", self.listen_address)
        } else {
            self.listen_address.clone()
        }
    }
}
