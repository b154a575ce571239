//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ConfigOverrides, ExporterConfig, ExporterConfigError, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "resque-exporter",
    version = crate::VERSION,
    about = "Prometheus exporter for Resque"
)]
pub struct Cli {
    /// TOML file with exporter settings; flags override it.
    #[arg(long = "config.file")]
    pub config_file: Option<PathBuf>,

    /// URL to the Redis backing the Resque [default: redis://localhost:6379].
    #[arg(long = "redis.url")]
    pub redis_url: Option<String>,

    /// Namespace used by Resque to prefix all its Redis keys [default: resque].
    #[arg(long = "redis.namespace")]
    pub redis_namespace: Option<String>,

    /// Address to listen on for web interface and telemetry [default: :9447].
    #[arg(long = "web.listen-address")]
    pub listen_address: Option<String>,

    /// Path under which to expose metrics [default: /metrics].
    #[arg(long = "web.telemetry-path")]
    pub telemetry_path: Option<String>,

    /// Log filter when RUST_LOG is unset [default: info].
    #[arg(long = "log.level")]
    pub log_level: Option<String>,

    /// Log output format [default: text].
    #[arg(long = "log.format", value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Defaults, then the config file (if any), then flags.
    ///
    /// The `REDIS_URL` environment layer is applied by the caller.
    pub fn load_config(&self) -> Result<ExporterConfig, ExporterConfigError> {
        let base = match &self.config_file {
            Some(path) => ExporterConfig::load(path)?,
            None => ExporterConfig::default(),
        };
        Ok(base.with_overrides(self.overrides()))
    }

    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            redis_url: self.redis_url.clone(),
            redis_namespace: self.redis_namespace.clone(),
            listen_address: self.listen_address.clone(),
            telemetry_path: self.telemetry_path.clone(),
            log_level: self.log_level.clone(),
            log_format: self.log_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn no_flags_gives_defaults() {
        let cli = Cli::try_parse_from(["resque-exporter"]).unwrap();
        assert_eq!(cli.load_config().unwrap(), ExporterConfig::default());
    }

    #[test]
    fn dotted_flag_names() {
        let cli = Cli::try_parse_from([
            "resque-exporter",
            "--redis.url",
            "redis://cache:6379/2",
            "--redis.namespace=jobs",
            "--web.listen-address",
            "127.0.0.1:9000",
            "--web.telemetry-path",
            "/resque-metrics",
            "--log.format",
            "json",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(config.redis_url, "redis://cache:6379/2");
        assert_eq!(config.redis_namespace, "jobs");
        assert_eq!(config.listen_address, "127.0.0.1:9000");
        assert_eq!(config.telemetry_path, "/resque-metrics");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "redis_url = \"redis://file:6379\"").unwrap();
        writeln!(file, "redis_namespace = \"from-file\"").unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let cli = Cli::try_parse_from([
            "resque-exporter",
            "--config.file",
            &path,
            "--redis.namespace",
            "from-flag",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(config.redis_url, "redis://file:6379");
        assert_eq!(config.redis_namespace, "from-flag");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from([
            "resque-exporter",
            "--config.file",
            "/nonexistent/resque-exporter.toml",
        ])
        .unwrap();
        assert!(matches!(
            cli.load_config(),
            Err(ExporterConfigError::Read { .. })
        ));
    }

    #[test]
    fn version_flag() {
        let err = Cli::try_parse_from(["resque-exporter", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
