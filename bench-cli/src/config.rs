//! Configuration loading for sync-bench.
//!
//! An optional TOML file with `[experiment]` and `[network]` sections.
//! Every field has a default, so an empty file (or no file) is valid.
//!
//! ```toml
//! [experiment]
//! run_duration_ms = 60000
//! drain_duration_ms = 15000
//!
//! [network]
//! fetch_loss = 0.05
//! ```

use bench_core::ExperimentConfig;
use bench_engine::NetworkConditions;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration for sync-bench.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BenchConfig {
    /// Experiment timing.
    #[serde(default)]
    pub experiment: ExperimentConfig,
    /// Simulated network.
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Simulated network configuration for the in-process engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NetworkConfig {
    /// How often each node compares state vectors (default: 1000ms).
    #[serde(default = "default_sync_interval_ms")]
    pub sync_interval_ms: u64,
    /// Delay of each fetch attempt (default: 20ms).
    #[serde(default = "default_fetch_latency_ms")]
    pub fetch_latency_ms: u64,
    /// Probability that a fetch attempt is lost (default: 0.0).
    #[serde(default)]
    pub fetch_loss: f64,
}

// Default value functions
fn default_sync_interval_ms() -> u64 {
    1000
}

fn default_fetch_latency_ms() -> u64 {
    20
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            sync_interval_ms: default_sync_interval_ms(),
            fetch_latency_ms: default_fetch_latency_ms(),
            fetch_loss: 0.0,
        }
    }
}

impl NetworkConfig {
    /// Conditions for a `MemoryNetwork`.
    pub fn conditions(&self) -> NetworkConditions {
        NetworkConditions {
            sync_interval: Duration::from_millis(self.sync_interval_ms),
            fetch_latency: Duration::from_millis(self.fetch_latency_ms),
            fetch_loss: self.fetch_loss,
        }
    }
}

impl BenchConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load from `path` if given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Check values the harness cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.experiment.validate()?;
        if self.network.sync_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "network.sync_interval_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.network.fetch_loss) {
            return Err(ConfigError::Invalid {
                field: "network.fetch_loss",
                reason: format!("{} is not a probability", self.network.fetch_loss),
            });
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// Experiment section rejected.
    #[error(transparent)]
    Experiment(#[from] bench_core::ConfigError),
    /// A value is out of range.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value is rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_uses_defaults() {
        let file = write_config("");
        let config = BenchConfig::from_file(file.path()).unwrap();
        assert_eq!(config, BenchConfig::default());
        assert_eq!(config.experiment.run_duration_ms, 120_000);
        assert_eq!(config.network.fetch_latency_ms, 20);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let file = write_config(
            r#"
[experiment]
run_duration_ms = 60000
seed = 9

[network]
fetch_loss = 0.25
"#,
        );
        let config = BenchConfig::from_file(file.path()).unwrap();
        assert_eq!(config.experiment.run_duration_ms, 60_000);
        assert_eq!(config.experiment.drain_duration_ms, 30_000);
        assert_eq!(config.experiment.seed, Some(9));
        assert_eq!(config.network.fetch_loss, 0.25);
        assert_eq!(config.network.sync_interval_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = BenchConfig::from_file(Path::new("/nonexistent/bench.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn bad_toml_is_parse_error() {
        let file = write_config("[experiment\nrun_duration_ms = ");
        let err = BenchConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn loss_outside_unit_interval_is_invalid() {
        let mut config = BenchConfig::default();
        config.network.fetch_loss = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "network.fetch_loss",
                ..
            })
        ));
    }

    #[test]
    fn zero_fetch_attempts_is_rejected() {
        let mut config = BenchConfig::default();
        config.experiment.fetch_attempts = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Experiment(_))));
    }
}
