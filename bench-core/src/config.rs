//! Experiment configuration.
//!
//! Built once at startup and passed by reference to the scheduler and the
//! publisher. Nothing here is mutated after construction.

use serde::Deserialize;
use std::time::Duration;

/// Timing and retry knobs for one benchmark run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExperimentConfig {
    /// Mean time between publish ticks in milliseconds (default: 5000).
    #[serde(default = "default_publish_interval_ms")]
    pub publish_interval_ms: u64,
    /// Half-width of the uniform jitter window in milliseconds (default: 1000).
    #[serde(default = "default_publish_variance_ms")]
    pub publish_variance_ms: u64,
    /// Length of the RUN phase, measured from the first tick (default: 120s).
    #[serde(default = "default_run_duration_ms")]
    pub run_duration_ms: u64,
    /// Length of the DRAIN phase after RUN (default: 30s).
    #[serde(default = "default_drain_duration_ms")]
    pub drain_duration_ms: u64,
    /// Freshness hint handed to the engine with each publish (default: 1s).
    #[serde(default = "default_freshness_ms")]
    pub freshness_ms: u64,
    /// Fetch attempts per missing sequence number before giving up (default: 5).
    #[serde(default = "default_fetch_attempts")]
    pub fetch_attempts: u32,
    /// Seed for the jitter RNG. Unset means seeded from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_publish_interval_ms() -> u64 {
    5000
}

fn default_publish_variance_ms() -> u64 {
    1000
}

fn default_run_duration_ms() -> u64 {
    120_000
}

fn default_drain_duration_ms() -> u64 {
    30_000
}

fn default_freshness_ms() -> u64 {
    1000
}

fn default_fetch_attempts() -> u32 {
    5
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            publish_interval_ms: default_publish_interval_ms(),
            publish_variance_ms: default_publish_variance_ms(),
            run_duration_ms: default_run_duration_ms(),
            drain_duration_ms: default_drain_duration_ms(),
            freshness_ms: default_freshness_ms(),
            fetch_attempts: default_fetch_attempts(),
            seed: None,
        }
    }
}

impl ExperimentConfig {
    /// Set the publish interval; the jitter window becomes a fifth of it.
    pub fn with_interval(mut self, interval_ms: u64) -> Self {
        self.publish_interval_ms = interval_ms;
        self.publish_variance_ms = interval_ms / 5;
        self
    }

    /// Set the RUN and DRAIN phase lengths.
    pub fn with_phases(mut self, run_ms: u64, drain_ms: u64) -> Self {
        self.run_duration_ms = run_ms;
        self.drain_duration_ms = drain_ms;
        self
    }

    /// Fix the jitter RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the knobs describe a run that can make progress.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.publish_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "publish_interval_ms",
                reason: "must be greater than zero",
            });
        }
        if self.fetch_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "fetch_attempts",
                reason: "must be at least one",
            });
        }
        Ok(())
    }

    /// RUN phase length.
    pub fn run_duration(&self) -> Duration {
        Duration::from_millis(self.run_duration_ms)
    }

    /// DRAIN phase length.
    pub fn drain_duration(&self) -> Duration {
        Duration::from_millis(self.drain_duration_ms)
    }

    /// Freshness hint for published items.
    pub fn freshness(&self) -> Duration {
        Duration::from_millis(self.freshness_ms)
    }

    /// Total observation window after the first tick.
    pub fn observation_window(&self) -> Duration {
        self.run_duration() + self.drain_duration()
    }
}

/// Configuration error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A field holds a value the harness cannot run with.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value is rejected.
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_reference_run() {
        let config = ExperimentConfig::default();
        assert_eq!(config.publish_interval_ms, 5000);
        assert_eq!(config.publish_variance_ms, 1000);
        assert_eq!(config.observation_window(), Duration::from_secs(150));
        assert_eq!(config.fetch_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn interval_sets_variance_to_a_fifth() {
        let config = ExperimentConfig::default().with_interval(10_000);
        assert_eq!(config.publish_variance_ms, 2000);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = ExperimentConfig::default().with_interval(0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "publish_interval_ms",
                reason: "must be greater than zero",
            })
        );
    }

    #[test]
    fn zero_fetch_attempts_is_rejected() {
        let config = ExperimentConfig {
            fetch_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: ExperimentConfig =
            serde_json::from_str(r#"{"publish_interval_ms": 1000, "seed": 7}"#).unwrap();
        assert_eq!(config.publish_interval_ms, 1000);
        assert_eq!(config.publish_variance_ms, 1000);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.run_duration_ms, 120_000);
    }
}
