//! Jittered delay sampling for the publish schedule.
//!
//! Delays are drawn uniformly from `[base - variance, base + variance]`
//! milliseconds, clamped at zero. Each sampler owns its generator so tests
//! can seed it and two nodes never share one.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use crate::config::ExperimentConfig;

/// Uniform delay sampler around a base interval.
#[derive(Debug, Clone)]
pub struct JitterSampler {
    base_ms: u64,
    variance_ms: u64,
    rng: StdRng,
}

impl JitterSampler {
    /// Create a sampler seeded from OS entropy.
    pub fn new(base_ms: u64, variance_ms: u64) -> Self {
        Self {
            base_ms,
            variance_ms,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a sampler with a fixed seed (deterministic sequence).
    pub fn with_seed(base_ms: u64, variance_ms: u64, seed: u64) -> Self {
        Self {
            base_ms,
            variance_ms,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create a sampler from the publish knobs of an experiment.
    pub fn from_config(config: &ExperimentConfig) -> Self {
        let (base, variance) = (config.publish_interval_ms, config.publish_variance_ms);
        match config.seed {
            Some(seed) => Self::with_seed(base, variance, seed),
            None => Self::new(base, variance),
        }
    }

    /// Smallest delay this sampler can return.
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.base_ms.saturating_sub(self.variance_ms))
    }

    /// Largest delay this sampler can return.
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.base_ms.saturating_add(self.variance_ms))
    }

    /// Draw the next delay. Consumes exactly one draw from the generator.
    pub fn next_delay(&mut self) -> Duration {
        let low = self.base_ms.saturating_sub(self.variance_ms);
        let high = self.base_ms.saturating_add(self.variance_ms);
        Duration::from_millis(self.rng.gen_range(low..=high))
    }
}
