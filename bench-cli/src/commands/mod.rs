//! CLI command implementations.

pub mod analyze;
pub mod cluster;
pub mod node;

use anyhow::Result;
use bench_engine::MemoryNetwork;
use bench_node::RunSummary;
use std::path::Path;

use crate::config::BenchConfig;

/// Load the config file (if any), apply the command-line overrides and
/// validate the result.
pub fn load_config(
    path: Option<&Path>,
    interval_ms: u64,
    seed: Option<u64>,
) -> Result<BenchConfig> {
    let mut config = BenchConfig::load(path)?;
    config.experiment = config.experiment.with_interval(interval_ms);
    if let Some(seed) = seed {
        config.experiment = config.experiment.with_seed(seed);
    }
    config.validate()?;
    Ok(config)
}

/// Build the shared in-process network for a run.
pub fn build_network(config: &BenchConfig) -> MemoryNetwork {
    let network = MemoryNetwork::new(config.network.conditions());
    match config.experiment.seed {
        Some(seed) => network.with_seed(seed),
        None => network,
    }
}

/// Print one node's summary line.
pub fn print_summary(summary: &RunSummary) {
    println!(
        "{:<16} ticks={:<4} published={:<4} failed={:<3} states={:<5} received={:<5} {:.1}s",
        summary.identity.as_str(),
        summary.ticks,
        summary.publishes_attempted - summary.publishes_failed,
        summary.publishes_failed,
        summary.states_seen,
        summary.messages_received,
        summary.elapsed.as_secs_f64(),
    );
}
