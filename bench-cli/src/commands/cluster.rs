//! Run many nodes in one process.
//!
//! Each node gets its own thread and current-thread reactor; all of them
//! share one `MemoryNetwork` and write one event log. Threads are labelled
//! `node-<index>` in the log's thread column, whatever the node prefix.

use anyhow::{anyhow, Context, Result};
use bench_node::{LifecycleController, RunSummary, TracingSink};
use bench_types::NodeIdentity;
use std::path::Path;
use std::thread;

use super::{build_network, load_config, print_summary};
use crate::logging;

/// Cluster command arguments.
#[derive(Debug, Clone)]
pub struct ClusterArgs<'a> {
    /// Number of nodes.
    pub nodes: usize,
    /// Mean publish interval in milliseconds.
    pub interval_ms: u64,
    /// Shared event log.
    pub log_file: &'a Path,
    /// Node names are `<prefix>-<index>`.
    pub prefix: &'a str,
    /// Optional TOML config.
    pub config_path: Option<&'a Path>,
    /// Base seed; node `i` uses `seed + i`.
    pub seed: Option<u64>,
}

/// Run the cluster command.
pub fn run(args: ClusterArgs<'_>) -> Result<Vec<RunSummary>> {
    if args.nodes == 0 {
        anyhow::bail!("--nodes must be at least 1");
    }
    let identities = (0..args.nodes)
        .map(|i| NodeIdentity::new(format!("{}-{i}", args.prefix)))
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid node prefix")?;

    let config = load_config(args.config_path, args.interval_ms, args.seed)?;
    logging::init(Some(args.log_file))?;
    let network = build_network(&config);

    tracing::info!(
        nodes = args.nodes,
        interval_ms = args.interval_ms,
        "starting cluster"
    );

    let handles = identities
        .into_iter()
        .enumerate()
        .map(|(i, identity)| {
            let mut experiment = config.experiment.clone();
            experiment.seed = experiment.seed.map(|seed| seed.wrapping_add(i as u64));
            let network = network.clone();
            thread::Builder::new()
                .name(format!("node-{i}"))
                .spawn(move || {
                    LifecycleController::new(identity, experiment, TracingSink)
                        .run_blocking(|| Ok(network.join()))
                })
        })
        .collect::<std::io::Result<Vec<_>>>()
        .context("Failed to spawn node thread")?;

    let mut summaries = Vec::with_capacity(handles.len());
    for handle in handles {
        let summary = handle
            .join()
            .map_err(|_| anyhow!("node thread panicked"))?
            .context("Node run failed")?;
        print_summary(&summary);
        summaries.push(summary);
    }
    Ok(summaries)
}
