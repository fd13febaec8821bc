//! Run a single node.

use anyhow::{Context, Result};
use bench_node::{LifecycleController, RunSummary, TracingSink};
use bench_types::NodeIdentity;
use std::path::Path;

use super::{build_network, load_config, print_summary};
use crate::logging;

/// Run the node command.
///
/// The node joins an in-process network of its own, so it only ever sees
/// its own items; use `cluster` for a multi-node run.
pub fn run(
    identity: &str,
    log_file: &Path,
    interval_ms: u64,
    config_path: Option<&Path>,
    seed: Option<u64>,
) -> Result<RunSummary> {
    let identity = NodeIdentity::new(identity).context("Invalid node identity")?;
    let config = load_config(config_path, interval_ms, seed)?;
    logging::init(Some(log_file))?;

    let network = build_network(&config);
    let controller = LifecycleController::new(identity, config.experiment, TracingSink);
    let summary = controller
        .run_blocking(|| Ok(network.join()))
        .context("Node run failed")?;

    print_summary(&summary);
    Ok(summary)
}
