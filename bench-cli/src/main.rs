//! # sync-bench
//!
//! Benchmark harness for state-vector sync engines.
//!
//! ## Commands
//!
//! - `node`: Run one node and append its event records to a log file
//! - `cluster`: Run many nodes over one in-process network
//! - `analyze`: Report delivery latency and ratio from event logs
//!
//! ## Example
//!
//! ```bash
//! # One node, publishing every 5s +/- 1s
//! sync-bench node /ndn/a-site/a a.log 5000
//!
//! # Ten nodes with 5% fetch loss
//! sync-bench cluster --nodes 10 --interval-ms 2000 --log-file run.log --config lossy.toml
//!
//! # Analyze the run
//! sync-bench analyze run.log --nodes 10
//! ```
//!
//! Malformed arguments print `WRONG_ARGS` to stderr and exit with code 1.

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod config;
mod logging;

use commands::{analyze, cluster, node};

/// Benchmark harness for state-vector sync engines.
#[derive(Parser, Debug)]
#[command(name = "sync-bench")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single node
    Node {
        /// Node identity (publishing namespace)
        identity: String,

        /// Event log file (appended)
        log_file: PathBuf,

        /// Mean publish interval in milliseconds (jitter is a fifth of it)
        interval_ms: u64,

        /// TOML config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seed for jitter and simulated loss
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run many nodes over one in-process network
    Cluster {
        /// Number of nodes
        #[arg(long)]
        nodes: usize,

        /// Mean publish interval in milliseconds (jitter is a fifth of it)
        #[arg(long)]
        interval_ms: u64,

        /// Shared event log file (appended)
        #[arg(long)]
        log_file: PathBuf,

        /// Node name prefix
        #[arg(long, default_value = "node")]
        prefix: String,

        /// TOML config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Base seed; node i uses seed + i
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Report delivery latency and ratio from event logs
    Analyze {
        /// Event log files of one run
        #[arg(required = true)]
        log_files: Vec<PathBuf>,

        /// Node count (default: distinct NODE_INIT records)
        #[arg(long)]
        nodes: Option<usize>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            eprintln!("WRONG_ARGS");
            return ExitCode::from(1);
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Node {
            identity,
            log_file,
            interval_ms,
            config,
            seed,
        } => {
            node::run(&identity, &log_file, interval_ms, config.as_deref(), seed)?;
        }
        Commands::Cluster {
            nodes,
            interval_ms,
            log_file,
            prefix,
            config,
            seed,
        } => {
            cluster::run(cluster::ClusterArgs {
                nodes,
                interval_ms,
                log_file: &log_file,
                prefix: &prefix,
                config_path: config.as_deref(),
                seed,
            })?;
        }
        Commands::Analyze {
            log_files,
            nodes,
            json,
        } => {
            logging::init(None)?;
            analyze::run(&log_files, nodes, json)?;
        }
    }

    Ok(())
}
