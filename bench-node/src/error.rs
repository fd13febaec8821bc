//! Harness errors.

use bench_core::ConfigError;
use bench_engine::EngineError;
use thiserror::Error;

/// Errors that end a node run before its observation window closes.
///
/// Failures inside the run (a rejected publish, a failed fetch) are logged
/// and absorbed; only setup failures surface here.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Experiment configuration rejected.
    #[error("invalid experiment config: {0}")]
    Config(#[from] ConfigError),

    /// Engine construction or namespace registration failed.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Reactor runtime could not be built.
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}
