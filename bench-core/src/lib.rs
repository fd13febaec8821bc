//! # bench-core
//!
//! Pure logic for sync-bench (no I/O, instant tests).
//!
//! This crate implements the timing rules, state machines and log analysis
//! of the harness without touching timers, engines or files.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. Time is always passed in, never read. This enables:
//! - Instant unit tests (no runtime, no sleeping)
//! - Deterministic behavior (seeded jitter, explicit timestamps)
//! - Easy reasoning about phase boundaries and lifecycle transitions
//!
//! The reactor in `bench-node` owns the timers and the engine handle and
//! interprets the actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod clock;
pub mod config;
pub mod jitter;
pub mod lifecycle;
pub mod publisher;
pub mod reconcile;

pub use analysis::{AnalysisReport, LatencyStats, LogAnalyzer, TimedRecord};
pub use clock::{phase, ExperimentClock, ExperimentPhase};
pub use config::{ConfigError, ExperimentConfig};
pub use jitter::JitterSampler;
pub use lifecycle::{LifecycleAction, LifecycleEvent, LifecycleState};
pub use publisher::{Publication, Publisher, PAYLOAD_SEPARATOR};
pub use reconcile::{fetch_plan, FetchRequest};
