//! # bench-node
//!
//! The reactor that runs one sync-bench node.
//!
//! A node registers its namespace with a sync engine, publishes on a
//! jittered schedule while the experiment clock is in RUN, turns
//! missing-update notifications into fetches, and shuts down once the
//! observation window has passed.
//!
//! ## Architecture
//!
//! ```text
//!              +--------------------- reactor thread ---------------------+
//!  Scheduler --|--> tick --> ExperimentClock --> LifecycleState (pure)    |
//!              |                                   | actions              |
//!              |                                   v                      |
//!  SyncEngine <|---- publish / fetch ------- LifecycleController          |
//!      |       |                                   ^                      |
//!      +-------|--> EngineEvent channel -----------+--> UpdateReconciler  |
//!              +----------------------------------------------------------+
//! ```
//!
//! Every piece of harness state lives inside the controller future, which
//! runs on a tokio current-thread runtime. Engine callbacks arrive as
//! messages on the reactor's own channel, so no harness state is ever
//! shared with engine tasks.
//!
//! ## Example
//!
//! ```ignore
//! use bench_node::{LifecycleController, TracingSink};
//!
//! let network = MemoryNetwork::new(NetworkConditions::default());
//! let controller = LifecycleController::new(identity, config, TracingSink);
//! let summary = controller.run_blocking(|| Ok(network.join()))?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod error;
pub mod reconciler;
pub mod scheduler;
pub mod sink;

pub use controller::{LifecycleController, RunSummary};
pub use error::HarnessError;
pub use reconciler::UpdateReconciler;
pub use scheduler::Scheduler;
pub use sink::{MemorySink, ObservationSink, TracingSink, EVENT_TARGET};
