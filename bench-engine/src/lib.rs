//! # bench-engine
//!
//! The sync engine seam for sync-bench.
//!
//! The harness never speaks a sync protocol itself. It drives an engine
//! through the narrow [`SyncEngine`] trait: publish an item, get told about
//! missing remote items, fetch their content.
//!
//! ## Engines
//!
//! - [`MockEngine`]: records calls, fails on demand, serves scripted content
//! - [`MemoryEngine`]: in-process state-vector engine; many nodes share one
//!   [`MemoryNetwork`] and learn about each other's items by periodic
//!   comparison, with configurable fetch latency and loss
//!
//! ## Example
//!
//! ```ignore
//! let network = MemoryNetwork::new(NetworkConditions::default());
//! let (tx, mut rx) = event_channel();
//! let mut engine = network.join();
//! engine.add_local_namespace(&identity)?;
//! engine.register_missing_update_callback(tx);
//! engine.publish(b"a=1".to_vec(), Duration::from_secs(1))?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod engine;
mod memory;
mod mock;

pub use engine::{
    event_channel, EngineError, EngineEvent, EngineEventReceiver, EngineEventSender, SyncEngine,
};
pub use memory::{MemoryEngine, MemoryNetwork, NetworkConditions};
pub use mock::{MockEngine, RecordedFetch, RecordedPublish};
