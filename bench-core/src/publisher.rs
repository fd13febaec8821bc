//! Publish-side bookkeeping.
//!
//! The publisher decides whether a tick publishes and builds the payload.
//! Handing the payload to the engine is the reactor's job; the counter
//! advances whether or not that hand-off succeeds.

use bench_types::NodeIdentity;
use std::time::Duration;

use crate::clock::ExperimentPhase;
use crate::config::ExperimentConfig;

/// Separator between identity and counter in published payloads.
pub const PAYLOAD_SEPARATOR: &str = "=";

/// An item ready to be handed to the sync engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    /// Counter value this item was built from (first item is 1).
    pub counter: u64,
    /// Payload bytes: `identity=counter`.
    pub payload: Vec<u8>,
    /// Freshness hint for the engine.
    pub freshness: Duration,
}

impl Publication {
    /// Payload as text, for log records.
    pub fn message(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Owns the publish counter and builds one item per RUN tick.
#[derive(Debug, Clone)]
pub struct Publisher {
    identity: NodeIdentity,
    freshness: Duration,
    counter: u64,
}

impl Publisher {
    /// Create a publisher for `identity` with the counter at zero.
    pub fn new(identity: NodeIdentity, config: &ExperimentConfig) -> Self {
        Self {
            identity,
            freshness: config.freshness(),
            counter: 0,
        }
    }

    /// Handle a tick observed in `phase`.
    ///
    /// Returns an item to publish in RUN (advancing the counter by one) and
    /// `None` in every other phase (counter unchanged).
    pub fn on_tick(&mut self, phase: ExperimentPhase) -> Option<Publication> {
        if !phase.is_publishing() {
            return None;
        }
        self.counter = self.counter.saturating_add(1);
        Some(Publication {
            counter: self.counter,
            payload: build_payload(&self.identity, self.counter),
            freshness: self.freshness,
        })
    }

    /// Number of items built so far.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// The identity items are published under.
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }
}

/// Build the deterministic payload `identity=counter`.
fn build_payload(identity: &NodeIdentity, counter: u64) -> Vec<u8> {
    format!("{identity}{PAYLOAD_SEPARATOR}{counter}").into_bytes()
}
