//! Sync engine abstraction.
//!
//! # Design
//!
//! Every call is a non-blocking request:
//! - `publish()` hands over a payload and returns without waiting for
//!   replication
//! - `fetch()` starts a bounded-retry fetch; the content, if it ever
//!   arrives, comes back as [`EngineEvent::Fetched`]
//! - missing-update notifications arrive as [`EngineEvent::MissingRanges`]
//!
//! Both kinds of event travel through the single sender registered with
//! `register_missing_update_callback()`, so the reactor sees them on its
//! own queue and never shares state with engine internals. A fetch that
//! exhausts its attempts produces no event at all.

use bench_types::{MissingRange, NodeIdentity, RemoteSession, SeqNo};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Engine errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Engine was shut down.
    #[error("engine is shut down")]
    Closed,

    /// Publish request was not accepted.
    #[error("publish rejected: {0}")]
    PublishRejected(String),

    /// Fetch request was not accepted.
    #[error("fetch rejected: {0}")]
    FetchRejected(String),

    /// Another node already publishes under this namespace.
    #[error("namespace already registered: {0}")]
    NamespaceTaken(String),
}

/// Asynchronous notifications from the engine to the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Remote sessions published sequence numbers we have not seen.
    MissingRanges(Vec<MissingRange>),
    /// Content for a previously requested `(session, seq)`.
    Fetched {
        /// Session the content belongs to.
        session: RemoteSession,
        /// Sequence number of the content.
        seq: SeqNo,
        /// The item payload.
        content: Vec<u8>,
    },
}

/// Sending half handed to the engine.
pub type EngineEventSender = mpsc::UnboundedSender<EngineEvent>;

/// Receiving half polled by the reactor.
pub type EngineEventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// Create the event channel between an engine and the reactor.
pub fn event_channel() -> (EngineEventSender, EngineEventReceiver) {
    mpsc::unbounded_channel()
}

/// The sync engine collaborator, as seen by the harness.
///
/// Implementations must not block the calling thread. Engines that spawn
/// background work do so on the current tokio runtime, so these methods
/// are called from inside the reactor.
pub trait SyncEngine {
    /// Register the namespace this node publishes under. Called once.
    fn add_local_namespace(&mut self, identity: &NodeIdentity) -> Result<(), EngineError>;

    /// Set the sender for missing-update and fetch-result events. Called once.
    fn register_missing_update_callback(&mut self, events: EngineEventSender);

    /// Hand a payload to the engine for replication.
    ///
    /// Returns once the request is accepted, not once it is delivered.
    fn publish(&mut self, payload: Vec<u8>, freshness: Duration) -> Result<(), EngineError>;

    /// Request the content of `(session, seq)`, retrying up to
    /// `max_attempts` times before silently giving up.
    fn fetch(
        &mut self,
        session: &RemoteSession,
        seq: SeqNo,
        max_attempts: u32,
    ) -> Result<(), EngineError>;

    /// Release engine resources. Idempotent; in-flight fetches are abandoned.
    fn shutdown(&mut self);
}
