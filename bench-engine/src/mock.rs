//! Mock engine for testing.
//!
//! Records every call, serves scripted content and fails on demand.

use bench_types::{MissingRange, NodeIdentity, RemoteSession, SeqNo};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::{EngineError, EngineEvent, EngineEventSender, SyncEngine};

/// A publish call captured by [`MockEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPublish {
    /// Payload handed to the engine.
    pub payload: Vec<u8>,
    /// Freshness hint handed to the engine.
    pub freshness: Duration,
}

/// A fetch call captured by [`MockEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFetch {
    /// Requested session.
    pub session: RemoteSession,
    /// Requested sequence number.
    pub seq: SeqNo,
    /// Retry budget passed by the caller.
    pub max_attempts: u32,
}

/// Mock engine for testing.
///
/// Clones share state, so a test keeps one clone for inspection and hands
/// the other to the harness. Fetches for content registered with
/// [`serve`](Self::serve) complete immediately; any other fetch behaves as
/// if every attempt failed and produces no event.
#[derive(Debug, Default, Clone)]
pub struct MockEngine {
    inner: Arc<Mutex<MockEngineInner>>,
}

#[derive(Debug, Default)]
struct MockEngineInner {
    namespaces: Vec<NodeIdentity>,
    events: Option<EngineEventSender>,
    published: Vec<RecordedPublish>,
    fetches: Vec<RecordedFetch>,
    content: HashMap<(RemoteSession, SeqNo), Vec<u8>>,
    shutdown_calls: usize,
    closed: bool,
    fail_next_namespace: Option<String>,
    fail_next_publish: Option<String>,
    fail_next_fetch: Option<String>,
}

impl MockEngine {
    /// Create a new mock engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `(session, seq)` fetchable with the given content.
    pub fn serve(&self, session: &RemoteSession, seq: SeqNo, content: &[u8]) {
        let mut inner = self.inner.lock();
        let key = (session.clone(), seq);
        inner.content.insert(key, content.to_vec());
    }

    /// Push a missing-ranges notification through the registered callback.
    ///
    /// Returns `false` if no callback is registered or the receiver is gone.
    pub fn inject(&self, ranges: Vec<MissingRange>) -> bool {
        self.send(EngineEvent::MissingRanges(ranges))
    }

    /// Push a fetch result through the registered callback, as an engine
    /// that redelivers would.
    pub fn deliver(&self, session: &RemoteSession, seq: SeqNo, content: &[u8]) -> bool {
        self.send(EngineEvent::Fetched {
            session: session.clone(),
            seq,
            content: content.to_vec(),
        })
    }

    fn send(&self, event: EngineEvent) -> bool {
        let inner = self.inner.lock();
        match &inner.events {
            Some(events) => events.send(event).is_ok(),
            None => false,
        }
    }

    /// Cause the next add_local_namespace() to fail.
    pub fn fail_next_namespace(&self, error: &str) {
        self.inner.lock().fail_next_namespace = Some(error.to_string());
    }

    /// Cause the next publish() to fail.
    pub fn fail_next_publish(&self, error: &str) {
        self.inner.lock().fail_next_publish = Some(error.to_string());
    }

    /// Cause the next fetch() to fail.
    pub fn fail_next_fetch(&self, error: &str) {
        self.inner.lock().fail_next_fetch = Some(error.to_string());
    }

    /// Namespaces registered so far.
    pub fn namespaces(&self) -> Vec<NodeIdentity> {
        self.inner.lock().namespaces.clone()
    }

    /// True once a callback sender is registered.
    pub fn has_callback(&self) -> bool {
        self.inner.lock().events.is_some()
    }

    /// All accepted publish calls.
    pub fn published(&self) -> Vec<RecordedPublish> {
        self.inner.lock().published.clone()
    }

    /// All accepted fetch calls.
    pub fn fetches(&self) -> Vec<RecordedFetch> {
        self.inner.lock().fetches.clone()
    }

    /// How many times shutdown() was called.
    pub fn shutdown_calls(&self) -> usize {
        self.inner.lock().shutdown_calls
    }

    /// True after the first shutdown().
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}

impl SyncEngine for MockEngine {
    fn add_local_namespace(&mut self, identity: &NodeIdentity) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        if let Some(error) = inner.fail_next_namespace.take() {
            return Err(EngineError::NamespaceTaken(error));
        }
        inner.namespaces.push(identity.clone());
        Ok(())
    }

    fn register_missing_update_callback(&mut self, events: EngineEventSender) {
        self.inner.lock().events = Some(events);
    }

    fn publish(&mut self, payload: Vec<u8>, freshness: Duration) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(EngineError::Closed);
        }
        if let Some(error) = inner.fail_next_publish.take() {
            return Err(EngineError::PublishRejected(error));
        }
        inner.published.push(RecordedPublish { payload, freshness });
        Ok(())
    }

    fn fetch(
        &mut self,
        session: &RemoteSession,
        seq: SeqNo,
        max_attempts: u32,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(EngineError::Closed);
        }
        if let Some(error) = inner.fail_next_fetch.take() {
            return Err(EngineError::FetchRejected(error));
        }
        inner.fetches.push(RecordedFetch {
            session: session.clone(),
            seq,
            max_attempts,
        });

        // Unknown content stands in for a fetch that ran out of attempts.
        if let Some(content) = inner.content.get(&(session.clone(), seq)).cloned() {
            if let Some(events) = &inner.events {
                let _ = events.send(EngineEvent::Fetched {
                    session: session.clone(),
                    seq,
                    content,
                });
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        let mut inner = self.inner.lock();
        inner.shutdown_calls += 1;
        inner.closed = true;
        inner.events = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::event_channel;

    fn session() -> RemoteSession {
        RemoteSession::new("peer")
    }

    // ===========================================
    // Recording Tests
    // ===========================================

    #[test]
    fn records_namespace_and_publishes() {
        let mut engine = MockEngine::new();
        let handle = engine.clone();
        engine
            .add_local_namespace(&NodeIdentity::new("me").unwrap())
            .unwrap();
        let payload = b"me=1".to_vec();
        engine.publish(payload, Duration::from_secs(1)).unwrap();

        assert_eq!(handle.namespaces().len(), 1);
        let published = handle.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].payload, b"me=1");
        assert_eq!(published[0].freshness, Duration::from_secs(1));
    }

    #[test]
    fn served_fetch_completes_through_callback() {
        let mut engine = MockEngine::new();
        let (tx, mut rx) = event_channel();
        engine.register_missing_update_callback(tx);
        engine.serve(&session(), SeqNo::new(3), b"peer=3");

        engine.fetch(&session(), SeqNo::new(3), 5).unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            EngineEvent::Fetched {
                session: session(),
                seq: SeqNo::new(3),
                content: b"peer=3".to_vec(),
            }
        );
        assert_eq!(engine.fetches()[0].max_attempts, 5);
    }

    #[test]
    fn unserved_fetch_is_silent() {
        let mut engine = MockEngine::new();
        let (tx, mut rx) = event_channel();
        engine.register_missing_update_callback(tx);

        engine.fetch(&session(), SeqNo::new(9), 5).unwrap();

        assert!(rx.try_recv().is_err());
        assert_eq!(engine.fetches().len(), 1);
    }

    #[test]
    fn inject_requires_callback() {
        let mut engine = MockEngine::new();
        assert!(!engine.inject(vec![]));

        let (tx, mut rx) = event_channel();
        engine.register_missing_update_callback(tx);
        let range = MissingRange::new(session(), SeqNo::new(1), SeqNo::new(2));
        assert!(engine.inject(vec![range.clone()]));
        assert_eq!(
            rx.try_recv().unwrap(),
            EngineEvent::MissingRanges(vec![range])
        );
    }

    // ===========================================
    // Error Condition Tests
    // ===========================================

    #[test]
    fn forced_publish_failure_is_one_shot() {
        let mut engine = MockEngine::new();
        engine.fail_next_publish("queue full");

        let result = engine.publish(b"x".to_vec(), Duration::ZERO);
        assert_eq!(
            result,
            Err(EngineError::PublishRejected("queue full".into()))
        );

        engine.publish(b"x".to_vec(), Duration::ZERO).unwrap();
        assert_eq!(engine.published().len(), 1);
    }

    #[test]
    fn forced_fetch_failure_is_not_recorded() {
        let mut engine = MockEngine::new();
        engine.fail_next_fetch("no route");

        assert!(engine.fetch(&session(), SeqNo::new(1), 5).is_err());
        assert!(engine.fetches().is_empty());
    }

    #[test]
    fn calls_after_shutdown_are_refused() {
        let mut engine = MockEngine::new();
        let (tx, _rx) = event_channel();
        engine.register_missing_update_callback(tx);
        engine.shutdown();
        engine.shutdown();

        assert_eq!(engine.shutdown_calls(), 2);
        assert!(engine.is_closed());
        assert!(!engine.has_callback());
        assert_eq!(
            engine.publish(b"x".to_vec(), Duration::ZERO),
            Err(EngineError::Closed)
        );
        assert_eq!(
            engine.fetch(&session(), SeqNo::new(1), 1),
            Err(EngineError::Closed)
        );
    }
}
