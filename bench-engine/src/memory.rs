//! In-process state-vector engine.
//!
//! Nodes share one [`MemoryNetwork`] holding every session's item log. Each
//! [`MemoryEngine`] periodically compares the network's state vector (the
//! latest sequence number of every session) with what it has already
//! reported and emits the difference as missing ranges. Fetches read from
//! the shared log after a simulated latency and may be lost.
//!
//! ```text
//! node A --publish--> [ MemoryNetwork: session -> items ] <--compare-- node B
//!                                  ^                                    |
//!                                  +------------- fetch ----------------+
//! ```

use bench_types::{MissingRange, NodeIdentity, RemoteSession, SeqNo};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::engine::{EngineError, EngineEvent, EngineEventSender, SyncEngine};

/// Simulated network behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConditions {
    /// How often each engine compares state vectors.
    pub sync_interval: Duration,
    /// Delay of every fetch attempt.
    pub fetch_latency: Duration,
    /// Probability in `[0, 1]` that a fetch attempt is lost.
    pub fetch_loss: f64,
}

impl Default for NetworkConditions {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_millis(1000),
            fetch_latency: Duration::from_millis(20),
            fetch_loss: 0.0,
        }
    }
}

impl NetworkConditions {
    /// Set the loss probability, clamped to `[0, 1]`.
    pub fn with_loss(mut self, loss: f64) -> Self {
        self.fetch_loss = if loss.is_nan() {
            0.0
        } else {
            loss.clamp(0.0, 1.0)
        };
        self
    }
}

#[derive(Debug, Default)]
struct NetworkInner {
    /// Item payloads per session; index `i` holds sequence number `i + 1`.
    logs: BTreeMap<RemoteSession, Vec<Vec<u8>>>,
    /// Engines joined so far; perturbs per-engine seeds.
    joined: u64,
}

/// Shared store every [`MemoryEngine`] of one experiment publishes into.
///
/// Cheap to clone; clones share state across threads.
#[derive(Debug, Clone)]
pub struct MemoryNetwork {
    inner: Arc<Mutex<NetworkInner>>,
    conditions: NetworkConditions,
    seed: Option<u64>,
}

impl MemoryNetwork {
    /// Create an empty network.
    pub fn new(conditions: NetworkConditions) -> Self {
        Self {
            inner: Arc::new(Mutex::new(NetworkInner::default())),
            conditions: conditions.clone().with_loss(conditions.fetch_loss),
            seed: None,
        }
    }

    /// Seed the loss RNG of every engine joined from now on.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Network conditions in effect.
    pub fn conditions(&self) -> &NetworkConditions {
        &self.conditions
    }

    /// Create an engine attached to this network.
    pub fn join(&self) -> MemoryEngine {
        let joined = {
            let mut inner = self.inner.lock();
            inner.joined += 1;
            inner.joined
        };
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(joined)),
            None => StdRng::from_entropy(),
        };
        MemoryEngine {
            network: self.clone(),
            local: None,
            events: None,
            tasks: Vec::new(),
            rng,
            closed: false,
        }
    }

    fn claim(&self, session: &RemoteSession) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        if inner.logs.contains_key(session) {
            return Err(EngineError::NamespaceTaken(session.to_string()));
        }
        inner.logs.insert(session.clone(), Vec::new());
        Ok(())
    }

    /// Append an item to `session`'s log and return its sequence number.
    fn append(&self, session: &RemoteSession, payload: Vec<u8>) -> SeqNo {
        let mut inner = self.inner.lock();
        let log = inner.logs.entry(session.clone()).or_default();
        log.push(payload);
        head(log)
    }

    /// Content of `(session, seq)`, if published.
    pub fn get(&self, session: &RemoteSession, seq: SeqNo) -> Option<Vec<u8>> {
        let index = usize::try_from(seq.value()).ok()?.checked_sub(1)?;
        let inner = self.inner.lock();
        inner.logs.get(session)?.get(index).cloned()
    }

    /// Latest sequence number of every session (zero for sessions with no items).
    pub fn state_vector(&self) -> Vec<(RemoteSession, SeqNo)> {
        let inner = self.inner.lock();
        inner
            .logs
            .iter()
            .map(|(session, log)| (session.clone(), head(log)))
            .collect()
    }
}

/// Sequence number of the newest item in `log`.
fn head(log: &[Vec<u8>]) -> SeqNo {
    SeqNo::new(log.len() as u64)
}

/// A node's handle on a [`MemoryNetwork`].
///
/// Spawns its comparison loop and fetch tasks on the current tokio runtime;
/// all of them are aborted by [`shutdown`](SyncEngine::shutdown) or drop.
#[derive(Debug)]
pub struct MemoryEngine {
    network: MemoryNetwork,
    local: Option<RemoteSession>,
    events: Option<EngineEventSender>,
    tasks: Vec<JoinHandle<()>>,
    rng: StdRng,
    closed: bool,
}

impl MemoryEngine {
    /// The network this engine is attached to.
    pub fn network(&self) -> &MemoryNetwork {
        &self.network
    }

    fn spawn_comparison_loop(&mut self, events: EngineEventSender) {
        let network = self.network.clone();
        let local = self.local.clone();
        let interval = self.network.conditions.sync_interval;

        let handle = tokio::spawn(async move {
            let mut known: HashMap<RemoteSession, SeqNo> = HashMap::new();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let ranges = diff_state_vector(&mut known, network.state_vector(), local.as_ref());
                if ranges.is_empty() {
                    continue;
                }
                tracing::trace!(ranges = ranges.len(), "state vector advanced");
                if events.send(EngineEvent::MissingRanges(ranges)).is_err() {
                    break;
                }
            }
        });
        self.tasks.push(handle);
    }
}

/// Ranges for every remote session that moved past what `known` recorded,
/// updating `known` as it goes.
fn diff_state_vector(
    known: &mut HashMap<RemoteSession, SeqNo>,
    vector: Vec<(RemoteSession, SeqNo)>,
    local: Option<&RemoteSession>,
) -> Vec<MissingRange> {
    vector
        .into_iter()
        .filter(|(session, _)| Some(session) != local)
        .filter_map(|(session, latest)| {
            let seen = known.get(&session).copied().unwrap_or_default();
            if latest <= seen {
                return None;
            }
            known.insert(session.clone(), latest);
            Some(MissingRange::new(session, seen.next(), latest))
        })
        .collect()
}

impl SyncEngine for MemoryEngine {
    fn add_local_namespace(&mut self, identity: &NodeIdentity) -> Result<(), EngineError> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        let session = identity.session();
        self.network.claim(&session)?;
        self.local = Some(session);
        Ok(())
    }

    fn register_missing_update_callback(&mut self, events: EngineEventSender) {
        if self.closed {
            return;
        }
        self.events = Some(events.clone());
        self.spawn_comparison_loop(events);
    }

    fn publish(&mut self, payload: Vec<u8>, freshness: Duration) -> Result<(), EngineError> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        let session = self
            .local
            .as_ref()
            .ok_or_else(|| EngineError::PublishRejected("no namespace".into()))?;
        let seq = self.network.append(session, payload);
        tracing::trace!(
            %session,
            %seq,
            freshness_ms = freshness.as_millis() as u64,
            "item appended"
        );
        Ok(())
    }

    fn fetch(
        &mut self,
        session: &RemoteSession,
        seq: SeqNo,
        max_attempts: u32,
    ) -> Result<(), EngineError> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        let events = self
            .events
            .clone()
            .ok_or_else(|| EngineError::FetchRejected("no callback".into()))?;

        self.tasks.retain(|task| !task.is_finished());

        let network = self.network.clone();
        let session = session.clone();
        let latency = self.network.conditions.fetch_latency;
        let loss = self.network.conditions.fetch_loss;
        let mut rng = StdRng::seed_from_u64(self.rng.gen());

        let handle = tokio::spawn(async move {
            for attempt in 1..=max_attempts {
                tokio::time::sleep(latency).await;
                let lost = rng.gen_bool(loss);
                match network.get(&session, seq) {
                    Some(content) if !lost => {
                        let _ = events.send(EngineEvent::Fetched {
                            session,
                            seq,
                            content,
                        });
                        return;
                    }
                    _ => tracing::debug!(%session, %seq, attempt, lost, "fetch attempt failed"),
                }
            }
            tracing::debug!(%session, %seq, max_attempts, "fetch abandoned");
        });
        self.tasks.push(handle);
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.events = None;
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for MemoryEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::event_channel;

    fn identity(name: &str) -> NodeIdentity {
        NodeIdentity::new(name).unwrap()
    }

    fn fast_network() -> MemoryNetwork {
        MemoryNetwork::new(NetworkConditions {
            sync_interval: Duration::from_millis(100),
            fetch_latency: Duration::from_millis(10),
            fetch_loss: 0.0,
        })
        .with_seed(1)
    }

    #[test]
    fn state_vector_diff_reports_only_new_items() {
        let mut known = HashMap::new();
        let a = RemoteSession::new("a");
        let b = RemoteSession::new("b");

        let first = diff_state_vector(
            &mut known,
            vec![(a.clone(), SeqNo::new(3)), (b.clone(), SeqNo::new(0))],
            None,
        );
        let expected = MissingRange::new(a.clone(), SeqNo::new(1), SeqNo::new(3));
        assert_eq!(first, vec![expected]);

        let second = diff_state_vector(&mut known, vec![(a.clone(), SeqNo::new(5))], None);
        let expected = MissingRange::new(a.clone(), SeqNo::new(4), SeqNo::new(5));
        assert_eq!(second, vec![expected]);

        let third = diff_state_vector(&mut known, vec![(a.clone(), SeqNo::new(5))], None);
        assert!(third.is_empty());
    }

    #[test]
    fn state_vector_diff_skips_local_session() {
        let mut known = HashMap::new();
        let me = RemoteSession::new("me");
        let ranges = diff_state_vector(&mut known, vec![(me.clone(), SeqNo::new(2))], Some(&me));
        assert!(ranges.is_empty());
    }

    #[test]
    fn namespace_can_only_be_claimed_once() {
        let network = fast_network();
        let mut a = network.join();
        let mut b = network.join();
        a.add_local_namespace(&identity("x")).unwrap();
        assert_eq!(
            b.add_local_namespace(&identity("x")),
            Err(EngineError::NamespaceTaken("x".into()))
        );
    }

    #[test]
    fn publish_without_namespace_is_rejected() {
        let mut engine = fast_network().join();
        assert!(matches!(
            engine.publish(b"x".to_vec(), Duration::ZERO),
            Err(EngineError::PublishRejected(_))
        ));
    }

    #[test]
    fn published_items_get_ascending_seqs() {
        let network = fast_network();
        let mut engine = network.join();
        engine.add_local_namespace(&identity("a")).unwrap();
        engine.publish(b"a=1".to_vec(), Duration::ZERO).unwrap();
        engine.publish(b"a=2".to_vec(), Duration::ZERO).unwrap();

        let session = RemoteSession::new("a");
        assert_eq!(network.get(&session, SeqNo::new(1)), Some(b"a=1".to_vec()));
        assert_eq!(network.get(&session, SeqNo::new(2)), Some(b"a=2".to_vec()));
        assert_eq!(network.get(&session, SeqNo::new(0)), None);
        assert_eq!(network.get(&session, SeqNo::new(3)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn peer_learns_and_fetches_published_item() {
        let network = fast_network();
        let mut a = network.join();
        a.add_local_namespace(&identity("a")).unwrap();

        let mut b = network.join();
        b.add_local_namespace(&identity("b")).unwrap();
        let (tx, mut rx) = event_channel();
        b.register_missing_update_callback(tx);

        a.publish(b"a=1".to_vec(), Duration::from_secs(1)).unwrap();

        let event = rx.recv().await.unwrap();
        let session = RemoteSession::new("a");
        let expected = MissingRange::new(session.clone(), SeqNo::new(1), SeqNo::new(1));
        assert_eq!(event, EngineEvent::MissingRanges(vec![expected]));

        b.fetch(&session, SeqNo::new(1), 5).unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            EngineEvent::Fetched {
                session,
                seq: SeqNo::new(1),
                content: b"a=1".to_vec(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn total_loss_gives_up_silently() {
        let conditions = NetworkConditions::default().with_loss(1.0);
        let network = MemoryNetwork::new(conditions).with_seed(3);
        let mut a = network.join();
        a.add_local_namespace(&identity("a")).unwrap();
        a.publish(b"a=1".to_vec(), Duration::ZERO).unwrap();

        let mut b = network.join();
        b.add_local_namespace(&identity("b")).unwrap();
        let (tx, mut rx) = event_channel();
        b.register_missing_update_callback(tx);
        let first = rx.recv().await;
        assert!(matches!(first, Some(EngineEvent::MissingRanges(_))));

        let session = RemoteSession::new("a");
        b.fetch(&session, SeqNo::new(1), 5).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        while let Ok(event) = rx.try_recv() {
            assert!(!matches!(event, EngineEvent::Fetched { .. }));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_notifications_and_refuses_calls() {
        let network = fast_network();
        let mut b = network.join();
        b.add_local_namespace(&identity("b")).unwrap();
        let (tx, mut rx) = event_channel();
        b.register_missing_update_callback(tx);

        b.shutdown();
        b.shutdown();

        let mut a = network.join();
        a.add_local_namespace(&identity("a")).unwrap();
        a.publish(b"a=1".to_vec(), Duration::ZERO).unwrap();

        // The comparison loop was aborted and the sender dropped.
        assert!(rx.recv().await.is_none());
        assert_eq!(
            b.fetch(&RemoteSession::new("a"), SeqNo::new(1), 1),
            Err(EngineError::Closed)
        );
    }

    #[test]
    fn loss_is_clamped() {
        let conditions = NetworkConditions::default();
        assert_eq!(conditions.clone().with_loss(4.0).fetch_loss, 1.0);
        assert_eq!(conditions.clone().with_loss(-1.0).fetch_loss, 0.0);
        assert_eq!(conditions.with_loss(f64::NAN).fetch_loss, 0.0);
    }
}
