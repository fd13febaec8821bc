//! Lifecycle controller - runs one node from engine setup to shutdown.
//!
//! The controller interprets the actions of the pure lifecycle state
//! machine from bench-core. Everything it touches lives in one future on
//! one thread:
//!
//! 1. Build the engine, register the local namespace, write `NODE_INIT`
//! 2. `Start`: hand the engine the event sender, arm the first tick
//! 3. Loop over the tick deadline and the engine event channel
//! 4. A tick in DONE releases the engine and stops the loop
//!
//! Engine events that are still queued when the loop stops are dropped
//! with the channel.

use bench_core::{
    ExperimentClock, ExperimentConfig, ExperimentPhase, JitterSampler, LifecycleAction,
    LifecycleEvent, LifecycleState, Publisher,
};
use bench_engine::{event_channel, EngineError, EngineEvent, EngineEventSender, SyncEngine};
use bench_types::{EventRecord, NodeIdentity};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::HarnessError;
use crate::reconciler::UpdateReconciler;
use crate::scheduler::Scheduler;
use crate::sink::ObservationSink;

/// What one node did during its run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// The node's identity.
    pub identity: NodeIdentity,
    /// Lifecycle state when `run` returned.
    pub final_state: LifecycleState,
    /// Ticks that fired, the final DONE tick included.
    pub ticks: u64,
    /// Items handed to the engine.
    pub publishes_attempted: u64,
    /// Publish calls the engine rejected.
    pub publishes_failed: u64,
    /// Remote sequence numbers reported missing.
    pub states_seen: u64,
    /// Fetch requests the engine accepted.
    pub fetches_issued: u64,
    /// Fetch requests the engine rejected.
    pub fetch_errors: u64,
    /// Fetched items recorded, duplicates included.
    pub messages_received: u64,
    /// Time from the first tick to the last one.
    pub elapsed: Duration,
}

/// Drives one node through its experiment.
#[derive(Debug)]
pub struct LifecycleController<S> {
    identity: NodeIdentity,
    config: ExperimentConfig,
    sink: S,
    sampler: Option<JitterSampler>,
}

impl<S: ObservationSink> LifecycleController<S> {
    /// Create a controller for `identity` that reports to `sink`.
    pub fn new(identity: NodeIdentity, config: ExperimentConfig, sink: S) -> Self {
        Self {
            identity,
            config,
            sink,
            sampler: None,
        }
    }

    /// Use `sampler` for tick delays instead of one built from the config.
    pub fn with_sampler(mut self, sampler: JitterSampler) -> Self {
        self.sampler = Some(sampler);
        self
    }

    /// The node's identity.
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Run the node to completion on the current runtime.
    ///
    /// `connect` builds the engine from inside the reactor, so engines
    /// that spawn background tasks spawn them here. Setup failures are
    /// returned; everything after the first tick is logged and absorbed.
    pub async fn run<E, F>(self, connect: F) -> Result<RunSummary, HarnessError>
    where
        E: SyncEngine,
        F: FnOnce() -> Result<E, EngineError>,
    {
        self.config.validate()?;

        let mut engine = connect()?;
        if let Err(e) = engine.add_local_namespace(&self.identity) {
            engine.shutdown();
            return Err(e.into());
        }

        let (events_tx, mut events) = event_channel();
        let sampler = match self.sampler {
            Some(sampler) => sampler,
            None => JitterSampler::from_config(&self.config),
        };
        let mut scheduler = Scheduler::new(sampler);

        let mut reactor = Reactor::new(&self.identity, &self.config, engine, events_tx, self.sink);

        reactor.sink.record(&EventRecord::NodeInit {
            node: self.identity.clone(),
        });
        tracing::info!(node = %self.identity, "node initialized");

        reactor.handle(LifecycleEvent::Start, &mut scheduler);

        while !reactor.stop_requested {
            tokio::select! {
                _ = scheduler.fired() => reactor.on_tick(&mut scheduler),
                Some(event) = events.recv() => reactor.on_engine_event(event),
            }
        }

        scheduler.cancel();
        drop(events);
        reactor.handle(LifecycleEvent::ReactorStopped, &mut scheduler);

        let summary = reactor.summary(self.identity);
        tracing::info!(
            node = %summary.identity,
            ticks = summary.ticks,
            published = summary.publishes_attempted - summary.publishes_failed,
            received = summary.messages_received,
            "node stopped"
        );
        Ok(summary)
    }

    /// Build a current-thread runtime and run the node on it.
    pub fn run_blocking<E, F>(self, connect: F) -> Result<RunSummary, HarnessError>
    where
        E: SyncEngine,
        F: FnOnce() -> Result<E, EngineError>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run(connect))
    }
}

/// Harness state for one run. Only ever touched from the reactor thread.
struct Reactor<E, S> {
    state: LifecycleState,
    phase: ExperimentPhase,
    engine: Option<E>,
    events_tx: Option<EngineEventSender>,
    clock: ExperimentClock,
    publisher: Publisher,
    reconciler: UpdateReconciler,
    sink: S,
    ticks: u64,
    publishes_attempted: u64,
    publishes_failed: u64,
    last_tick: Option<Instant>,
    stop_requested: bool,
}

impl<E: SyncEngine, S: ObservationSink> Reactor<E, S> {
    fn new(
        identity: &NodeIdentity,
        config: &ExperimentConfig,
        engine: E,
        events_tx: EngineEventSender,
        sink: S,
    ) -> Self {
        Self {
            state: LifecycleState::new(),
            phase: ExperimentPhase::Warmup,
            engine: Some(engine),
            events_tx: Some(events_tx),
            clock: ExperimentClock::new(config),
            publisher: Publisher::new(identity.clone(), config),
            reconciler: UpdateReconciler::new(identity.clone(), config),
            sink,
            ticks: 0,
            publishes_attempted: 0,
            publishes_failed: 0,
            last_tick: None,
            stop_requested: false,
        }
    }

    fn handle(&mut self, event: LifecycleEvent, scheduler: &mut Scheduler) {
        let (next, actions) = self.state.on_event(event);
        if next != self.state {
            tracing::info!(from = ?self.state, to = ?next, "lifecycle transition");
        }
        self.state = next;

        for action in actions {
            self.execute(action, scheduler);
        }
    }

    fn execute(&mut self, action: LifecycleAction, scheduler: &mut Scheduler) {
        match action {
            LifecycleAction::RegisterCallback => {
                let events = self.events_tx.take();
                if let (Some(engine), Some(events)) = (self.engine.as_mut(), events) {
                    engine.register_missing_update_callback(events);
                }
            }
            LifecycleAction::ArmTick => {
                scheduler.schedule_next();
            }
            LifecycleAction::Publish => self.publish(),
            LifecycleAction::ReleaseEngine => {
                if let Some(mut engine) = self.engine.take() {
                    engine.shutdown();
                    tracing::info!("engine released");
                }
            }
            LifecycleAction::StopReactor => self.stop_requested = true,
        }
    }

    fn on_tick(&mut self, scheduler: &mut Scheduler) {
        let now = Instant::now();
        let phase = self.clock.observe(now.into_std());
        self.ticks += 1;
        self.last_tick = Some(now);
        self.phase = phase;
        tracing::debug!(
            ?phase,
            elapsed_ms = self.clock.elapsed(now.into_std()).as_millis() as u64,
            "tick"
        );
        self.handle(LifecycleEvent::Tick { phase }, scheduler);
    }

    fn publish(&mut self) {
        let Some(publication) = self.publisher.on_tick(self.phase) else {
            return;
        };
        let Some(engine) = self.engine.as_mut() else {
            tracing::debug!(
                counter = publication.counter,
                "engine released, skipping publish"
            );
            return;
        };

        self.publishes_attempted += 1;
        let message = publication.message();
        match engine.publish(publication.payload, publication.freshness) {
            Ok(()) => self.sink.record(&EventRecord::Published {
                node: self.publisher.identity().clone(),
                message,
            }),
            Err(e) => {
                self.publishes_failed += 1;
                tracing::warn!(counter = publication.counter, "publish failed: {e}");
            }
        }
    }

    fn on_engine_event(&mut self, event: EngineEvent) {
        if !self.state.accepts_engine_calls() {
            tracing::debug!(state = ?self.state, "ignoring engine event");
            return;
        }

        match event {
            EngineEvent::MissingRanges(ranges) => {
                self.reconciler
                    .on_missing_ranges(&ranges, self.engine.as_mut(), &mut self.sink);
            }
            EngineEvent::Fetched {
                session,
                seq,
                content,
            } => {
                tracing::trace!(%session, %seq, bytes = content.len(), "fetched");
                self.reconciler.on_fetched(&content, &mut self.sink);
            }
        }
    }

    fn summary(&self, identity: NodeIdentity) -> RunSummary {
        RunSummary {
            identity,
            final_state: self.state,
            ticks: self.ticks,
            publishes_attempted: self.publishes_attempted,
            publishes_failed: self.publishes_failed,
            states_seen: self.reconciler.states_seen(),
            fetches_issued: self.reconciler.fetches_issued(),
            fetch_errors: self.reconciler.fetch_errors(),
            messages_received: self.reconciler.messages_received(),
            elapsed: self
                .last_tick
                .map(|tick| self.clock.elapsed(tick.into_std()))
                .unwrap_or_default(),
        }
    }
}
