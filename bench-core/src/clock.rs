//! Experiment clock and phase computation.
//!
//! The phase is never stored. It is recomputed from the elapsed time since
//! the first tick every time it is asked for, so there is no accumulated
//! drift and two observers asking at the same instant always agree.

use std::time::{Duration, Instant};

use crate::config::ExperimentConfig;

/// Time-bounded stages of one benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExperimentPhase {
    /// No tick observed yet (library setup, network join).
    Warmup,
    /// Publishing.
    Run,
    /// Not publishing, still observing remote updates.
    Drain,
    /// Observation window is over.
    Done,
}

impl ExperimentPhase {
    /// True only in the publishing phase.
    pub fn is_publishing(&self) -> bool {
        matches!(self, Self::Run)
    }
}

/// Phase at `now` for a run that started at `start`.
///
/// `start == None` means no tick has happened yet, which is always WARMUP.
/// Boundaries are inclusive: elapsed exactly equal to `run` is still RUN.
pub fn phase(
    now: Instant,
    start: Option<Instant>,
    run: Duration,
    drain: Duration,
) -> ExperimentPhase {
    let Some(start) = start else {
        return ExperimentPhase::Warmup;
    };
    let elapsed = now.saturating_duration_since(start);
    if elapsed <= run {
        ExperimentPhase::Run
    } else if elapsed <= run.saturating_add(drain) {
        ExperimentPhase::Drain
    } else {
        ExperimentPhase::Done
    }
}

/// Tracks the start of a run and answers phase queries against it.
///
/// The start is set lazily by the first [`observe`](Self::observe), not at
/// construction, so startup delay is absorbed into WARMUP instead of
/// eating into RUN.
#[derive(Debug, Clone)]
pub struct ExperimentClock {
    start: Option<Instant>,
    run: Duration,
    drain: Duration,
}

impl ExperimentClock {
    /// Create a clock with no start time.
    pub fn new(config: &ExperimentConfig) -> Self {
        Self {
            start: None,
            run: config.run_duration(),
            drain: config.drain_duration(),
        }
    }

    /// Record a tick at `now` and return the phase it falls in.
    ///
    /// The first call fixes the start time.
    pub fn observe(&mut self, now: Instant) -> ExperimentPhase {
        let start = *self.start.get_or_insert(now);
        phase(now, Some(start), self.run, self.drain)
    }

    /// Phase at `now` without recording a tick.
    pub fn phase_at(&self, now: Instant) -> ExperimentPhase {
        phase(now, self.start, self.run, self.drain)
    }

    /// Time of the first tick, if any.
    pub fn start(&self) -> Option<Instant> {
        self.start
    }

    /// Time since the first tick (zero before it).
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.start
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default()
    }
}
