//! Jittered tick scheduler.
//!
//! Holds at most one pending deadline. Arming never blocks: it draws a
//! delay and records when the tick is due. The reactor awaits
//! [`Scheduler::fired`] alongside its other work.

use bench_core::JitterSampler;
use std::time::Duration;
use tokio::time::Instant;

/// Arms one jittered tick at a time on the reactor's timer.
#[derive(Debug)]
pub struct Scheduler {
    sampler: JitterSampler,
    deadline: Option<Instant>,
}

impl Scheduler {
    /// Create a scheduler with no tick armed.
    pub fn new(sampler: JitterSampler) -> Self {
        Self {
            sampler,
            deadline: None,
        }
    }

    /// Arm the next tick after one jittered delay.
    ///
    /// Returns `false` and leaves the pending tick untouched if one is
    /// already armed.
    pub fn schedule_next(&mut self) -> bool {
        if self.deadline.is_some() {
            tracing::warn!("tick already pending, not arming another");
            return false;
        }
        let delay = self.sampler.next_delay();
        self.deadline = Some(Instant::now() + delay);
        tracing::trace!(delay_ms = delay.as_millis() as u64, "tick armed");
        true
    }

    /// True while a tick is armed and has not fired.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the pending tick is due.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the pending tick, zero if overdue.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Drop the pending tick, if any.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Wait for the pending tick and disarm it.
    ///
    /// Never completes while nothing is armed. Cancel safe: if the future
    /// is dropped before the deadline, the tick stays armed.
    pub async fn fired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                tokio::time::sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending().await,
        }
    }
}
