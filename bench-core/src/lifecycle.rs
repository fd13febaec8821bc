//! Lifecycle state machine for one harness node.
//!
//! This module provides a pure, side-effect-free state machine for the
//! node lifecycle. It takes events as input and produces a new state plus a
//! list of actions to execute.
//!
//! The actual work (arming timers, publishing, releasing the engine) is
//! performed by the reactor in bench-node, not by this module.
//!
//! ```text
//! Init --Start--> Running --Tick(Done)--> ShuttingDown --ReactorStopped--> Stopped
//!                   ^   |
//!                   +---+ Tick(Run | Drain)
//! ```

use crate::clock::ExperimentPhase;

/// Node lifecycle - NO I/O, just state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, reactor not started.
    Init,
    /// Reactor running, ticks and engine callbacks being processed.
    Running,
    /// Engine released, reactor asked to stop.
    ShuttingDown,
    /// Reactor returned. Terminal.
    Stopped,
}

impl LifecycleState {
    /// Create a new state machine in the Init state.
    pub fn new() -> Self {
        Self::Init
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. Every tick handled while
    /// running yields at most one [`LifecycleAction::ArmTick`], which keeps a
    /// single scheduled tick outstanding.
    pub fn on_event(self, event: LifecycleEvent) -> (Self, Vec<LifecycleAction>) {
        match (self, event) {
            (Self::Init, LifecycleEvent::Start) => (
                Self::Running,
                vec![LifecycleAction::RegisterCallback, LifecycleAction::ArmTick],
            ),

            (Self::Running, LifecycleEvent::Tick { phase }) => match phase {
                ExperimentPhase::Run => (
                    Self::Running,
                    vec![LifecycleAction::Publish, LifecycleAction::ArmTick],
                ),
                ExperimentPhase::Warmup | ExperimentPhase::Drain => {
                    (Self::Running, vec![LifecycleAction::ArmTick])
                }
                ExperimentPhase::Done => (
                    Self::ShuttingDown,
                    vec![LifecycleAction::ReleaseEngine, LifecycleAction::StopReactor],
                ),
            },

            (Self::ShuttingDown, LifecycleEvent::ReactorStopped) => (Self::Stopped, vec![]),

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// True while the engine handle may be used for publish and fetch.
    pub fn accepts_engine_calls(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// True once the reactor has returned.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl Default for LifecycleState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events that drive the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Engine constructed; start the reactor.
    Start,
    /// A scheduled tick fired and the clock placed it in `phase`.
    Tick {
        /// Phase observed by the tick.
        phase: ExperimentPhase,
    },
    /// The reactor loop returned control.
    ReactorStopped,
}

/// Actions to be executed by the reactor.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    /// Hand the engine the sender for missing-update notifications.
    RegisterCallback,
    /// Arm the next jittered tick.
    ArmTick,
    /// Publish the next item.
    Publish,
    /// Shut the engine down and drop the handle.
    ReleaseEngine,
    /// Stop accepting reactor work.
    StopReactor,
}
