//! Timer engine for the focus coach.
//!
//! This module provides the core timer functionality:
//! - State transitions (Idle → Focus → Break → Idle)
//! - One-second countdown driven by a recurring tick handle
//! - Transition events for notifications and chat prompts
//! - Snapshot publishing for display

use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, Instant};
use tracing::{debug, info, trace};

use crate::types::{CoachConfig, SessionState, TimerSession, TimerSnapshot};

/// Period of the recurring countdown tick.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

// ============================================================================
// TimerEvent
// ============================================================================

/// Transition events delivered to listeners outside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// A break has started
    BreakStarted,
    /// The coach should suggest a break activity
    ActiveBreakPrompt,
}

impl TimerEvent {
    /// Returns the event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerEvent::BreakStarted => "break-started",
            TimerEvent::ActiveBreakPrompt => "active-break-prompt",
        }
    }
}

impl std::fmt::Display for TimerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state change performed by a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    FocusToBreak,
    BreakToIdle,
}

// ============================================================================
// TickHandle
// ============================================================================

/// Handle to the recurring one-second tick.
///
/// Holds the absolute deadline of the next tick. Dropping the handle
/// cancels the schedule.
#[derive(Debug)]
pub struct TickHandle {
    deadline: Instant,
}

impl TickHandle {
    fn schedule() -> Self {
        Self {
            deadline: Instant::now() + TICK_PERIOD,
        }
    }

    /// Returns when the next tick is due.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Moves the deadline one period forward, skipping periods already missed.
    fn advance(&mut self) {
        self.deadline += TICK_PERIOD;
        let now = Instant::now();
        if self.deadline <= now {
            self.deadline = now + TICK_PERIOD;
        }
    }
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Timer engine that owns the focus/break session and emits its events.
pub struct TimerEngine {
    /// Current countdown session
    session: TimerSession,
    /// Recurring tick; present iff the session is not idle
    tick_handle: Option<TickHandle>,
    /// Event sender channel
    event_tx: mpsc::UnboundedSender<TimerEvent>,
    /// Latest snapshot for display readers
    snapshot_tx: watch::Sender<TimerSnapshot>,
}

impl TimerEngine {
    /// Creates a new idle TimerEngine with the given configuration and event channel.
    pub fn new(config: &CoachConfig, event_tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        let session = TimerSession::new(config);
        let (snapshot_tx, _) = watch::channel(session.snapshot());

        Self {
            session,
            tick_handle: None,
            event_tx,
            snapshot_tx,
        }
    }

    /// Starts a focus session.
    ///
    /// Ignored unless the timer is idle. Returns true if the session started.
    pub fn start_focus(&mut self) -> bool {
        debug!(state = %self.session.state(), "start_focus called");
        if self.session.state() != SessionState::Idle {
            return false;
        }

        self.session.enter_focus();
        self.cancel_tick();
        self.tick_handle = Some(TickHandle::schedule());
        self.publish();

        info!(
            remaining = self.session.remaining(),
            "Focus session started"
        );
        true
    }

    /// Forces the timer back to idle without emitting events.
    pub fn reset(&mut self) {
        self.cancel_tick();
        self.session.enter_idle();
        self.publish();
        info!("Timer reset to idle");
    }

    /// Advances the countdown by one second.
    ///
    /// Has no effect while no tick is scheduled.
    pub fn tick(&mut self) -> Option<Transition> {
        let Some(handle) = self.tick_handle.as_mut() else {
            trace!("Tick without a scheduled handle ignored");
            return None;
        };
        handle.advance();

        let transition = if self.session.count_down() {
            self.complete_phase()
        } else {
            None
        };

        self.publish();
        transition
    }

    /// Performs the terminal transition for the current state.
    fn complete_phase(&mut self) -> Option<Transition> {
        match self.session.state() {
            SessionState::Focus => {
                info!("Focus time finished, starting break");
                self.session.enter_break();
                self.emit(TimerEvent::BreakStarted);
                self.emit(TimerEvent::ActiveBreakPrompt);
                Some(Transition::FocusToBreak)
            }
            SessionState::Break => {
                info!("Break time finished, back to idle");
                self.cancel_tick();
                self.session.enter_idle();
                Some(Transition::BreakToIdle)
            }
            SessionState::Idle => {
                self.cancel_tick();
                None
            }
        }
    }

    fn emit(&self, event: TimerEvent) {
        if self.event_tx.send(event).is_err() {
            debug!(event = %event, "No event listener attached, event dropped");
        }
    }

    fn cancel_tick(&mut self) {
        if self.tick_handle.take().is_some() {
            trace!("Recurring tick cancelled");
        }
    }

    fn publish(&self) {
        debug_assert_eq!(
            self.tick_handle.is_some(),
            self.session.state().is_counting(),
            "tick handle must be scheduled exactly while counting"
        );
        self.snapshot_tx.send_replace(self.session.snapshot());
    }

    /// Returns the current state.
    pub fn current_state(&self) -> SessionState {
        self.session.state()
    }

    /// Returns the remaining seconds (may be transiently negative inside a tick).
    pub fn remaining(&self) -> i64 {
        self.session.remaining()
    }

    /// Returns the current `(state, remaining)` pair.
    pub fn snapshot(&self) -> TimerSnapshot {
        self.session.snapshot()
    }

    /// Returns true while a recurring tick is scheduled.
    pub fn is_ticking(&self) -> bool {
        self.tick_handle.is_some()
    }

    /// Returns the deadline of the next tick, if one is scheduled.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tick_handle.as_ref().map(TickHandle::deadline)
    }

    /// Subscribes to the snapshots published after every change.
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Returns the underlying session.
    pub fn session(&self) -> &TimerSession {
        &self.session
    }
}

// ============================================================================
// Tests
// ============================================================================
