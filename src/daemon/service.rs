//! Timer service that hosts the engine on a single task.
//!
//! The service owns the [`TimerEngine`] and serializes commands with the
//! engine's tick deadline, so a tick never interleaves with a command.
//! Other tasks talk to it through a cloneable [`TimerHandle`].

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::types::{SessionState, TimerSnapshot};

use super::timer::TimerEngine;

/// Commands accepted by the timer service.
#[derive(Debug)]
pub enum TimerCommand {
    /// Start a focus session; replies whether it started
    StartFocus(oneshot::Sender<bool>),
    /// Reset to idle
    Reset(oneshot::Sender<()>),
    /// Stop the service
    Shutdown,
}

/// Task that owns the timer engine.
pub struct TimerService {
    engine: TimerEngine,
    commands: mpsc::UnboundedReceiver<TimerCommand>,
}

impl TimerService {
    /// Wraps an engine, returning the service and a handle to drive it.
    pub fn new(engine: TimerEngine) -> (Self, TimerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = TimerHandle {
            commands: tx,
            snapshots: engine.subscribe(),
        };
        let service = Self {
            engine,
            commands: rx,
        };
        (service, handle)
    }

    /// Runs until shut down or until every handle is dropped.
    pub async fn run(mut self) {
        info!(state = %self.engine.current_state(), "Timer service started");

        loop {
            let deadline = self.engine.next_deadline();

            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(TimerCommand::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                () = wait_for_tick(deadline) => {
                    if let Some(transition) = self.engine.tick() {
                        debug!(?transition, "Timer transition");
                    }
                }
            }
        }

        self.engine.reset();
        info!("Timer service stopped");
    }

    fn handle(&mut self, command: TimerCommand) {
        match command {
            TimerCommand::StartFocus(reply) => {
                let started = self.engine.start_focus();
                let _ = reply.send(started);
            }
            TimerCommand::Reset(reply) => {
                self.engine.reset();
                let _ = reply.send(());
            }
            TimerCommand::Shutdown => {}
        }
    }
}

/// Sleeps until the deadline, or forever when no tick is scheduled.
async fn wait_for_tick(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Cloneable handle to a running [`TimerService`].
#[derive(Debug, Clone)]
pub struct TimerHandle {
    commands: mpsc::UnboundedSender<TimerCommand>,
    snapshots: watch::Receiver<TimerSnapshot>,
}

impl TimerHandle {
    /// Starts a focus session. Returns false if one was already running.
    pub async fn start_focus(&self) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(TimerCommand::StartFocus(tx))
            .context("Timer service is not running")?;
        rx.await.context("Timer service dropped the start command")
    }

    /// Resets the timer to idle.
    pub async fn reset(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(TimerCommand::Reset(tx))
            .context("Timer service is not running")?;
        rx.await.context("Timer service dropped the reset command")
    }

    /// Asks the service to stop. Safe to call more than once.
    pub fn shutdown(&self) {
        let _ = self.commands.send(TimerCommand::Shutdown);
    }

    /// Returns the most recently published state.
    pub fn current_state(&self) -> SessionState {
        self.snapshots.borrow().state
    }

    /// Returns the most recently published snapshot.
    pub fn snapshot(&self) -> TimerSnapshot {
        *self.snapshots.borrow()
    }

    /// Subscribes to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshots.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================
