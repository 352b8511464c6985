//! Delivers timer events to the collaborators that react to them.
//!
//! The engine only emits abstract [`TimerEvent`]s. The bridge owns the
//! receiving end of the event channel and hands every event to each attached
//! [`TimerEventListener`] in attach order.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::chat::prompts;
use crate::notification::{Notification, NotificationSender};

use super::timer::TimerEvent;

/// Reacts to timer events. Must not block.
pub trait TimerEventListener: Send + Sync {
    fn on_event(&self, event: TimerEvent);
}

/// Fans timer events out to listeners.
pub struct EventBridge {
    events: mpsc::UnboundedReceiver<TimerEvent>,
    listeners: Vec<Box<dyn TimerEventListener>>,
}

impl EventBridge {
    pub fn new(events: mpsc::UnboundedReceiver<TimerEvent>) -> Self {
        Self {
            events,
            listeners: Vec::new(),
        }
    }

    /// Adds a listener. Listeners receive events in attach order.
    pub fn attach(&mut self, listener: impl TimerEventListener + 'static) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Delivers one event to every listener.
    pub fn dispatch(&self, event: TimerEvent) {
        if self.listeners.is_empty() {
            debug!(event = %event, "No listeners attached, event dropped");
            return;
        }
        debug!(event = %event, listeners = self.listeners.len(), "Dispatching timer event");
        for listener in &self.listeners {
            listener.on_event(event);
        }
    }

    /// Delivers every queued event without waiting. Returns how many were delivered.
    pub fn pump(&mut self) -> usize {
        let mut delivered = 0;
        while let Ok(event) = self.events.try_recv() {
            self.dispatch(event);
            delivered += 1;
        }
        delivered
    }

    /// Delivers events until the engine side of the channel closes.
    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            self.dispatch(event);
        }
        debug!("Event bridge stopped");
    }
}

// ============================================================================
// Listeners
// ============================================================================

/// Shows a notification when a break starts.
pub struct BreakNotifier {
    sender: Arc<dyn NotificationSender>,
    break_minutes: u32,
}

impl BreakNotifier {
    pub fn new(sender: Arc<dyn NotificationSender>, break_minutes: u32) -> Self {
        Self {
            sender,
            break_minutes,
        }
    }
}

impl TimerEventListener for BreakNotifier {
    fn on_event(&self, event: TimerEvent) {
        if event != TimerEvent::BreakStarted {
            return;
        }
        let notification = Notification::break_started(self.break_minutes);
        if let Err(e) = self.sender.send(&notification) {
            warn!(error = %e, suggestion = e.suggestion(), "Failed to show break notification");
        }
    }
}

/// Queues the break-activity prompt for the coach.
pub struct BreakPromptInjector {
    prompts: mpsc::UnboundedSender<String>,
    break_minutes: u32,
}

impl BreakPromptInjector {
    pub fn new(prompts: mpsc::UnboundedSender<String>, break_minutes: u32) -> Self {
        Self {
            prompts,
            break_minutes,
        }
    }
}

impl TimerEventListener for BreakPromptInjector {
    fn on_event(&self, event: TimerEvent) {
        if event != TimerEvent::ActiveBreakPrompt {
            return;
        }
        let prompt = prompts::break_activity_prompt(self.break_minutes);
        if self.prompts.send(prompt).is_err() {
            debug!("Coach prompt queue closed, break prompt dropped");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
