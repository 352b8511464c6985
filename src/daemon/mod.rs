//! Daemon module for the focus coach.
//!
//! This module contains the core daemon functionality:
//! - `timer`: Timer engine with state transitions and countdown logic
//! - `service`: Task that owns the engine and drives its ticks
//! - `bridge`: Delivery of timer events to notifications and the coach
//! - `ipc`: Unix socket server and request handling
//! - `runtime`: Wiring of all components

pub mod bridge;
pub mod ipc;
pub mod runtime;
pub mod service;
pub mod timer;

pub use bridge::{BreakNotifier, BreakPromptInjector, EventBridge, TimerEventListener};
pub use ipc::{default_socket_path, IpcServer, RequestHandler};
pub use runtime::{Collaborators, DaemonConfig};
pub use service::{TimerHandle, TimerService};
pub use timer::{TimerEngine, TimerEvent, Transition};
