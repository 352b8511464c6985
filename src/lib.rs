//! Focus Coach Library
//!
//! This library provides the core functionality for the focus coach CLI.
//! It includes:
//! - Timer engine cycling between focus, break and idle
//! - Event bridge delivering timer events to notifications and the coach
//! - Chat coach on top of OpenAI-compatible chat completion services
//! - Speech input and output through external commands
//! - IPC server/client for daemon-CLI communication
//! - Display adapter and CLI utilities

pub mod chat;
pub mod cli;
pub mod coach;
pub mod daemon;
pub mod logging;
pub mod notification;
pub mod speech;
pub mod types;
pub mod view;

// Re-export commonly used types for convenience
pub use types::{
    CoachConfig, IpcRequest, IpcResponse, ResponseData, SessionState, TimerSession, TimerSnapshot,
};

pub use chat::{ChatBackend, ChatError, ChatMessage, ChatProvider, ChatSettings, MockChatBackend};
pub use coach::Coach;
pub use daemon::{EventBridge, TimerEngine, TimerEvent, TimerHandle, TimerService};
pub use notification::{MockNotificationSender, Notification, NotificationError, NotificationSender};
pub use speech::{MockSpeech, SpeechCapability, SpeechError};
pub use view::{format_time, ClockView};
