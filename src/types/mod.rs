//! Core data types for the focus coach.
//!
//! This module defines the data structures used for:
//! - Session state and the countdown session
//! - Timer configuration with validation
//! - IPC request/response serialization

use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;

// ============================================================================
// SessionState
// ============================================================================

/// Represents the current state of the focus timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for the user to start a focus session
    #[default]
    Idle,
    /// Counting down a focus session
    Focus,
    /// Counting down a break
    Break,
}

impl SessionState {
    /// Returns the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Focus => "focus",
            SessionState::Break => "break",
        }
    }

    /// Returns true if a countdown is running in this state.
    pub fn is_counting(&self) -> bool {
        !matches!(self, SessionState::Idle)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CoachConfig
// ============================================================================

/// Default focus duration (20 minutes).
pub const DEFAULT_FOCUS_SECONDS: u32 = 20 * 60;

/// Default break duration (5 minutes).
pub const DEFAULT_BREAK_SECONDS: u32 = 5 * 60;

/// Timer durations, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachConfig {
    /// Focus duration in seconds (1-7200)
    pub focus_seconds: u32,
    /// Break duration in seconds (1-3600)
    pub break_seconds: u32,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            focus_seconds: DEFAULT_FOCUS_SECONDS,
            break_seconds: DEFAULT_BREAK_SECONDS,
        }
    }
}

impl CoachConfig {
    /// Creates a new configuration with the specified focus duration.
    pub fn with_focus_seconds(mut self, seconds: u32) -> Self {
        self.focus_seconds = seconds;
        self
    }

    /// Creates a new configuration with the specified break duration.
    pub fn with_break_seconds(mut self, seconds: u32) -> Self {
        self.break_seconds = seconds;
        self
    }

    /// Break length in whole minutes, rounded up. Used in user-facing text.
    pub fn break_minutes(&self) -> u32 {
        self.break_seconds.div_ceil(60)
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.focus_seconds < 1 || self.focus_seconds > 7200 {
            return Err("focus duration must be between 1 second and 120 minutes".to_string());
        }
        if self.break_seconds < 1 || self.break_seconds > 3600 {
            return Err("break duration must be between 1 second and 60 minutes".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// TimerSession
// ============================================================================

/// The countdown session owned by the timer engine.
///
/// `remaining` is signed: a tick may take it to -1 for the instant before
/// the terminal transition resets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSession {
    state: SessionState,
    remaining: i64,
    focus_duration: u32,
    break_duration: u32,
}

impl TimerSession {
    /// Creates an idle session pre-loaded with the focus duration.
    pub fn new(config: &CoachConfig) -> Self {
        Self {
            state: SessionState::Idle,
            remaining: i64::from(config.focus_seconds),
            focus_duration: config.focus_seconds,
            break_duration: config.break_seconds,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    pub fn focus_duration(&self) -> u32 {
        self.focus_duration
    }

    pub fn break_duration(&self) -> u32 {
        self.break_duration
    }

    /// Enters the focus state with a full focus countdown.
    pub fn enter_focus(&mut self) {
        self.state = SessionState::Focus;
        self.remaining = i64::from(self.focus_duration);
    }

    /// Enters the break state with a full break countdown.
    pub fn enter_break(&mut self) {
        self.state = SessionState::Break;
        self.remaining = i64::from(self.break_duration);
    }

    /// Returns to idle. The focus duration stays loaded for display.
    pub fn enter_idle(&mut self) {
        self.state = SessionState::Idle;
        self.remaining = i64::from(self.focus_duration);
    }

    /// Decrements the countdown by one second.
    ///
    /// Returns true if the countdown has expired (gone below zero).
    pub fn count_down(&mut self) -> bool {
        self.remaining -= 1;
        self.remaining < 0
    }

    /// Returns the `(state, remaining)` pair.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            remaining: self.remaining,
        }
    }
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// A published view of the session, pushed to readers after every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub state: SessionState,
    pub remaining: i64,
}

impl TimerSnapshot {
    /// Remaining seconds clamped to zero, for display.
    pub fn display_seconds(&self) -> u32 {
        u32::try_from(self.remaining.max(0)).unwrap_or(u32::MAX)
    }
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
    /// Start a focus session (ignored unless idle)
    Start,
    /// Reset the timer to idle
    Reset,
    /// Query the current status
    Status,
    /// Send a message to the coach
    Chat {
        /// Message text
        message: String,
    },
    /// Fetch the conversation so far
    History,
    /// Listen for a spoken message and send it to the coach
    Listen,
}

impl IpcRequest {
    /// Returns true if sending the request twice is harmless.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, IpcRequest::Chat { .. } | IpcRequest::Listen)
    }
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseData {
    /// Current state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<SessionState>,
    /// Remaining seconds, clamped to zero
    #[serde(rename = "remainingSeconds", skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,
    /// What the user said, for spoken messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    /// Coach reply to a chat message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    /// Conversation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
}

impl ResponseData {
    /// Creates response data from a timer snapshot.
    pub fn from_snapshot(snapshot: &TimerSnapshot) -> Self {
        Self {
            state: Some(snapshot.state),
            remaining_seconds: Some(snapshot.display_seconds()),
            ..Default::default()
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true if this is an error response.
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Role;

    // ------------------------------------------------------------------------
    // SessionState Tests
    // ------------------------------------------------------------------------

    mod session_state_tests {
        use super::*;

        #[test]
        fn test_default_is_idle() {
            assert_eq!(SessionState::default(), SessionState::Idle);
        }

        #[test]
        fn test_as_str() {
            assert_eq!(SessionState::Idle.as_str(), "idle");
            assert_eq!(SessionState::Focus.as_str(), "focus");
            assert_eq!(SessionState::Break.as_str(), "break");
        }

        #[test]
        fn test_is_counting() {
            assert!(!SessionState::Idle.is_counting());
            assert!(SessionState::Focus.is_counting());
            assert!(SessionState::Break.is_counting());
        }

        #[test]
        fn test_serialize_deserialize() {
            let json = serde_json::to_string(&SessionState::Break).unwrap();
            assert_eq!(json, "\"break\"");

            let state: SessionState = serde_json::from_str("\"focus\"").unwrap();
            assert_eq!(state, SessionState::Focus);
        }

        #[test]
        fn test_display() {
            assert_eq!(SessionState::Focus.to_string(), "focus");
        }
    }

    // ------------------------------------------------------------------------
    // CoachConfig Tests
    // ------------------------------------------------------------------------

    mod coach_config_tests {
        use super::*;

        #[test]
        fn test_default_values() {
            let config = CoachConfig::default();
            assert_eq!(config.focus_seconds, 1200);
            assert_eq!(config.break_seconds, 300);
            assert_eq!(config.break_minutes(), 5);
        }

        #[test]
        fn test_builder_pattern() {
            let config = CoachConfig::default()
                .with_focus_seconds(3)
                .with_break_seconds(2);

            assert_eq!(config.focus_seconds, 3);
            assert_eq!(config.break_seconds, 2);
        }

        #[test]
        fn test_break_minutes_rounds_up() {
            let config = CoachConfig::default().with_break_seconds(90);
            assert_eq!(config.break_minutes(), 2);
        }

        #[test]
        fn test_validate_boundary_values() {
            let config = CoachConfig::default()
                .with_focus_seconds(1)
                .with_break_seconds(1);
            assert!(config.validate().is_ok());

            let config = CoachConfig::default()
                .with_focus_seconds(7200)
                .with_break_seconds(3600);
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_validate_focus_out_of_range() {
            assert!(CoachConfig::default().with_focus_seconds(0).validate().is_err());
            assert!(CoachConfig::default().with_focus_seconds(7201).validate().is_err());
        }

        #[test]
        fn test_validate_break_out_of_range() {
            assert!(CoachConfig::default().with_break_seconds(0).validate().is_err());
            assert!(CoachConfig::default().with_break_seconds(3601).validate().is_err());
        }
    }

    // ------------------------------------------------------------------------
    // TimerSession Tests
    // ------------------------------------------------------------------------

    mod timer_session_tests {
        use super::*;

        fn short_config() -> CoachConfig {
            CoachConfig::default()
                .with_focus_seconds(3)
                .with_break_seconds(2)
        }

        #[test]
        fn test_new_session_is_idle_and_preloaded() {
            let session = TimerSession::new(&short_config());

            assert_eq!(session.state(), SessionState::Idle);
            assert_eq!(session.remaining(), 3);
            assert_eq!(session.focus_duration(), 3);
            assert_eq!(session.break_duration(), 2);
        }

        #[test]
        fn test_enter_states_reset_remaining() {
            let mut session = TimerSession::new(&short_config());

            session.enter_focus();
            assert_eq!(session.state(), SessionState::Focus);
            assert_eq!(session.remaining(), 3);

            session.enter_break();
            assert_eq!(session.state(), SessionState::Break);
            assert_eq!(session.remaining(), 2);

            session.enter_idle();
            assert_eq!(session.state(), SessionState::Idle);
            assert_eq!(session.remaining(), 3);
        }

        #[test]
        fn test_count_down_expires_below_zero() {
            let mut session = TimerSession::new(&short_config());
            session.enter_break();

            assert!(!session.count_down());
            assert_eq!(session.remaining(), 1);
            assert!(!session.count_down());
            assert_eq!(session.remaining(), 0);
            assert!(session.count_down());
            assert_eq!(session.remaining(), -1);
        }

        #[test]
        fn test_snapshot_clamps_for_display() {
            let snapshot = TimerSnapshot {
                state: SessionState::Focus,
                remaining: -1,
            };
            assert_eq!(snapshot.display_seconds(), 0);

            let snapshot = TimerSnapshot {
                state: SessionState::Focus,
                remaining: 65,
            };
            assert_eq!(snapshot.display_seconds(), 65);
        }
    }

    // ------------------------------------------------------------------------
    // IPC Types Tests
    // ------------------------------------------------------------------------

    mod ipc_tests {
        use super::*;

        #[test]
        fn test_ipc_request_simple_commands_serialize() {
            assert_eq!(
                serde_json::to_string(&IpcRequest::Start).unwrap(),
                r#"{"command":"start"}"#
            );
            assert_eq!(
                serde_json::to_string(&IpcRequest::Reset).unwrap(),
                r#"{"command":"reset"}"#
            );
            assert_eq!(
                serde_json::to_string(&IpcRequest::Status).unwrap(),
                r#"{"command":"status"}"#
            );
            assert_eq!(
                serde_json::to_string(&IpcRequest::History).unwrap(),
                r#"{"command":"history"}"#
            );
            assert_eq!(
                serde_json::to_string(&IpcRequest::Listen).unwrap(),
                r#"{"command":"listen"}"#
            );
        }

        #[test]
        fn test_ipc_request_chat_deserialize() {
            let json = r#"{"command":"chat","message":"hello"}"#;
            let request: IpcRequest = serde_json::from_str(json).unwrap();

            match request {
                IpcRequest::Chat { message } => assert_eq!(message, "hello"),
                _ => panic!("Expected Chat request"),
            }
        }

        #[test]
        fn test_ipc_request_unknown_command_rejected() {
            let result: Result<IpcRequest, _> = serde_json::from_str(r#"{"command":"pause"}"#);
            assert!(result.is_err());
        }

        #[test]
        fn test_chat_is_not_retryable() {
            assert!(IpcRequest::Start.is_retryable());
            assert!(IpcRequest::Status.is_retryable());
            assert!(!IpcRequest::Listen.is_retryable());
            assert!(!IpcRequest::Chat {
                message: "x".to_string()
            }
            .is_retryable());
        }

        #[test]
        fn test_response_data_from_snapshot() {
            let snapshot = TimerSnapshot {
                state: SessionState::Break,
                remaining: 42,
            };
            let data = ResponseData::from_snapshot(&snapshot);

            assert_eq!(data.state, Some(SessionState::Break));
            assert_eq!(data.remaining_seconds, Some(42));
            assert!(data.reply.is_none());
        }

        #[test]
        fn test_response_data_state_wire_format() {
            let data = ResponseData::from_snapshot(&TimerSnapshot {
                state: SessionState::Focus,
                remaining: 10,
            });
            let json = serde_json::to_string(&data).unwrap();
            assert!(json.contains("\"state\":\"focus\""));

            let parsed: ResponseData = serde_json::from_str(r#"{"state":"idle"}"#).unwrap();
            assert_eq!(parsed.state, Some(SessionState::Idle));
        }

        #[test]
        fn test_response_data_unknown_state_rejected() {
            let result: Result<ResponseData, _> = serde_json::from_str(r#"{"state":"paused"}"#);
            assert!(result.is_err());
        }

        #[test]
        fn test_ipc_response_success_serialize_omits_empty_fields() {
            let response = IpcResponse::success(
                "OK",
                Some(ResponseData {
                    state: Some(SessionState::Focus),
                    remaining_seconds: Some(1200),
                    ..Default::default()
                }),
            );

            let json = serde_json::to_string(&response).unwrap();
            assert!(json.contains("\"status\":\"success\""));
            assert!(json.contains("\"remainingSeconds\":1200"));
            assert!(!json.contains("reply"));
            assert!(!json.contains("messages"));
        }

        #[test]
        fn test_ipc_response_with_messages_deserialize() {
            let json = r#"{"status":"success","message":"","data":{"messages":[{"role":"user","content":"hi"}]}}"#;
            let response: IpcResponse = serde_json::from_str(json).unwrap();

            let messages = response.data.unwrap().messages.unwrap();
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].role, Role::User);
            assert_eq!(messages[0].content, "hi");
        }

        #[test]
        fn test_ipc_response_error() {
            let response = IpcResponse::error("message is empty");

            assert!(response.is_error());
            assert_eq!(response.message, "message is empty");
            assert!(response.data.is_none());
        }
    }
}
