//! Display utilities for the focus coach CLI.
//!
//! This module provides formatted output for:
//! - Timer command results
//! - The clock and status line
//! - Coach replies and the conversation
//! - Error messages

use crate::chat::{ChatMessage, Role};
use crate::types::{IpcResponse, ResponseData, TimerSnapshot};
use crate::view::{self, ClockView};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the result of a start request.
    pub fn show_start_success(response: &IpcResponse) {
        println!("> {}", response.message);
        if let Some(clock) = Self::clock(response.data.as_ref()) {
            println!("  {}", clock);
        }
    }

    /// Shows the result of a reset request.
    pub fn show_reset_success(response: &IpcResponse) {
        println!("[] {}", response.message);
        if let Some(clock) = Self::clock(response.data.as_ref()) {
            println!("  {}", clock);
        }
    }

    /// Shows the current timer status.
    pub fn show_status(response: &IpcResponse) {
        println!("{}", view::TITLE);
        println!("─────────────────────────────");
        match Self::clock(response.data.as_ref()) {
            Some(clock) => println!("{}", clock),
            None => println!("No timer information available"),
        }
    }

    /// Shows one frame of the live clock, overwriting the previous one.
    pub fn show_clock_frame(response: &IpcResponse) {
        use std::io::Write;

        if let Some(clock) = Self::clock(response.data.as_ref()) {
            print!("\r\x1b[2K{}", clock);
            let _ = std::io::stdout().flush();
        }
    }

    /// Shows the coach reply to a chat or spoken message.
    pub fn show_reply(response: &IpcResponse) {
        let Some(data) = &response.data else {
            return;
        };
        if let Some(transcript) = &data.transcript {
            println!("{}", Self::format_message(&ChatMessage::user(transcript.as_str())));
        }
        if let Some(reply) = &data.reply {
            println!("{}", Self::format_message(&ChatMessage::assistant(reply.as_str())));
        }
    }

    /// Shows the conversation so far.
    pub fn show_history(response: &IpcResponse) {
        let messages = response
            .data
            .as_ref()
            .and_then(|data| data.messages.as_deref())
            .unwrap_or_default();

        if messages.is_empty() {
            println!("No messages yet");
            return;
        }
        for message in messages {
            println!("{}", Self::format_message(message));
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    /// Renders the clock described by response data.
    fn clock(data: Option<&ResponseData>) -> Option<ClockView> {
        let data = data?;
        let snapshot = TimerSnapshot {
            state: data.state?,
            remaining: i64::from(data.remaining_seconds?),
        };
        Some(view::render(&snapshot))
    }

    /// Formats one chat message with a speaker label.
    fn format_message(message: &ChatMessage) -> String {
        let speaker = match message.role {
            Role::User => "You",
            Role::Assistant => "Coach",
            Role::System => "System",
        };
        format!("{}: {}", speaker, message.content)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionState;

    fn status_data(state: SessionState, remaining: u32) -> ResponseData {
        ResponseData::from_snapshot(&TimerSnapshot {
            state,
            remaining: i64::from(remaining),
        })
    }

    // ------------------------------------------------------------------------
    // Clock Tests
    // ------------------------------------------------------------------------

    mod clock_tests {
        use super::*;

        #[test]
        fn test_clock_from_idle_status() {
            let data = status_data(SessionState::Idle, 1200);
            let clock = Display::clock(Some(&data)).unwrap();

            assert_eq!(clock.time, "20:00");
            assert_eq!(clock.status, "Ready to focus?");
            assert!(clock.start_enabled);
        }

        #[test]
        fn test_clock_from_break_status() {
            let data = status_data(SessionState::Break, 299);
            let clock = Display::clock(Some(&data)).unwrap();

            assert_eq!(clock.to_string(), "04:59  BREAK TIME! Move around!");
            assert!(!clock.start_enabled);
        }

        #[test]
        fn test_clock_missing_data() {
            assert!(Display::clock(None).is_none());

            let data = ResponseData {
                reply: Some("hi".to_string()),
                ..Default::default()
            };
            assert!(Display::clock(Some(&data)).is_none());
        }

        #[test]
        fn test_clock_missing_remaining() {
            let data = ResponseData {
                state: Some(SessionState::Focus),
                ..Default::default()
            };
            assert!(Display::clock(Some(&data)).is_none());
        }
    }

    // ------------------------------------------------------------------------
    // Message Format Tests
    // ------------------------------------------------------------------------

    mod format_message_tests {
        use super::*;

        #[test]
        fn test_format_user_message() {
            let message = ChatMessage::user("I'm done");
            assert_eq!(Display::format_message(&message), "You: I'm done");
        }

        #[test]
        fn test_format_assistant_message() {
            let message = ChatMessage::assistant("Nice work.");
            assert_eq!(Display::format_message(&message), "Coach: Nice work.");
        }
    }

    // ------------------------------------------------------------------------
    // Show Function Tests (no panic)
    // ------------------------------------------------------------------------

    mod show_tests {
        use super::*;

        #[test]
        fn test_show_functions_do_not_panic() {
            let status =
                IpcResponse::success("", Some(status_data(SessionState::Focus, 1199)));
            Display::show_start_success(&status);
            Display::show_reset_success(&status);
            Display::show_status(&status);
            Display::show_clock_frame(&status);

            let reply = IpcResponse::success(
                "",
                Some(ResponseData {
                    transcript: Some("hello".to_string()),
                    reply: Some("Hi there".to_string()),
                    ..Default::default()
                }),
            );
            Display::show_reply(&reply);

            Display::show_history(&IpcResponse::success("", None));
            Display::show_status(&IpcResponse::success("", None));
            Display::show_error("Connection refused");
        }
    }
}
