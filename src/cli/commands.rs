//! Command definitions for the focus coach CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::chat::ChatProvider;
use crate::types::{CoachConfig, DEFAULT_BREAK_SECONDS, DEFAULT_FOCUS_SECONDS};

// ============================================================================
// CLI Structure
// ============================================================================

/// Focus Coach - a focus/break timer with a chat study partner
#[derive(Parser, Debug)]
#[command(
    name = "focus-coach",
    version,
    about = "Focus/break timer with a chat coach",
    long_about = "A focus timer that runs as a background daemon.\n\
                  Breaks come with a desktop notification and an activity suggestion \
                  from the chat coach.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path of the daemon socket
    #[arg(long, global = true, env = "FOCUS_COACH_SOCKET")]
    pub socket: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true, env = "FOCUS_COACH_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start a focus session
    Start,

    /// Reset the timer to idle
    Reset,

    /// Show current timer status
    Status,

    /// Show a live clock until interrupted
    Watch,

    /// Send a message to the coach
    Chat {
        /// Message text
        #[arg(required = true, num_args = 1.., value_parser = validate_message)]
        message: Vec<String>,
    },

    /// Show the conversation with the coach
    History,

    /// Speak a message to the coach (requires --listen-cmd on the daemon)
    Listen,

    /// Run the timer daemon in the foreground
    Daemon(DaemonArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Daemon Command Arguments
// ============================================================================

/// Arguments for the daemon command
#[derive(Args, Debug, Clone)]
pub struct DaemonArgs {
    /// Focus duration in minutes (1-120)
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_FOCUS_SECONDS / 60,
        value_parser = clap::value_parser!(u32).range(1..=120)
    )]
    pub focus: u32,

    /// Break duration in minutes (1-60)
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_BREAK_SECONDS / 60,
        value_parser = clap::value_parser!(u32).range(1..=60)
    )]
    pub break_time: u32,

    /// Chat provider: deepseek, openai or groq (any case)
    #[arg(short, long, default_value_t, env = "DEFAULT_MODEL")]
    pub provider: ChatProvider,

    /// Print notifications to the terminal instead of the desktop
    #[arg(long)]
    pub no_notify: bool,

    /// Speech synthesizer command; the reply text is appended (e.g. "say", "espeak-ng")
    #[arg(long, env = "FOCUS_COACH_SPEAK_CMD")]
    pub speak_cmd: Option<String>,

    /// Voice passed to the synthesizer as `-v <voice>`
    #[arg(long, requires = "speak_cmd")]
    pub voice: Option<String>,

    /// Speech recognizer command that prints one transcript on stdout
    #[arg(long, env = "FOCUS_COACH_LISTEN_CMD")]
    pub listen_cmd: Option<String>,
}

impl Default for DaemonArgs {
    fn default() -> Self {
        Self {
            focus: DEFAULT_FOCUS_SECONDS / 60,
            break_time: DEFAULT_BREAK_SECONDS / 60,
            provider: ChatProvider::default(),
            no_notify: false,
            speak_cmd: None,
            voice: None,
            listen_cmd: None,
        }
    }
}

impl DaemonArgs {
    /// Timer durations in seconds.
    pub fn timer_config(&self) -> CoachConfig {
        CoachConfig::default()
            .with_focus_seconds(self.focus * 60)
            .with_break_seconds(self.break_time * 60)
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates one word of a chat message.
fn validate_message(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("message must not be empty".to_string());
    }
    Ok(s.to_string())
}

// ============================================================================
// Tests
// ============================================================================
