//! Notification senders backed by the operating system or the terminal.

use std::time::Duration;

use tokio::process::Command;

use super::content::Notification;
use super::error::NotificationError;
use super::NotificationSender;

/// Program used to show desktop notifications on this platform.
#[cfg(target_os = "linux")]
const NOTIFY_PROGRAM: Option<&str> = Some("notify-send");
#[cfg(target_os = "macos")]
const NOTIFY_PROGRAM: Option<&str> = Some("osascript");
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
const NOTIFY_PROGRAM: Option<&str> = None;

/// How long a confirmed send may take before it counts as failed.
const CONFIRM_TIMEOUT: Duration = Duration::from_secs(5);

/// Lowercase fragments of helper errors that mean the user refused
/// notifications (osascript error -1743, D-Bus `AccessDenied`).
const DENIAL_MARKERS: &[&str] = &[
    "not authorized",
    "not allowed",
    "accessdenied",
    "permission denied",
];

/// Shows notifications through `notify-send` (Linux) or `osascript` (macOS).
///
/// The helper process is spawned and left to finish on its own; the caller
/// never waits for the notification to be displayed.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    program: Option<String>,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DesktopNotifier {
    /// Creates a notifier for the current platform.
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: NOTIFY_PROGRAM.map(String::from),
        }
    }

    /// Creates a notifier that runs a custom program with `title body` arguments.
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: Some(program.into()),
        }
    }

    fn command(&self, program: &str, notification: &Notification) -> Command {
        let mut command = Command::new(program);
        if program == "osascript" {
            let script = format!(
                "display notification {} with title {}",
                applescript_quote(&notification.body),
                applescript_quote(&notification.title)
            );
            command.arg("-e").arg(script);
        } else {
            command.arg(&notification.title).arg(&notification.body);
        }
        command
    }

    /// Shows a notification and waits for the helper to report back.
    ///
    /// Unlike [`NotificationSender::send`] this surfaces what the helper
    /// says, so a refused permission comes back as `PermissionDenied`.
    ///
    /// # Errors
    ///
    /// Returns `NotAvailable` without a helper, `PermissionDenied` when the
    /// system refused, or `SendFailed` for anything else.
    pub async fn send_confirmed(
        &self,
        notification: &Notification,
    ) -> Result<(), NotificationError> {
        let program = self
            .program
            .as_deref()
            .ok_or(NotificationError::NotAvailable)?;

        let mut command = self.command(program, notification);
        command.kill_on_drop(true);

        let output = tokio::time::timeout(CONFIRM_TIMEOUT, command.output())
            .await
            .map_err(|_| NotificationError::SendFailed(format!("{program}: timed out")))?
            .map_err(|e| NotificationError::SendFailed(format!("{program}: {e}")))?;

        if output.status.success() {
            tracing::debug!(id = %notification.id, program, "Notification shown");
            return Ok(());
        }
        Err(classify_failure(
            program,
            &String::from_utf8_lossy(&output.stderr),
        ))
    }
}

/// Maps a helper's error output to a notification error.
fn classify_failure(program: &str, stderr: &str) -> NotificationError {
    let lowered = stderr.to_lowercase();
    if DENIAL_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        tracing::debug!(program, stderr = stderr.trim(), "Notification refused");
        return NotificationError::PermissionDenied;
    }
    NotificationError::SendFailed(format!("{program}: {}", stderr.trim()))
}

impl NotificationSender for DesktopNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let program = self
            .program
            .as_deref()
            .ok_or(NotificationError::NotAvailable)?;

        self.command(program, notification)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| NotificationError::SendFailed(format!("{program}: {e}")))?;

        tracing::debug!(id = %notification.id, program, "Notification dispatched");
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.program.is_some()
    }
}

/// Quotes a string as an AppleScript literal.
fn applescript_quote(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Rings the terminal bell and prints the notification on stderr.
#[derive(Debug, Clone, Default)]
pub struct TerminalNotifier;

impl NotificationSender for TerminalNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        eprintln!("\x07{}: {}", notification.title, notification.body);
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }
}
