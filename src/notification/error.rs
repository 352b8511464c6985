//! Notification error types.

use thiserror::Error;

/// Errors that can occur when sending notifications.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Failed to hand the notification to the system.
    #[error("Failed to send notification: {0}")]
    SendFailed(String),

    /// Notification permission was denied by the user.
    #[error("Notification permission denied")]
    PermissionDenied,

    /// Invalid input provided to the notification system.
    #[error("Invalid notification: {0}")]
    InvalidInput(String),

    /// No notification backend exists on this platform.
    #[error("Notifications are not available on this system")]
    NotAvailable,
}

impl NotificationError {
    /// Returns true if this error is related to permissions.
    #[must_use]
    pub fn is_permission_error(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::SendFailed(_) => "Check that notify-send (Linux) or osascript (macOS) is installed",
            Self::PermissionDenied => "Allow notifications for your terminal in the system settings",
            Self::InvalidInput(_) => "Check the notification title and body",
            Self::NotAvailable => "Run the daemon with --no-notify to print to the terminal instead",
        }
    }
}
