//! Desktop notification support.
//!
//! This module provides:
//!
//! - [`Notification`] content with validation
//! - The [`NotificationSender`] trait used by the break notifier
//! - [`DesktopNotifier`] for `notify-send` / `osascript`
//! - [`TerminalNotifier`] as a fallback that writes to stderr
//! - [`MockNotificationSender`] for tests
//!
//! Sending is synchronous and fire-and-forget: the sender hands the
//! notification to the system and returns. The one exception is the
//! confirmation shown at startup, which waits for the system notifier so a
//! refused permission switches the daemon to the terminal.

mod content;
mod desktop;
pub mod error;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub use self::content::{validate_title, Notification};
pub use self::desktop::{DesktopNotifier, TerminalNotifier};
pub use self::error::NotificationError;

/// Something that can show a notification to the user.
pub trait NotificationSender: Send + Sync {
    /// Shows a notification.
    fn send(&self, notification: &Notification) -> Result<(), NotificationError>;

    /// Returns true if notifications can be shown.
    fn is_available(&self) -> bool;
}

/// Picks the notification sender for the daemon.
///
/// Desktop notifications are used only after the "notifications enabled"
/// confirmation was shown. Otherwise notifications go to the terminal.
pub async fn select_sender(desktop: bool) -> Arc<dyn NotificationSender> {
    if !desktop {
        return Arc::new(TerminalNotifier);
    }
    match enable_desktop(DesktopNotifier::new()).await {
        Ok(notifier) => {
            tracing::info!("Desktop notifications enabled");
            Arc::new(notifier)
        }
        Err(e) => {
            if e.is_permission_error() {
                tracing::warn!("Desktop notifications were refused, using the terminal");
            } else {
                tracing::warn!(error = %e, "Desktop notifications unavailable, using the terminal");
            }
            tracing::info!("{}", e.suggestion());
            Arc::new(TerminalNotifier)
        }
    }
}

/// Shows the confirmation through `notifier` and hands it back if it worked.
async fn enable_desktop(
    notifier: DesktopNotifier,
) -> Result<DesktopNotifier, NotificationError> {
    if !notifier.is_available() {
        return Err(NotificationError::NotAvailable);
    }
    notifier
        .send_confirmed(&Notification::notifications_enabled())
        .await?;
    Ok(notifier)
}

#[derive(Debug)]
pub struct MockNotificationSender {
    notifications: Mutex<Vec<Notification>>,
    available: AtomicBool,
    should_fail: AtomicBool,
}

impl Default for MockNotificationSender {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotificationSender {
    #[must_use]
    pub fn new() -> Self {
        Self {
            notifications: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            should_fail: AtomicBool::new(false),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn get_notifications(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    #[must_use]
    pub fn notification_count(&self) -> usize {
        self.lock().len()
    }

    pub fn clear_recorded(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.notifications
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl NotificationSender for MockNotificationSender {
    fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotificationError::SendFailed("Mock failure".to_string()));
        }
        self.lock().push(notification.clone());
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
