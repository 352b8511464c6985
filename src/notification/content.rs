//! Notification content.

use uuid::Uuid;

use super::error::NotificationError;
use crate::chat::prompts;

/// Maximum length for notification titles.
const MAX_TITLE_LENGTH: usize = 100;

/// A notification ready to be handed to a [`super::NotificationSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Unique id, used to correlate log lines
    pub id: Uuid,
    pub title: String,
    pub body: String,
}

impl Notification {
    /// Creates a notification.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the title is empty or too long.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, NotificationError> {
        let title = title.into();
        validate_title(&title)?;

        Ok(Self {
            id: Uuid::new_v4(),
            title,
            body: body.into(),
        })
    }

    /// The notification shown when a break starts.
    #[must_use]
    pub fn break_started(break_minutes: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: prompts::BREAK_NOTIFICATION_TITLE.to_string(),
            body: prompts::break_notification_body(break_minutes),
        }
    }

    /// The notification confirming that desktop notifications work.
    #[must_use]
    pub fn notifications_enabled() -> Self {
        Self {
            id: Uuid::new_v4(),
            title: prompts::NOTIFICATIONS_ENABLED_TITLE.to_string(),
            body: prompts::NOTIFICATIONS_ENABLED_BODY.to_string(),
        }
    }
}

/// Validates a notification title.
pub fn validate_title(title: &str) -> Result<(), NotificationError> {
    if title.trim().is_empty() {
        return Err(NotificationError::InvalidInput(
            "title must not be empty".to_string(),
        ));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(NotificationError::InvalidInput(format!(
            "title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}
