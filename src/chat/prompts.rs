//! Fixed prompts and notification text used by the coach.

/// System prompt that opens every conversation.
pub const SYSTEM_PROMPT: &str = "You are a warm, encouraging study partner who helps the user \
focus using evidence-based learning techniques. Keep answers short and practical. During \
focus sessions help the user stay on task; during breaks suggest ways to rest away from the \
screen; when a task is finished guide a brief review of what was learned.";

/// Prompt sent in place of a "done" message during a focus session.
pub const REVIEW_PROMPT: &str = "I just finished my study task. Please act like a teacher and \
guide me through reviewing and checking what I just learned, to deepen my understanding.";

/// Title of the notification shown when a break starts.
pub const BREAK_NOTIFICATION_TITLE: &str = "Break time!";

/// Notification shown once at startup when desktop notifications work.
pub const NOTIFICATIONS_ENABLED_TITLE: &str = "Notifications enabled";
pub const NOTIFICATIONS_ENABLED_BODY: &str = "You will be reminded when a break starts.";

/// Body of the notification shown when a break starts.
pub fn break_notification_body(break_minutes: u32) -> String {
    format!("Focus session complete! Enjoy your {break_minutes}-minute break.")
}

/// Prompt asking the coach for a break activity.
pub fn break_activity_prompt(break_minutes: u32) -> String {
    format!(
        "I have a {break_minutes}-minute break now. Please suggest a fun activity that \
doesn't involve looking at a screen, to help me relax."
    )
}
