//! Display adapter for the focus clock.
//!
//! Maps timer snapshots to the status line, the `MM:SS` clock text and the
//! enabled state of the start control. Rendering is a pure function of the
//! snapshot, so it can be applied to every published value.

use crate::types::{SessionState, TimerSnapshot};

/// Title shown above the clock.
pub const TITLE: &str = "Scientific Focus Partner";

/// Returns the status line for a state.
pub fn status_message(state: SessionState) -> &'static str {
    match state {
        SessionState::Idle => "Ready to focus?",
        SessionState::Focus => "FOCUS TIME! Stay on task.",
        SessionState::Break => "BREAK TIME! Move around!",
    }
}

/// Formats seconds as zero-padded `MM:SS`.
///
/// Negative values are shown as `00:00`. Minutes are not wrapped at 60.
pub fn format_time(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Rendered state of the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockView {
    pub status: &'static str,
    pub time: String,
    /// The start control is only usable while idle
    pub start_enabled: bool,
}

impl ClockView {
    /// Renders a snapshot.
    pub fn render(snapshot: &TimerSnapshot) -> Self {
        Self {
            status: status_message(snapshot.state),
            time: format_time(snapshot.remaining),
            start_enabled: snapshot.state == SessionState::Idle,
        }
    }
}

impl std::fmt::Display for ClockView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}  {}", self.time, self.status)
    }
}

/// Renders a snapshot. Shorthand for [`ClockView::render`].
pub fn render(snapshot: &TimerSnapshot) -> ClockView {
    ClockView::render(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(state: SessionState, remaining: i64) -> TimerSnapshot {
        TimerSnapshot { state, remaining }
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(1200), "20:00");
        assert_eq!(format_time(299), "04:59");
    }

    #[test]
    fn test_format_time_does_not_wrap_hours() {
        assert_eq!(format_time(7200), "120:00");
    }

    #[test]
    fn test_format_time_clamps_negative() {
        assert_eq!(format_time(-1), "00:00");
    }

    #[test]
    fn test_render_idle() {
        let view = render(&snapshot(SessionState::Idle, 1200));

        assert_eq!(view.status, "Ready to focus?");
        assert_eq!(view.time, "20:00");
        assert!(view.start_enabled);
    }

    #[test]
    fn test_render_focus_disables_start() {
        let view = render(&snapshot(SessionState::Focus, 65));

        assert_eq!(view.status, "FOCUS TIME! Stay on task.");
        assert_eq!(view.time, "01:05");
        assert!(!view.start_enabled);
    }

    #[test]
    fn test_render_break() {
        let view = render(&snapshot(SessionState::Break, 300));

        assert_eq!(view.status, "BREAK TIME! Move around!");
        assert_eq!(view.time, "05:00");
        assert!(!view.start_enabled);
    }

    #[test]
    fn test_render_is_idempotent() {
        let snap = snapshot(SessionState::Focus, 42);
        assert_eq!(render(&snap), render(&snap));
    }

    #[test]
    fn test_display() {
        let view = render(&snapshot(SessionState::Idle, 1200));
        assert_eq!(view.to_string(), "20:00  Ready to focus?");
    }
}
