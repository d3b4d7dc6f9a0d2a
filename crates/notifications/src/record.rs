//! Notification records and their construction from either source.

use protocol::TaskAssignedEvent;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use task_api::Task;

/// Message shown for assignment notifications built from the snapshot.
const ASSIGNED_MESSAGE: &str = "You have been assigned a task:";
const MISSING_DESCRIPTION: &str = "No description provided";
const MISSING_STATUS: &str = "unknown";
const MISSING_PRIORITY: &str = "unknown";

/// Which source produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Provenance {
    /// Delivered over the live socket.
    Pushed,
    /// Observed in a snapshot fetch.
    Polled,
}

/// One entry in the notification feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationRecord {
    pub task_id: i64,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub message: String,
    pub provenance: Provenance,
}

impl NotificationRecord {
    /// Build a record from a live `task_assigned` event. Servers may
    /// omit fields on the push path; blanks get display fallbacks.
    pub fn from_push(event: &TaskAssignedEvent) -> Self {
        Self {
            task_id: event.task_id,
            title: event.title.clone(),
            description: or_fallback(&event.description, MISSING_DESCRIPTION),
            status: or_fallback(&event.status, MISSING_STATUS),
            priority: or_fallback(&event.priority, MISSING_PRIORITY),
            message: or_fallback(&event.message, ASSIGNED_MESSAGE),
            provenance: Provenance::Pushed,
        }
    }

    /// Build a record from a snapshot task row. Descriptions are authored
    /// in markdown; strip the structure for plain-text display.
    pub fn from_task(task: &Task) -> Self {
        Self {
            task_id: task.id,
            title: task.title.clone(),
            description: sanitize_markdown(task.description.as_deref().unwrap_or("")),
            status: task.status.clone(),
            priority: task.priority.clone(),
            message: ASSIGNED_MESSAGE.to_string(),
            provenance: Provenance::Polled,
        }
    }
}

fn or_fallback(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Strip markdown structure from a task description: heading and list
/// lines are dropped, emphasis markers are unwrapped, leading whitespace
/// is trimmed.
pub fn sanitize_markdown(text: &str) -> String {
    static BOLD: OnceLock<Regex> = OnceLock::new();
    static ITALIC: OnceLock<Regex> = OnceLock::new();
    let bold = BOLD.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
    let italic = ITALIC.get_or_init(|| Regex::new(r"\*(.*?)\*").unwrap());

    let kept: Vec<&str> = text
        .lines()
        .map(|line| line.trim_start())
        .filter(|line| !line.starts_with('#') && !line.starts_with('*'))
        .collect();
    let joined = kept.join("\n");
    let unbolded = bold.replace_all(&joined, "$1");
    italic.replace_all(&unbolded, "$1").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_event(task_id: i64) -> TaskAssignedEvent {
        TaskAssignedEvent {
            task_id,
            title: "Review PR".to_string(),
            description: String::new(),
            status: String::new(),
            priority: "high".to_string(),
            message: String::new(),
        }
    }

    #[test]
    fn test_push_record_fills_blanks() {
        let record = NotificationRecord::from_push(&push_event(1));
        assert_eq!(record.description, "No description provided");
        assert_eq!(record.status, "unknown");
        assert_eq!(record.priority, "high");
        assert_eq!(record.message, "You have been assigned a task:");
        assert_eq!(record.provenance, Provenance::Pushed);
    }

    #[test]
    fn test_sanitize_strips_headings_and_lists() {
        let text = "# Goals\nShip the feature\n* bullet one\n  * nested bullet\nDone";
        assert_eq!(sanitize_markdown(text), "Ship the feature\nDone");
    }

    #[test]
    fn test_sanitize_unwraps_emphasis() {
        assert_eq!(
            sanitize_markdown("This is **very** *important* work"),
            "This is very important work"
        );
    }

    #[test]
    fn test_sanitize_trims_leading_whitespace() {
        assert_eq!(sanitize_markdown("   padded line"), "padded line");
    }

    #[test]
    fn test_sanitize_empty_input() {
        assert_eq!(sanitize_markdown(""), "");
    }
}
