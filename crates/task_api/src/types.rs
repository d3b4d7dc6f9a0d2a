//! REST payload types for the task backend.

use serde::Deserialize;

/// A task row as returned by `GET /tasks/{teamId}/assigned`.
#[derive(Debug, Clone, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    pub status: String,
    pub assigned_to: Option<i64>,
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Body of `GET /tasks/{teamId}/assigned`.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignedTasksResponse {
    pub tasks: Vec<Task>,
}

/// A history row as returned by `GET /chat/{teamId}`.
///
/// History rows carry no team id; the caller attributes them to the team
/// it requested.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    pub id: i64,
    pub content: String,
    pub sender: String,
    pub created_at: String,
}

/// Body of `GET /chat/{teamId}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatHistoryResponse {
    pub messages: Vec<HistoryMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_row_deserializes_with_nulls() {
        let raw = r#"{"id":5,"title":"Ship it","description":null,"priority":"low","status":"done","assigned_to":null,"due_date":null,"created_at":"2024-05-01T10:00:00Z","updated_at":"2024-05-02T10:00:00Z"}"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.id, 5);
        assert!(task.description.is_none());
        assert!(task.assigned_to.is_none());
    }

    #[test]
    fn test_history_response_shape() {
        let raw = r#"{"messages":[{"id":1,"content":"hello","sender":"bob","created_at":"2024-05-01T10:00:00Z"}]}"#;
        let body: ChatHistoryResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].sender, "bob");
    }
}
