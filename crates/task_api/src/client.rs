//! REST client for the task backend.

use crate::error::{ApiError, Result};
use crate::types::{AssignedTasksResponse, ChatHistoryResponse, HistoryMessage, Task};
use std::time::Duration;
use tracing::debug;

/// Default deadline for a single fetch.
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// REST API client for the task backend.
///
/// The bearer credential is supplied per call and treated as opaque: the
/// client neither parses nor refreshes it.
#[derive(Debug, Clone)]
pub struct TaskApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl TaskApiClient {
    /// Create a client with the default fetch deadline.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_FETCH_TIMEOUT)
    }

    /// Create a client with a custom fetch deadline.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Fetch the assigned-task snapshot for a team.
    pub async fn fetch_assigned_tasks(&self, token: &str, team_id: &str) -> Result<Vec<Task>> {
        let url = format!("{}/tasks/{}/assigned", self.base_url, team_id);
        debug!("Fetching assigned tasks from: {}", url);

        let response = self
            .http
            .get(&url)
            .header("Content-Type", "application/json")
            .bearer_auth(token)
            .send()
            .await?;

        let response = check_status(response).await?;
        let body: AssignedTasksResponse = response.json().await?;
        Ok(body.tasks)
    }

    /// Fetch the chat history for a team.
    pub async fn fetch_chat_history(
        &self,
        token: &str,
        team_id: &str,
    ) -> Result<Vec<HistoryMessage>> {
        let url = format!("{}/chat/{}", self.base_url, team_id);
        debug!("Fetching chat history from: {}", url);

        let response = self
            .http
            .get(&url)
            .header("Content-Type", "application/json")
            .bearer_auth(token)
            .send()
            .await?;

        let response = check_status(response).await?;
        let body: ChatHistoryResponse = response.json().await?;
        Ok(body.messages)
    }
}

/// Map 401/403 to [`ApiError::Auth`] and other non-success statuses to
/// [`ApiError::Api`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(ApiError::Auth(status.as_u16()));
    }
    if !status.is_success() {
        return Err(ApiError::Api {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = TaskApiClient::new("http://localhost:5000");
        assert_eq!(client.base_url, "http://localhost:5000");
    }
}
