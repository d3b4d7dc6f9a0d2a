//! Team-scoped chat view over the multiplexed connection.

use crate::error::{ChatError, Result};
use common::ConnectionManager;
use metrics::counter;
use protocol::{ChatMessageEvent, EVENT_SEND_MESSAGE};
use serde::Serialize;
use serde_json::json;
use std::sync::{Arc, RwLock};
use task_api::HistoryMessage;
use tracing::debug;

/// One chat entry scoped to a team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: i64,
    pub team_id: String,
    pub content: String,
    pub sender: String,
    pub created_at: String,
}

impl ChatMessage {
    /// Attribute a history row to the team it was fetched for; history
    /// rows carry no team id of their own.
    pub fn from_history(team_id: &str, msg: HistoryMessage) -> Self {
        Self {
            id: msg.id,
            team_id: team_id.to_string(),
            content: msg.content,
            sender: msg.sender,
            created_at: msg.created_at,
        }
    }
}

impl From<ChatMessageEvent> for ChatMessage {
    fn from(event: ChatMessageEvent) -> Self {
        Self {
            id: event.id,
            team_id: event.team_id,
            content: event.content,
            sender: event.sender,
            created_at: event.created_at,
        }
    }
}

/// Team-scoped view over chat messages.
///
/// The socket carries every team the user belongs to; scoping is a
/// client-local equality filter on the active team, so switching teams
/// sends no control frame. Messages for other teams are dropped, not
/// buffered. Display order is arrival order; messages are never
/// re-sorted by timestamp.
///
/// Cloning yields another handle to the same channel.
#[derive(Clone)]
pub struct ChatChannel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    conn: ConnectionManager,
    active_team: RwLock<Option<String>>,
    messages: RwLock<Vec<ChatMessage>>,
}

impl ChatChannel {
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                conn,
                active_team: RwLock::new(None),
                messages: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Switch the active team: clear the view and update the filter.
    /// History for the new team is fetched separately.
    pub fn set_active_team(&self, team_id: impl Into<String>) {
        let mut active = self.inner.active_team.write().unwrap();
        let mut messages = self.inner.messages.write().unwrap();
        *active = Some(team_id.into());
        messages.clear();
    }

    pub fn active_team(&self) -> Option<String> {
        self.inner.active_team.read().unwrap().clone()
    }

    /// Set the history baseline for a team.
    ///
    /// Returns false and leaves the view untouched when the team is no
    /// longer active; a fetch superseded by a team switch must not
    /// overwrite the successor's view.
    pub fn load_history(&self, team_id: &str, history: Vec<HistoryMessage>) -> bool {
        let active = self.inner.active_team.read().unwrap();
        if active.as_deref() != Some(team_id) {
            debug!("Discarding history for inactive team {}", team_id);
            return false;
        }
        let mut messages = self.inner.messages.write().unwrap();
        *messages = history
            .into_iter()
            .map(|msg| ChatMessage::from_history(team_id, msg))
            .collect();
        true
    }

    /// Append a live message if it belongs to the active team; drop it
    /// otherwise.
    pub fn apply_incoming(&self, event: ChatMessageEvent) -> bool {
        let active = self.inner.active_team.read().unwrap();
        if active.as_deref() != Some(event.team_id.as_str()) {
            debug!("Dropping message for inactive team {}", event.team_id);
            counter!("chat_messages_dropped_total").increment(1);
            return false;
        }
        self.inner.messages.write().unwrap().push(event.into());
        counter!("chat_messages_applied_total").increment(1);
        true
    }

    /// Send a message to the active team.
    ///
    /// Requires an Open connection and non-blank content. The message is
    /// not appended locally; it joins the view only when the server
    /// echoes it back as `new_message`, so the displayed list always
    /// reflects server-accepted order.
    pub fn send(&self, content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let team_id = self.active_team().ok_or(ChatError::NoActiveTeam)?;
        self.inner.conn.send(
            EVENT_SEND_MESSAGE,
            json!({ "teamId": team_id, "content": content }),
        )?;
        counter!("chat_messages_sent_total").increment(1);
        Ok(())
    }

    /// Messages for the active team, in arrival order.
    pub fn view(&self) -> Vec<ChatMessage> {
        self.inner.messages.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.messages.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.messages.read().unwrap().is_empty()
    }

    /// Discard the view. Only called on logout or an explicit clear.
    pub fn clear(&self) {
        *self.inner.active_team.write().unwrap() = None;
        self.inner.messages.write().unwrap().clear();
    }
}
