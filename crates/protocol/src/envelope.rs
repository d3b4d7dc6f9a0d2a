//! Wire envelope and inbound event decoding.

use crate::error::ProtocolError;
use crate::router::EventKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Server→client push when a task is assigned to the user.
pub const EVENT_TASK_ASSIGNED: &str = "task_assigned";
/// Server→client delivery of a chat message (including the echo of our own).
pub const EVENT_NEW_MESSAGE: &str = "new_message";
/// Client→server chat send.
pub const EVENT_SEND_MESSAGE: &str = "send_message";

/// Raw wire envelope: `{ "event": <string>, "data": <object> }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// Payload of a `task_assigned` push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAssignedEvent {
    pub task_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub message: String,
}

/// Payload of a `new_message` delivery.
///
/// `teamId` is camel-cased on the wire while `created_at` is not; the
/// renames below pin the exact field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageEvent {
    pub id: i64,
    #[serde(rename = "teamId")]
    pub team_id: String,
    pub content: String,
    pub sender: String,
    pub created_at: String,
}

/// An inbound frame after decoding, tagged by wire event name.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    TaskAssigned(TaskAssignedEvent),
    NewMessage(ChatMessageEvent),
    /// A well-formed envelope with an unrecognized event name. Routed
    /// nowhere; unknown events are forward compatibility, not errors.
    Unknown { event: String, data: Value },
}

impl InboundEvent {
    /// The dispatchable kind, or None for `Unknown`.
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            InboundEvent::TaskAssigned(_) => Some(EventKind::TaskAssigned),
            InboundEvent::NewMessage(_) => Some(EventKind::NewMessage),
            InboundEvent::Unknown { .. } => None,
        }
    }
}

/// Decode a raw text frame into an [`InboundEvent`].
pub fn decode(raw: &str) -> Result<InboundEvent, ProtocolError> {
    let envelope: Envelope = serde_json::from_str(raw)?;
    match envelope.event.as_str() {
        EVENT_TASK_ASSIGNED => {
            let payload = serde_json::from_value(envelope.data).map_err(|source| {
                ProtocolError::Payload {
                    event: envelope.event.clone(),
                    source,
                }
            })?;
            Ok(InboundEvent::TaskAssigned(payload))
        }
        EVENT_NEW_MESSAGE => {
            let payload = serde_json::from_value(envelope.data).map_err(|source| {
                ProtocolError::Payload {
                    event: envelope.event.clone(),
                    source,
                }
            })?;
            Ok(InboundEvent::NewMessage(payload))
        }
        _ => Ok(InboundEvent::Unknown {
            event: envelope.event,
            data: envelope.data,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_task_assigned() {
        let raw = r#"{"event":"task_assigned","data":{"taskId":42,"title":"Fix login","description":"The form 500s","status":"todo","priority":"high","message":"You have been assigned a task:"}}"#;
        match decode(raw).unwrap() {
            InboundEvent::TaskAssigned(task) => {
                assert_eq!(task.task_id, 42);
                assert_eq!(task.title, "Fix login");
                assert_eq!(task.priority, "high");
            }
            other => panic!("unexpected decode: {:?}", other),
        }
    }

    #[test]
    fn test_decode_task_assigned_defaults_optional_fields() {
        let raw = r#"{"event":"task_assigned","data":{"taskId":7,"title":"Minimal"}}"#;
        match decode(raw).unwrap() {
            InboundEvent::TaskAssigned(task) => {
                assert_eq!(task.task_id, 7);
                assert_eq!(task.description, "");
                assert_eq!(task.status, "");
            }
            other => panic!("unexpected decode: {:?}", other),
        }
    }

    #[test]
    fn test_decode_new_message() {
        let raw = r#"{"event":"new_message","data":{"id":3,"teamId":"9","content":"hi","sender":"alice@example.com","created_at":"2024-05-01T10:00:00Z"}}"#;
        match decode(raw).unwrap() {
            InboundEvent::NewMessage(msg) => {
                assert_eq!(msg.id, 3);
                assert_eq!(msg.team_id, "9");
                assert_eq!(msg.sender, "alice@example.com");
            }
            other => panic!("unexpected decode: {:?}", other),
        }
    }

    #[test]
    fn test_decode_unknown_event_is_not_an_error() {
        let raw = r#"{"event":"presence_changed","data":{"userId":"4"}}"#;
        match decode(raw).unwrap() {
            InboundEvent::Unknown { event, data } => {
                assert_eq!(event, "presence_changed");
                assert_eq!(data["userId"], "4");
            }
            other => panic!("unexpected decode: {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        assert!(matches!(decode("not json"), Err(ProtocolError::Frame(_))));
    }

    #[test]
    fn test_decode_rejects_missing_event_field() {
        assert!(matches!(
            decode(r#"{"data":{}}"#),
            Err(ProtocolError::Frame(_))
        ));
    }

    #[test]
    fn test_decode_rejects_malformed_known_payload() {
        let raw = r#"{"event":"new_message","data":{"id":"not-a-number"}}"#;
        assert!(matches!(
            decode(raw),
            Err(ProtocolError::Payload { event, .. }) if event == "new_message"
        ));
    }
}
