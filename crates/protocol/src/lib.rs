//! Wire protocol for the realtime sync layer.
//!
//! Frames are line-delimited JSON envelopes `{ "event": <string>,
//! "data": <object> }` multiplexing every logical channel over the one
//! connection.

pub mod envelope;
pub mod error;
pub mod router;

pub use envelope::{
    decode, ChatMessageEvent, Envelope, InboundEvent, TaskAssignedEvent, EVENT_NEW_MESSAGE,
    EVENT_SEND_MESSAGE, EVENT_TASK_ASSIGNED,
};
pub use error::ProtocolError;
pub use router::{EventKind, EventRouter, HandlerId};
