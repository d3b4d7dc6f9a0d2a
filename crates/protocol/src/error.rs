//! Protocol error types.

use thiserror::Error;

/// A frame that could not be decoded. Dropped and logged by the router;
/// never fatal and never affects connection state.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The frame is not a valid envelope (bad JSON, not an object, or
    /// missing the `event` field).
    #[error("Malformed frame: {0}")]
    Frame(#[from] serde_json::Error),

    /// A recognized event whose payload does not match its schema.
    #[error("Malformed {event} payload: {source}")]
    Payload {
        event: String,
        source: serde_json::Error,
    },
}
