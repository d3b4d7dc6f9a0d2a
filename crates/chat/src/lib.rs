//! Team chat bridging REST history and live delivery.

pub mod channel;
pub mod error;

pub use channel::{ChatChannel, ChatMessage};
pub use error::{ChatError, Result};
