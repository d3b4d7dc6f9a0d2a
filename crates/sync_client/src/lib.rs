//! Client-side realtime synchronization for notifications and team chat.
//!
//! Wires the connection manager, event router, reconciliation store, and
//! chat channel together, and guards REST fetches against supersession
//! by team switches and logout.

pub mod client;
pub mod generation;
pub mod handler;

pub use client::{SyncClient, SyncConfig};
pub use generation::{Generation, GenerationToken};
pub use handler::RouterHandler;
