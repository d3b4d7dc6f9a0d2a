//! Connection lifecycle for the realtime sync layer.

pub mod backoff;
pub mod connection;
pub mod error;
pub mod handler;

pub use backoff::Backoff;
pub use connection::{ConnectionConfig, ConnectionManager, ConnectionState};
pub use error::{Error, Result};
pub use handler::SocketHandler;
