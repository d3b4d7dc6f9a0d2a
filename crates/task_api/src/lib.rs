//! REST collaborators for the sync layer.
//!
//! The task backend is external to the core: this crate only pulls the
//! assigned-task snapshot and chat history, authenticated with an opaque
//! bearer credential supplied by the session layer.

pub mod client;
pub mod error;
pub mod types;

pub use client::TaskApiClient;
pub use error::{ApiError, Result};
pub use types::{AssignedTasksResponse, ChatHistoryResponse, HistoryMessage, Task};
