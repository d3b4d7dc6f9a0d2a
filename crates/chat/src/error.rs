//! Chat error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    /// Empty or whitespace-only content is rejected before any frame is
    /// built.
    #[error("Message content is empty")]
    EmptyMessage,

    #[error("No active team selected")]
    NoActiveTeam,

    #[error(transparent)]
    Connection(#[from] common::Error),
}

pub type Result<T> = std::result::Result<T, ChatError>;
