//! Error types for REST fetches.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// 401/403. Surfaced distinctly so the session layer can force
    /// re-authentication; the sync core takes no corrective action.
    #[error("Authentication rejected (status {0})")]
    Auth(u16),

    /// Deadline expiry. Treated like any other transient network failure.
    #[error("Request timed out")]
    Timeout,

    #[error("API returned status {status}: {body}")]
    Api { status: u16, body: String },
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Http(e)
        }
    }
}

impl ApiError {
    /// True when the session layer should react (force re-auth).
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth(_))
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
