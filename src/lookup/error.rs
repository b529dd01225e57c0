use std::time::Duration;
use thiserror::Error;

/// Failure raised by a lookup collaborator
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned HTTP {status}")]
    Status { status: u16 },

    #[error("invalid upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("upstream client error: {0}")]
    Client(String),

    #[error("lookup aborted: {0}")]
    Aborted(String),

    #[error("lookup timed out after {0:?}")]
    TimedOut(Duration),
}

pub type Result<T> = std::result::Result<T, LookupError>;
