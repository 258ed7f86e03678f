//! Board Errors
//!
//! Everything that can go wrong talking to the backend or loading settings.
//! Board interaction itself never fails: bad drops collapse into no-ops.

use serde::{Deserialize, Serialize};

/// Common result type for board operations
pub type BoardResult<T> = Result<T, BoardError>;

/// Board-level errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoardError {
    NotFound(String),
    InvalidInput(String),
    /// Backend answered with a non-success status
    Api { status: u16, message: String },
    /// Request never produced a response
    Transport(String),
    /// Response body did not match the expected shape
    Decode(String),
}

impl BoardError {
    /// HTTP status if the backend produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            BoardError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl std::fmt::Display for BoardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoardError::NotFound(msg) => write!(f, "Not found: {}", msg),
            BoardError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            BoardError::Api { status, message } => {
                write!(f, "Backend error {}: {}", status, message)
            }
            BoardError::Transport(msg) => write!(f, "Request failed: {}", msg),
            BoardError::Decode(msg) => write!(f, "Unexpected response: {}", msg),
        }
    }
}

impl std::error::Error for BoardError {}

impl From<reqwest::Error> for BoardError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            BoardError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            BoardError::Api {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            BoardError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for BoardError {
    fn from(e: serde_json::Error) -> Self {
        BoardError::Decode(e.to_string())
    }
}
