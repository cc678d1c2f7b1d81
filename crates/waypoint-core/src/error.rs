#![forbid(unsafe_code)]

//! Errors raised by the component-scoped collaborators.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StateKeeperError>;

#[derive(Debug, Error)]
pub enum StateKeeperError {
    #[error("state key already registered: {key}")]
    KeyCollision { key: String },

    #[error("state codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("state encoding error: {0}")]
    Encoding(#[from] base64::DecodeError),
}

impl StateKeeperError {
    #[must_use]
    pub fn collision(key: impl Into<String>) -> Self {
        Self::KeyCollision { key: key.into() }
    }
}
