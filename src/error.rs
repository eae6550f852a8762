//! Error types for duel replay
//!
//! Only decode/parse boundaries can fail. Playback itself is infallible:
//! duplicate calls, cancelled tasks and not-ready engines are absorbed.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Unknown card: {0}")]
    UnknownCard(String),

    #[error("Invalid step {index}: {reason}")]
    InvalidStep { index: usize, reason: String },

    #[error("Invalid duel record: {0}")]
    InvalidRecord(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReplayError>;
