//! Error types for the conversational layer.
//!
//! The engine itself never fails; these cover the host around it.

use std::path::PathBuf;

use ozbot_core::error::OzbotError;

/// Errors from the assistant host, catalog, transcript and voice loop.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("invalid procedure {id:?}: {reason}")]
    InvalidProcedure { id: String, reason: String },
    #[error("duplicate procedure id in upload: {0}")]
    DuplicateProcedure(String),
    #[error("failed to load catalog file {path}: {reason}")]
    CatalogFile { path: PathBuf, reason: String },
    #[error("start date {start} is after end date {end}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
    #[error("no chat history to export")]
    EmptyReport,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("voice error: {0}")]
    VoiceError(String),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<OzbotError> for ChatError {
    fn from(err: OzbotError) -> Self {
        match err {
            OzbotError::InvalidProcedure { id, reason } => ChatError::InvalidProcedure { id, reason },
            OzbotError::Config(msg) => ChatError::Config(msg),
            other => ChatError::StorageError(other.to_string()),
        }
    }
}

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        ChatError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::StorageError(err.to_string())
    }
}
