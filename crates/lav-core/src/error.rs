//! Error taxonomy for the query pipeline.
//!
//! [`ViewerError`] is what callers of the facade see. [`MalformedRecord`] is a
//! per-record error: sources and the sorter log it and skip the record, it
//! never propagates past them.

use thiserror::Error;

pub type Result<T, E = ViewerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ViewerError {
    /// The backing store could not be reached or is misconfigured.
    #[error("log source '{backend}' unavailable: {reason}")]
    SourceUnavailable { backend: String, reason: String },

    /// Reserved for semantically impossible filter combinations.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("log file not found: {0}")]
    FileNotFound(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A worker task (e.g. an offloaded sort) panicked or was cancelled.
    #[error("background task failed: {0}")]
    TaskFailed(String),
}

impl ViewerError {
    pub fn unavailable(backend: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            backend: backend.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }
}

/// A single record that could not be turned into a usable event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed record: {reason}")]
pub struct MalformedRecord {
    pub reason: String,
}

impl MalformedRecord {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
