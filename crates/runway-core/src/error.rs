//! Error types for the runway alert system
//!
//! Every failure is scoped to the smallest unit it affects: one refresh
//! cycle (`SourceUnavailable`, `SourceMalformed`), one change event
//! (`Repository`), or one recipient (`Transport`). None of them are fatal
//! to the watcher or dispatcher.

use thiserror::Error;

/// Result type alias for runway alert operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the runway alert system
#[derive(Error, Debug)]
pub enum Error {
    /// The runway-usage source could not be reached, timed out, or
    /// answered with a non-success status
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// The runway-usage source answered with a payload that does not have
    /// the expected shape
    #[error("Source response malformed: {0}")]
    SourceMalformed(String),

    /// The subscriber repository could not enumerate subscribers
    #[error("Subscriber repository error: {0}")]
    Repository(String),

    /// A single notification could not be delivered
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a source-unavailable error
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Create a source-malformed error
    pub fn source_malformed(msg: impl Into<String>) -> Self {
        Self::SourceMalformed(msg.into())
    }

    /// Create a subscriber repository error
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error aborts a single refresh cycle
    pub fn is_source_error(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_) | Self::SourceMalformed(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
