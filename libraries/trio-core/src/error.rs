/// Core error types for Trio
use thiserror::Error;

/// Result type alias using `TrioError`
pub type Result<T> = std::result::Result<T, TrioError>;

/// Core error type for Trio
#[derive(Error, Debug)]
pub enum TrioError {
    /// Track value violates its source invariant
    #[error("Invalid track: {0}")]
    InvalidTrack(String),

    /// Local file could not be read (moved, revoked permission, ...)
    #[error("File unavailable: {0}")]
    FileUnavailable(String),

    /// Stream resolution failed with a transport or service error
    #[error("Resolver error: {0}")]
    Resolver(String),

    /// Settings could not be loaded or saved
    #[error("Settings error: {0}")]
    Settings(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl TrioError {
    /// Create an invalid track error
    pub fn invalid_track(msg: impl Into<String>) -> Self {
        Self::InvalidTrack(msg.into())
    }

    /// Create a file unavailable error
    pub fn file_unavailable(msg: impl Into<String>) -> Self {
        Self::FileUnavailable(msg.into())
    }

    /// Create a resolver error
    pub fn resolver(msg: impl Into<String>) -> Self {
        Self::Resolver(msg.into())
    }

    /// Create a settings error
    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }
}
