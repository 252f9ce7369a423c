//! Error types for playback

use thiserror::Error;
use trio_core::{TrackId, TrioError};

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Output context could not be created or resumed
    #[error("Audio initialization failed: {0}")]
    Initialization(String),

    /// Source could not be loaded (decode, network, file access)
    #[error("Load failed: {0}")]
    Load(String),

    /// Resolver found no playable stream for the track
    #[error("No playable stream found for track {0}")]
    Unresolvable(TrackId),

    /// No source is loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// HTTP error while fetching a stream
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Audio processing error
    #[error(transparent)]
    Audio(#[from] trio_audio::AudioError),

    /// Error from a collaborator or an invalid track
    #[error(transparent)]
    Core(#[from] TrioError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
