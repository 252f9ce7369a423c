/// Audio-specific errors
use thiserror::Error;

/// Result type alias using `AudioError`
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio error types
#[derive(Error, Debug)]
pub enum AudioError {
    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Decoding error
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Resampling error
    #[error("Resample error: {0}")]
    ResampleError(String),

    /// Invalid audio buffer
    #[error("Invalid audio buffer: {0}")]
    InvalidBuffer(String),

    /// Seek error
    #[error("Seek error: {0}")]
    SeekError(String),

    /// No usable output device
    #[error("Output device not available: {0}")]
    DeviceUnavailable(String),

    /// Output stream error
    #[error("Output error: {0}")]
    Output(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Symphonia error
    #[error("Symphonia error: {0}")]
    Symphonia(String),
}

impl From<symphonia::core::errors::Error> for AudioError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        Self::Symphonia(err.to_string())
    }
}

impl From<AudioError> for trio_core::TrioError {
    fn from(err: AudioError) -> Self {
        trio_core::TrioError::Other(format!("Audio error: {}", err))
    }
}
