//! Trio Core
//!
//! Platform-agnostic domain types, collaborator contracts, and error handling
//! for the Trio player.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `TrackSource`, `RepeatMode`, `PersistedSettings`
//! - **Collaborator Traits**: `LocalFileProvider`, `StreamResolver`, `SettingsStore`,
//!   `MediaSession`
//! - **Error Handling**: Unified `TrioError` and `Result` types
//!
//! Tracks are created by the collaborators that discover them (a directory
//! scanner, a catalog search, a stream bridge) and are handed to the player as
//! immutable values.
//!
//! # Example
//!
//! ```rust
//! use trio_core::types::{LocalFileRef, Track, TrackSource};
//! use std::time::Duration;
//!
//! let track = Track::new(
//!     "Blue in Green",
//!     "Miles Davis",
//!     "Kind of Blue",
//!     Duration::from_secs(337),
//!     TrackSource::Local { file: LocalFileRef::new("/music/blue-in-green.flac") },
//! );
//!
//! assert!(track.validate().is_ok());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod resolver;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{Result, TrioError};
pub use resolver::FailoverResolver;
pub use traits::{
    LocalFileProvider, MediaAction, MediaActionHandler, MediaSession, NoopMediaSession,
    SettingsStore, StreamResolver,
};
pub use types::{
    LocalFileRef, MediaMetadata, PersistedSettings, RepeatMode, Track, TrackId, TrackSource,
};
