/// Collaborator contracts consumed by the player
///
/// Everything the player needs from the outside world is expressed here as a
/// narrow trait, so scanners, catalog clients, and platform integrations stay
/// outside the playback core.
use crate::error::Result;
use crate::types::{LocalFileRef, MediaMetadata, PersistedSettings, Track};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Supplies the bytes of a local audio file on demand
#[async_trait]
pub trait LocalFileProvider: Send + Sync {
    /// Read the complete file
    ///
    /// # Errors
    /// Returns an error if the file moved or permission was revoked
    async fn read(&self, file: &LocalFileRef) -> Result<Vec<u8>>;
}

/// Turns a catalog track without a direct URL into a playable URL
#[async_trait]
pub trait StreamResolver: Send + Sync {
    /// Resolve a playable URL
    ///
    /// `Ok(None)` means no match was found. The player treats that as
    /// "cannot play" and never retries on its own.
    async fn resolve(&self, track: &Track) -> Result<Option<String>>;
}

/// Durable storage for `PersistedSettings`
pub trait SettingsStore: Send + Sync {
    /// Load previously saved settings, `None` on first start
    fn load(&self) -> Result<Option<PersistedSettings>>;

    /// Save settings for the next start
    fn save(&self, settings: &PersistedSettings) -> Result<()>;
}

/// Control requests arriving from the platform (media keys, lock screen)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaAction {
    /// Resume playback
    Play,
    /// Pause playback
    Pause,
    /// Seek backwards by an offset
    SeekBackward(Duration),
    /// Seek forwards by an offset
    SeekForward(Duration),
    /// Skip to the next track
    NextTrack,
    /// Go to the previous track
    PreviousTrack,
}

/// Handler invoked for every incoming `MediaAction`
pub type MediaActionHandler = Arc<dyn Fn(MediaAction) + Send + Sync>;

/// Platform media-session integration
///
/// Best effort: an implementation may drop any call it cannot honour.
pub trait MediaSession: Send + Sync {
    /// Publish now-playing metadata, `None` clears it
    fn set_metadata(&self, metadata: Option<&MediaMetadata>);

    /// Publish whether audio is currently playing
    fn set_playback_state(&self, playing: bool);

    /// Register the handler for external control requests
    fn set_action_handler(&self, handler: MediaActionHandler);
}

/// Media session for platforms without one
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMediaSession;

impl MediaSession for NoopMediaSession {
    fn set_metadata(&self, _metadata: Option<&MediaMetadata>) {}

    fn set_playback_state(&self, _playing: bool) {}

    fn set_action_handler(&self, _handler: MediaActionHandler) {}
}
