//! Track types
//!
//! A `Track` is created by whichever collaborator discovered it and is only
//! ever read by the player.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::TrackId;
use crate::error::{Result, TrioError};

/// Reference to a local audio file
///
/// The player never opens it directly; a `LocalFileProvider` turns it into
/// bytes on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalFileRef(String);

impl LocalFileRef {
    /// Create a new file reference
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Get the inner reference
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased file extension, if the reference has one
    pub fn extension(&self) -> Option<String> {
        let name = self.0.rsplit(['/', '\\']).next()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// Where a track's audio comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackSource {
    /// File scanned from a local directory
    Local {
        /// Handle used to read the file bytes
        file: LocalFileRef,
    },

    /// Track from the remote catalog
    ///
    /// Catalog tracks may carry a direct stream URL. Without one, the URL
    /// is obtained from a `StreamResolver` at play time.
    Catalog {
        /// Catalog identifier
        catalog_id: String,
        /// Direct playable URL, when the catalog supplies one
        stream_url: Option<String>,
    },

    /// Track whose playable URL was obtained through the stream bridge
    ResolvedStream {
        /// Playable URL
        url: String,
    },
}

/// A playable audio item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Globally unique identifier
    pub id: TrackId,
    /// Track title
    pub title: String,
    /// Artist name
    pub artist: String,
    /// Album name
    pub album: String,
    /// Duration, zero when unknown until the audio is loaded
    pub duration: Duration,
    /// Artwork URL, if any
    pub artwork: Option<String>,
    /// Source of the audio
    pub source: TrackSource,
}

impl Track {
    /// Create a track with a freshly generated ID
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        duration: Duration,
        source: TrackSource,
    ) -> Self {
        Self {
            id: TrackId::generate(),
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            duration,
            artwork: None,
            source,
        }
    }

    /// Replace the generated ID
    #[must_use]
    pub fn with_id(mut self, id: impl Into<TrackId>) -> Self {
        self.id = id.into();
        self
    }

    /// Attach artwork
    #[must_use]
    pub fn with_artwork(mut self, artwork: impl Into<String>) -> Self {
        self.artwork = Some(artwork.into());
        self
    }

    /// Check the source invariant
    ///
    /// A resolved stream must carry a non-empty URL and a local track must
    /// carry a non-empty file reference.
    pub fn validate(&self) -> Result<()> {
        match &self.source {
            TrackSource::ResolvedStream { url } if url.trim().is_empty() => Err(
                TrioError::invalid_track(format!("resolved stream {} has no URL", self.id)),
            ),
            TrackSource::Local { file } if file.as_str().trim().is_empty() => Err(
                TrioError::invalid_track(format!("local track {} has no file reference", self.id)),
            ),
            TrackSource::Catalog { catalog_id, stream_url }
                if catalog_id.trim().is_empty()
                    && !stream_url.as_deref().is_some_and(|u| !u.trim().is_empty()) =>
            {
                Err(TrioError::invalid_track(format!(
                    "catalog track {} has neither an identifier nor a URL",
                    self.id
                )))
            }
            _ => Ok(()),
        }
    }

    /// URL the track can be streamed from without resolution
    pub fn playable_url(&self) -> Option<&str> {
        match &self.source {
            TrackSource::ResolvedStream { url } => Some(url.as_str()),
            TrackSource::Catalog {
                stream_url: Some(url),
                ..
            } if !url.trim().is_empty() => Some(url.as_str()),
            _ => None,
        }
    }

    /// Whether a `StreamResolver` must be consulted before playing
    pub fn needs_resolution(&self) -> bool {
        matches!(self.source, TrackSource::Catalog { .. }) && self.playable_url().is_none()
    }

    /// Metadata pushed to the platform media session
    pub fn metadata(&self) -> MediaMetadata {
        MediaMetadata {
            title: self.title.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
            artwork: self.artwork.clone(),
        }
    }
}

/// Now-playing metadata for media-session integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Track title
    pub title: String,
    /// Artist name
    pub artist: String,
    /// Album name
    pub album: String,
    /// Artwork URL
    pub artwork: Option<String>,
}
