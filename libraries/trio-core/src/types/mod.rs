//! Domain types

mod ids;
mod settings;
mod track;

pub use ids::TrackId;
pub use settings::{PersistedSettings, RepeatMode};
pub use track::{LocalFileRef, MediaMetadata, Track, TrackSource};
