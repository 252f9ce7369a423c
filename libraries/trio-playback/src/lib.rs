//! Trio - Playback Engine and Coordinator
//!
//! This crate owns the single authoritative notion of "what is playing":
//! - `PlaybackEngine`: one active source, the fixed processing graph, and
//!   transport primitives (load, play, pause, seek, volume)
//! - `Queue`: ordered tracks plus a cursor that survives every mutation
//! - `Player`: the state store and queue/transport coordinator, the only
//!   mutation surface for playback, queue, EQ, and UI state
//!
//! Platform specifics (device output, decoding, HTTP) sit behind the
//! `AudioBackend` trait. Everything else the player needs from outside is
//! expressed by the collaborator traits in `trio-core`.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trio_core::types::{LocalFileRef, Track, TrackSource};
//! use trio_playback::{DefaultBackend, FsFileProvider, Player, PlayerConfig};
//!
//! # async fn run() -> trio_playback::Result<()> {
//! let config = PlayerConfig::default();
//! let player = Player::builder(Arc::new(DefaultBackend::headless(config.sample_rate)))
//!     .config(config)
//!     .file_provider(Arc::new(FsFileProvider))
//!     .build();
//! let _events = player.spawn_event_loop();
//!
//! let track = Track::new(
//!     "Song",
//!     "Artist",
//!     "Album",
//!     std::time::Duration::ZERO,
//!     TrackSource::Local { file: LocalFileRef::new("/music/song.flac") },
//! );
//! player.play_track(track, None).await?;
//! player.set_volume(0.6);
//! # Ok(())
//! # }
//! ```

mod backend;
mod blob;
mod config;
mod engine;
mod error;
mod events;
mod listeners;
mod local;
mod player;
mod queue;
mod settings;
mod store;
mod volume;

// Public exports
pub use backend::{AudioBackend, DefaultBackend, HeadlessContext, OutputContext};
pub use blob::{BlobHandle, BlobRegistry};
pub use config::PlayerConfig;
pub use engine::{EngineState, LoadOutcome, PlaybackEngine, Renderer};
pub use error::{PlaybackError, Result};
pub use events::{EngineEvent, EngineFailure, FailureStage};
pub use listeners::{Listeners, Subscription};
pub use local::{FsFileProvider, MemoryFileProvider};
pub use player::{Player, PlayerBuilder};
pub use queue::Queue;
pub use settings::{JsonFileSettingsStore, MemorySettingsStore};
pub use store::{EqState, PlaybackSnapshot, PlayerState, UiState, VisualizerMode};
pub use volume::Volume;
