//! Observable player state
//!
//! Snapshot types handed to subscribers. Only `Player` mutates them.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use trio_audio::FLAT_PRESET_NAME;
use trio_core::{PersistedSettings, RepeatMode, Track};

use crate::queue::Queue;

/// What is playing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    /// Current track
    pub current_track: Option<Track>,
    /// Whether audio is playing
    pub is_playing: bool,
    /// Elapsed time in the current track, reset on track change
    pub progress: Duration,
    /// Duration, authoritative once the source reports it
    pub duration: Duration,
    /// Volume as set by the user (0.0 - 1.0), kept while muted
    pub volume: f32,
    /// Mute state
    pub muted: bool,
}

/// Equalizer state
///
/// `gains` is what the user configured. While disabled the live graph runs
/// flat but `gains` is left untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqState {
    /// One gain per band, in dB
    pub gains: Vec<f32>,
    /// Whether the equalizer is applied
    pub enabled: bool,
    /// Last applied preset, "Custom" after a manual edit
    pub preset_name: String,
}

/// Visualizer display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizerMode {
    /// Frequency bars
    #[default]
    Bars,
    /// Waveform
    Wave,
    /// Hidden
    Off,
}

/// UI-facing flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiState {
    /// A track is loading
    pub loading: bool,
    /// Last user-visible failure
    pub last_error: Option<String>,
    /// Visualizer mode
    pub visualizer: VisualizerMode,
}

/// Full player state snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Playback
    pub playback: PlaybackSnapshot,
    /// Queue
    pub queue: Queue,
    /// Shuffle enabled
    pub shuffle: bool,
    /// Repeat mode
    pub repeat: RepeatMode,
    /// Equalizer
    pub eq: EqState,
    /// UI flags
    pub ui: UiState,
}

impl PlayerState {
    /// Initial state for an equalizer with `band_count` bands
    pub fn new(band_count: usize) -> Self {
        Self {
            playback: PlaybackSnapshot {
                current_track: None,
                is_playing: false,
                progress: Duration::ZERO,
                duration: Duration::ZERO,
                volume: 0.8,
                muted: false,
            },
            queue: Queue::new(),
            shuffle: false,
            repeat: RepeatMode::Off,
            eq: EqState {
                gains: vec![0.0; band_count],
                enabled: true,
                preset_name: FLAT_PRESET_NAME.to_string(),
            },
            ui: UiState::default(),
        }
    }

    /// Durable subset
    pub fn persisted(&self) -> PersistedSettings {
        PersistedSettings {
            volume: self.playback.volume,
            shuffle: self.shuffle,
            repeat: self.repeat,
            eq_enabled: self.eq.enabled,
            eq_gains: self.eq.gains.clone(),
            eq_preset: self.eq.preset_name.clone(),
        }
    }
}
