//! Player configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use trio_audio::ISO_10_BAND_FREQUENCIES;

/// Player configuration
///
/// Deserializable so applications can embed it in their own config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Equalizer centre frequencies; the band count follows this list
    pub band_frequencies: Vec<f32>,

    /// Progress below this restarts the current track on "previous" (seconds)
    pub restart_threshold_secs: f64,

    /// Output sample rate for headless playback
    pub sample_rate: u32,

    /// Interval between progress events while playing (milliseconds)
    pub progress_interval_ms: u64,

    /// Fixed shuffle seed, for reproducible runs
    pub shuffle_seed: Option<u64>,
}

impl PlayerConfig {
    /// Restart threshold as a `Duration`
    pub fn restart_threshold(&self) -> Duration {
        Duration::from_secs_f64(self.restart_threshold_secs.max(0.0))
    }

    /// Progress interval as a `Duration`
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(1))
    }

    /// Number of equalizer bands
    pub fn band_count(&self) -> usize {
        self.band_frequencies.len()
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            band_frequencies: ISO_10_BAND_FREQUENCIES.to_vec(),
            restart_threshold_secs: 3.0,
            sample_rate: 44_100,
            progress_interval_ms: 250,
            shuffle_seed: None,
        }
    }
}
