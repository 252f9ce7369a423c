//! Repeat mode and the durable settings subset

use serde::{Deserialize, Serialize};

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// No repeat, stop after the last entry
    #[default]
    Off,

    /// Wrap to the first entry after the last one
    All,

    /// Replay the current track when it ends
    One,
}

impl RepeatMode {
    /// Next mode in the off → all → one cycle
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }
}

/// Settings that survive a restart
///
/// Queue contents and playback position are deliberately not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedSettings {
    /// Volume (0.0 - 1.0)
    pub volume: f32,
    /// Shuffle enabled
    pub shuffle: bool,
    /// Repeat mode
    pub repeat: RepeatMode,
    /// Equalizer enabled
    pub eq_enabled: bool,
    /// Stored band gains in dB
    pub eq_gains: Vec<f32>,
    /// Name of the last applied preset
    pub eq_preset: String,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self {
            volume: 0.8,
            shuffle: false,
            repeat: RepeatMode::Off,
            eq_enabled: true,
            eq_gains: Vec::new(),
            eq_preset: "Flat".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_cycles_through_all_modes() {
        assert_eq!(RepeatMode::Off.cycle(), RepeatMode::All);
        assert_eq!(RepeatMode::All.cycle(), RepeatMode::One);
        assert_eq!(RepeatMode::One.cycle(), RepeatMode::Off);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: PersistedSettings = serde_json::from_str(r#"{"volume":0.3}"#).unwrap();
        assert_eq!(settings.volume, 0.3);
        assert_eq!(settings.repeat, RepeatMode::Off);
        assert_eq!(settings.eq_preset, "Flat");
    }
}
