//! Equalizer presets

use serde::{Deserialize, Serialize};

/// Name reported once a band has been edited by hand
pub const CUSTOM_PRESET_NAME: &str = "Custom";

/// Name of the all-zero preset
pub const FLAT_PRESET_NAME: &str = "Flat";

/// Named gain vector for the 10-band equalizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqPreset {
    /// Display name
    pub name: String,
    /// Gains in dB, one per band
    pub gains: Vec<f32>,
}

impl EqPreset {
    /// Create a preset
    pub fn new(name: impl Into<String>, gains: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            gains,
        }
    }

    /// All bands at 0 dB
    pub fn flat() -> Self {
        Self::new(FLAT_PRESET_NAME, vec![0.0; 10])
    }

    /// Low-end boost
    pub fn bass_boost() -> Self {
        Self::new(
            "Bass Boost",
            vec![6.0, 5.0, 4.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        )
    }

    /// High-end boost
    pub fn treble_boost() -> Self {
        Self::new(
            "Treble Boost",
            vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 4.0, 5.0, 6.0],
        )
    }

    /// Scooped mids
    pub fn v_shape() -> Self {
        Self::new(
            "V-Shape",
            vec![5.0, 4.0, 2.0, -1.0, -2.0, -2.0, -1.0, 2.0, 4.0, 5.0],
        )
    }

    /// Presence boost for voices
    pub fn vocal() -> Self {
        Self::new(
            "Vocal",
            vec![-2.0, -1.0, 0.0, 2.0, 4.0, 4.0, 2.0, 0.0, -1.0, -2.0],
        )
    }

    /// Rock
    pub fn rock() -> Self {
        Self::new(
            "Rock",
            vec![4.0, 3.0, 1.0, 0.0, -1.0, 0.0, 1.0, 3.0, 4.0, 4.0],
        )
    }

    /// Electronic
    pub fn electronic() -> Self {
        Self::new(
            "Electronic",
            vec![5.0, 4.0, 2.0, 0.0, 1.0, 2.0, 1.0, 3.0, 4.0, 4.0],
        )
    }

    /// Acoustic
    pub fn acoustic() -> Self {
        Self::new(
            "Acoustic",
            vec![2.0, 1.0, 0.0, 1.0, 2.0, 2.0, 1.0, 2.0, 2.0, 1.0],
        )
    }

    /// All built-in presets, Flat first
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::flat(),
            Self::bass_boost(),
            Self::treble_boost(),
            Self::v_shape(),
            Self::vocal(),
            Self::rock(),
            Self::electronic(),
            Self::acoustic(),
        ]
    }

    /// Look up a built-in preset by name (case-insensitive)
    pub fn by_name(name: &str) -> Option<Self> {
        Self::builtin()
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_presets_cover_ten_bands_within_range() {
        for preset in EqPreset::builtin() {
            assert_eq!(preset.gains.len(), 10, "{}", preset.name);
            assert!(preset.gains.iter().all(|g| (-12.0..=12.0).contains(g)));
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(EqPreset::by_name("v-shape"), Some(EqPreset::v_shape()));
        assert_eq!(EqPreset::by_name("Custom"), None);
    }
}
