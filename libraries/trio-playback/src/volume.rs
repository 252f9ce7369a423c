//! Volume with mute
//!
//! Linear 0.0 - 1.0, applied at the engine's gain stage. Muting keeps the
//! pre-mute level so un-muting restores exactly that value.

/// Volume controller
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    /// Level (0.0 - 1.0), kept while muted
    level: f32,

    /// Mute state
    muted: bool,
}

impl Volume {
    /// Create a volume controller, clamped to 0.0 - 1.0
    pub fn new(level: f32) -> Self {
        Self {
            level: clamp_level(level),
            muted: false,
        }
    }

    /// Set the level
    ///
    /// Setting a level also un-mutes.
    pub fn set_level(&mut self, level: f32) {
        self.level = clamp_level(level);
        self.muted = false;
    }

    /// Level as set by the user, regardless of mute
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Toggle mute state
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Gain to apply: 0.0 when muted, otherwise the level
    pub fn effective(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.level
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(0.8)
    }
}

fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}
