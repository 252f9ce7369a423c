//! Output gain stage

use super::AudioEffect;

/// Linear gain applied after analysis
///
/// Gain persists across source swaps; only `set_gain` changes it.
#[derive(Debug, Clone)]
pub struct GainStage {
    gain: f32,
}

impl GainStage {
    /// Create a gain stage, clamped to 0.0 - 1.0
    pub fn new(gain: f32) -> Self {
        let mut stage = Self { gain: 1.0 };
        stage.set_gain(gain);
        stage
    }

    /// Set the gain, clamped to 0.0 - 1.0
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = if gain.is_nan() { 0.0 } else { gain.clamp(0.0, 1.0) };
    }

    /// Current gain
    pub fn gain(&self) -> f32 {
        self.gain
    }
}

impl Default for GainStage {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl AudioEffect for GainStage {
    fn process(&mut self, buffer: &mut [f32], _sample_rate: u32) {
        if (self.gain - 1.0).abs() < f32::EPSILON {
            return;
        }
        for sample in buffer.iter_mut() {
            *sample *= self.gain;
        }
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "Gain"
    }
}
