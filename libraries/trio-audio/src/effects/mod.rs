//! Processing stages
//!
//! Every stage works in place on interleaved stereo `f32` blocks.

mod analyser;
mod equalizer;
mod gain;
mod presets;

pub use analyser::{AnalyserTap, DEFAULT_FFT_SIZE};
pub use equalizer::{
    clamp_gain, BandKind, Equalizer, ISO_10_BAND_FREQUENCIES, MAX_GAIN_DB, MIN_GAIN_DB, PEAKING_Q,
};
pub use gain::GainStage;
pub use presets::{EqPreset, CUSTOM_PRESET_NAME, FLAT_PRESET_NAME};

/// A stage in the processing graph
pub trait AudioEffect: Send {
    /// Process an interleaved stereo block in place
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32);

    /// Clear internal state (filter memory, analysis history)
    fn reset(&mut self);

    /// Stage name, for logs
    fn name(&self) -> &str;
}
