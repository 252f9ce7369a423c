//! Graphic equalizer
//!
//! A fixed bank of biquad stages in series, one per configured centre
//! frequency. The first band is a low shelf, the last a high shelf, and
//! every band in between a peaking filter with a moderate Q.
//!
//! The stages never leave the signal path. Disabling the equalizer sets every
//! gain to 0 dB, at which point each stage is transparent.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type, Q_BUTTERWORTH_F32};
use tracing::warn;

use super::presets::EqPreset;
use super::AudioEffect;

/// ISO octave-band centre frequencies (Hz)
pub const ISO_10_BAND_FREQUENCIES: [f32; 10] = [
    31.5, 63.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

/// Maximum band gain in dB
pub const MAX_GAIN_DB: f32 = 12.0;

/// Minimum band gain in dB
pub const MIN_GAIN_DB: f32 = -12.0;

/// Q used by the peaking bands
pub const PEAKING_Q: f32 = 1.41;

/// Clamp a gain to ±12 dB; NaN becomes 0 dB
pub fn clamp_gain(gain_db: f32) -> f32 {
    if gain_db.is_nan() {
        0.0
    } else {
        gain_db.clamp(MIN_GAIN_DB, MAX_GAIN_DB)
    }
}

/// Filter shape of a band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandKind {
    /// Boosts or cuts everything below the frequency
    LowShelf,
    /// Bell around the frequency
    Peaking,
    /// Boosts or cuts everything above the frequency
    HighShelf,
}

impl BandKind {
    fn for_position(index: usize, count: usize) -> Self {
        match index {
            _ if count < 2 => Self::Peaking,
            0 => Self::LowShelf,
            i if i == count - 1 => Self::HighShelf,
            _ => Self::Peaking,
        }
    }
}

/// One band: a stereo pair of filters sharing coefficients
struct Band {
    frequency: f32,
    kind: BandKind,
    gain_db: f32,
    left: DirectForm2Transposed<f32>,
    right: DirectForm2Transposed<f32>,
}

impl Band {
    fn new(frequency: f32, kind: BandKind, sample_rate: u32) -> Self {
        let coeffs = coefficients(kind, frequency, 0.0, sample_rate);
        Self {
            frequency,
            kind,
            gain_db: 0.0,
            left: DirectForm2Transposed::<f32>::new(coeffs),
            right: DirectForm2Transposed::<f32>::new(coeffs),
        }
    }

    fn update(&mut self, sample_rate: u32) {
        let coeffs = coefficients(self.kind, self.frequency, self.gain_db, sample_rate);
        self.left.update_coefficients(coeffs);
        self.right.update_coefficients(coeffs);
    }
}

/// Pass-through coefficients
const IDENTITY: Coefficients<f32> = Coefficients {
    a1: 0.0,
    a2: 0.0,
    b0: 1.0,
    b1: 0.0,
    b2: 0.0,
};

fn coefficients(kind: BandKind, frequency: f32, gain_db: f32, sample_rate: u32) -> Coefficients<f32> {
    let fs = sample_rate as f32;
    // Stay clear of Nyquist, biquad rejects f0 >= fs/2
    let f0 = frequency.min(fs * 0.45).max(1.0);

    let (filter, q) = match kind {
        BandKind::LowShelf => (Type::LowShelf(gain_db), Q_BUTTERWORTH_F32),
        BandKind::Peaking => (Type::PeakingEQ(gain_db), PEAKING_Q),
        BandKind::HighShelf => (Type::HighShelf(gain_db), Q_BUTTERWORTH_F32),
    };

    match Coefficients::<f32>::from_params(filter, fs.hz(), f0.hz(), q) {
        Ok(coeffs) => coeffs,
        Err(e) => {
            warn!(frequency, sample_rate, error = ?e, "Invalid EQ coefficients, band bypassed");
            IDENTITY
        }
    }
}

/// Graphic equalizer
pub struct Equalizer {
    bands: Vec<Band>,
    sample_rate: u32,
    enabled: bool,
}

impl Equalizer {
    /// Create a 10-band equalizer on the ISO octave frequencies
    pub fn new(sample_rate: u32) -> Self {
        Self::with_frequencies(&ISO_10_BAND_FREQUENCIES, sample_rate)
    }

    /// Create an equalizer with one band per frequency, all at 0 dB
    pub fn with_frequencies(frequencies: &[f32], sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1);
        let count = frequencies.len();
        let bands = frequencies
            .iter()
            .enumerate()
            .map(|(i, &f)| Band::new(f, BandKind::for_position(i, count), sample_rate))
            .collect();

        Self {
            bands,
            sample_rate,
            enabled: true,
        }
    }

    /// Number of bands
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Centre frequencies of all bands
    pub fn frequencies(&self) -> Vec<f32> {
        self.bands.iter().map(|b| b.frequency).collect()
    }

    /// Filter shape of a band
    pub fn band_kind(&self, index: usize) -> Option<BandKind> {
        self.bands.get(index).map(|b| b.kind)
    }

    /// Current gain of a band in dB
    pub fn band_gain(&self, index: usize) -> Option<f32> {
        self.bands.get(index).map(|b| b.gain_db)
    }

    /// Current gains of all bands in dB
    pub fn gains(&self) -> Vec<f32> {
        self.bands.iter().map(|b| b.gain_db).collect()
    }

    /// Set one band's gain, clamped to ±12 dB
    ///
    /// Out-of-range indices are ignored.
    pub fn set_band_gain(&mut self, index: usize, gain_db: f32) {
        let sample_rate = self.sample_rate;
        let Some(band) = self.bands.get_mut(index) else {
            return;
        };

        band.gain_db = clamp_gain(gain_db);
        band.update(sample_rate);
    }

    /// Set gains position by position
    ///
    /// A short slice updates only the leading bands; extra values are ignored.
    pub fn set_all_bands(&mut self, gains: &[f32]) {
        for (index, &gain) in gains.iter().enumerate().take(self.bands.len()) {
            self.set_band_gain(index, gain);
        }
    }

    /// Apply a preset's gains
    pub fn apply_preset(&mut self, preset: &EqPreset) {
        self.set_all_bands(&preset.gains);
    }

    /// Enable or bypass
    ///
    /// Bypassing forces every gain to 0 dB. Enabling does not restore the
    /// previous gains; the owner re-applies them.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            for index in 0..self.bands.len() {
                self.set_band_gain(index, 0.0);
            }
        }
    }

    /// Whether the equalizer is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sample rate the coefficients were computed for
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Recompute all coefficients for a new sample rate
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        let sample_rate = sample_rate.max(1);
        if sample_rate == self.sample_rate {
            return;
        }
        self.sample_rate = sample_rate;
        for band in &mut self.bands {
            band.update(sample_rate);
        }
    }

    /// Filter an interleaved stereo block through every band in series
    pub fn process_interleaved(&mut self, buffer: &mut [f32]) {
        for frame in buffer.chunks_exact_mut(2) {
            let mut left = frame[0];
            let mut right = frame[1];
            for band in &mut self.bands {
                left = band.left.run(left);
                right = band.right.run(right);
            }
            frame[0] = left;
            frame[1] = right;
        }
    }
}

impl AudioEffect for Equalizer {
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        self.set_sample_rate(sample_rate);
        self.process_interleaved(buffer);
    }

    fn reset(&mut self) {
        for band in &mut self.bands {
            band.left.reset_state();
            band.right.reset_state();
        }
    }

    fn name(&self) -> &str {
        "Equalizer"
    }
}
