//! Analysis tap
//!
//! Passes audio through untouched while keeping the most recent mono
//! history, from which frequency and time-domain snapshots are computed on
//! demand for a visualizer.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::AudioEffect;

/// FFT size used by `AnalyserTap::default()`
pub const DEFAULT_FFT_SIZE: usize = 2048;

/// Floor of the normalized magnitude scale (dBFS)
const MIN_DB: f32 = -100.0;

/// Ceiling of the normalized magnitude scale (dBFS)
const MAX_DB: f32 = -30.0;

/// Smoothing between consecutive frequency snapshots
const DEFAULT_SMOOTHING: f32 = 0.8;

/// Hann window, reduces spectral leakage
fn hann_window(n: usize, size: usize) -> f32 {
    0.5 * (1.0 - (2.0 * std::f32::consts::PI * n as f32 / (size - 1) as f32).cos())
}

/// Analysis tap between the equalizer and the gain stage
pub struct AnalyserTap {
    fft_size: usize,
    /// Ring buffer of mono samples
    history: Vec<f32>,
    write_pos: usize,
    window: Vec<f32>,
    window_sum: f32,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothing: f32,
    smoothed: Vec<f32>,
}

impl AnalyserTap {
    /// Create a tap with the given FFT size (rounded up to a power of two, minimum 32)
    pub fn new(fft_size: usize) -> Self {
        let fft_size = fft_size.max(32).next_power_of_two();
        let window: Vec<f32> = (0..fft_size).map(|i| hann_window(i, fft_size)).collect();
        let window_sum = window.iter().sum();

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);

        Self {
            fft_size,
            history: vec![0.0; fft_size],
            write_pos: 0,
            window,
            window_sum,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            smoothing: DEFAULT_SMOOTHING,
            smoothed: vec![0.0; fft_size / 2],
        }
    }

    /// FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of frequency bins returned by `frequency_data`
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Set snapshot smoothing, clamped to 0.0 - 1.0 (0 = none)
    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.smoothing = smoothing.clamp(0.0, 1.0);
    }

    /// Record an interleaved stereo block
    pub fn push_interleaved(&mut self, buffer: &[f32]) {
        for frame in buffer.chunks_exact(2) {
            self.history[self.write_pos] = (frame[0] + frame[1]) * 0.5;
            self.write_pos = (self.write_pos + 1) % self.fft_size;
        }
    }

    /// Latest `fft_size` mono samples, oldest first
    pub fn time_domain_data(&self) -> Vec<f32> {
        let mut ordered = Vec::with_capacity(self.fft_size);
        ordered.extend_from_slice(&self.history[self.write_pos..]);
        ordered.extend_from_slice(&self.history[..self.write_pos]);
        ordered
    }

    /// Magnitude spectrum, `fft_size / 2` bins normalized to 0.0 - 1.0
    ///
    /// Bin `k` is centred on `k * sample_rate / fft_size` Hz.
    pub fn frequency_data(&mut self) -> Vec<f32> {
        let ordered = self.time_domain_data();
        for (i, (slot, sample)) in self.scratch.iter_mut().zip(&ordered).enumerate() {
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        let scale = 2.0 / self.window_sum.max(f32::EPSILON);
        for (bin, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.scratch[bin].norm() * scale;
            let db = 20.0 * magnitude.max(1e-10).log10();
            let normalized = ((db - MIN_DB) / (MAX_DB - MIN_DB)).clamp(0.0, 1.0);
            *smoothed = self.smoothing * *smoothed + (1.0 - self.smoothing) * normalized;
        }

        self.smoothed.clone()
    }
}

impl Default for AnalyserTap {
    fn default() -> Self {
        Self::new(DEFAULT_FFT_SIZE)
    }
}

impl AudioEffect for AnalyserTap {
    fn process(&mut self, buffer: &mut [f32], _sample_rate: u32) {
        self.push_interleaved(buffer);
    }

    fn reset(&mut self) {
        self.history.fill(0.0);
        self.smoothed.fill(0.0);
        self.write_pos = 0;
    }

    fn name(&self) -> &str {
        "Analyser"
    }
}
