//! Platform-agnostic audio source trait
//!
//! Sources deliver interleaved stereo `f32` at the output sample rate. The
//! engine pulls from exactly one source at a time.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{AudioError, Result};

/// Channel count of every source and of the processing graph
pub const CHANNELS: usize = 2;

/// Platform-agnostic audio source
pub trait AudioSource: Send {
    /// Read the next chunk of interleaved stereo samples
    ///
    /// # Returns
    /// * `Ok(n)` - Number of samples written (0 = end of source)
    /// * `Err(_)` - Decoding error
    fn read_samples(&mut self, buffer: &mut [f32]) -> Result<usize>;

    /// Seek to a position from the start
    fn seek(&mut self, position: Duration) -> Result<()>;

    /// Total duration, zero when unknown
    fn duration(&self) -> Duration;

    /// Current position
    fn position(&self) -> Duration;

    /// Sample rate of the delivered samples
    fn sample_rate(&self) -> u32;

    /// Whether no more samples are available
    fn is_finished(&self) -> bool;

    /// Rewind to the start
    ///
    /// Equivalent to `seek(Duration::ZERO)`
    fn reset(&mut self) -> Result<()> {
        self.seek(Duration::ZERO)
    }
}

/// Fully decoded audio held in memory
#[derive(Debug, Clone)]
pub struct MemorySource {
    samples: Arc<[f32]>,
    sample_rate: u32,
    /// Read position in frames
    cursor: usize,
}

impl MemorySource {
    /// Wrap interleaved stereo samples
    pub fn new(samples: impl Into<Arc<[f32]>>, sample_rate: u32) -> Result<Self> {
        let samples = samples.into();
        if sample_rate == 0 {
            return Err(AudioError::InvalidBuffer("sample rate is zero".into()));
        }
        if samples.len() % CHANNELS != 0 {
            return Err(AudioError::InvalidBuffer(format!(
                "{} samples is not a whole number of stereo frames",
                samples.len()
            )));
        }

        Ok(Self {
            samples,
            sample_rate,
            cursor: 0,
        })
    }

    /// Silent source of the given length
    pub fn silence(duration: Duration, sample_rate: u32) -> Result<Self> {
        let frames = (duration.as_secs_f64() * f64::from(sample_rate)).round() as usize;
        Self::new(vec![0.0f32; frames * CHANNELS], sample_rate)
    }

    /// Number of frames
    pub fn frames(&self) -> usize {
        self.samples.len() / CHANNELS
    }
}

fn frames_to_duration(frames: usize, sample_rate: u32) -> Duration {
    let rate = u64::from(sample_rate.max(1));
    let frames = frames as u64;
    Duration::from_secs(frames / rate) + Duration::from_nanos((frames % rate) * 1_000_000_000 / rate)
}

impl AudioSource for MemorySource {
    fn read_samples(&mut self, buffer: &mut [f32]) -> Result<usize> {
        let start = self.cursor * CHANNELS;
        let available = self.samples.len().saturating_sub(start);
        let wanted = (buffer.len() / CHANNELS) * CHANNELS;
        let count = wanted.min(available);

        buffer[..count].copy_from_slice(&self.samples[start..start + count]);
        self.cursor += count / CHANNELS;
        Ok(count)
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        let frame = (position.as_secs_f64() * f64::from(self.sample_rate)).round() as usize;
        self.cursor = frame.min(self.frames());
        Ok(())
    }

    fn duration(&self) -> Duration {
        frames_to_duration(self.frames(), self.sample_rate)
    }

    fn position(&self) -> Duration {
        frames_to_duration(self.cursor, self.sample_rate)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_finished(&self) -> bool {
        self.cursor >= self.frames()
    }
}
