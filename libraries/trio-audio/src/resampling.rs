//! Sample-rate conversion
//!
//! Decoded audio is converted once, up front, to the output context's rate.

use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use crate::error::{AudioError, Result};
use crate::source::CHANNELS;

/// Frames fed to the resampler per call
const CHUNK_SIZE: usize = 1024;

/// Resample interleaved stereo audio
///
/// Returns the input unchanged when the rates match.
pub fn resample_interleaved(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == 0 || to_rate == 0 {
        return Err(AudioError::ResampleError("sample rate is zero".to_string()));
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let mut resampler = FastFixedIn::<f32>::new(
        ratio,
        2.0, // max_resample_ratio_relative
        PolynomialDegree::Linear,
        CHUNK_SIZE,
        CHANNELS,
    )
    .map_err(|e| AudioError::ResampleError(format!("FastFixedIn creation failed: {}", e)))?;

    let frames = samples.len() / CHANNELS;
    let left: Vec<f32> = samples.iter().step_by(CHANNELS).copied().collect();
    let right: Vec<f32> = samples.iter().skip(1).step_by(CHANNELS).copied().collect();

    let mut out_left = Vec::with_capacity((frames as f64 * ratio) as usize + CHUNK_SIZE);
    let mut out_right = Vec::with_capacity(out_left.capacity());
    let mut pos = 0;

    while frames - pos >= resampler.input_frames_next() {
        let n = resampler.input_frames_next();
        let out = resampler
            .process(&[&left[pos..pos + n], &right[pos..pos + n]], None)
            .map_err(|e| AudioError::ResampleError(e.to_string()))?;
        out_left.extend_from_slice(&out[0]);
        out_right.extend_from_slice(&out[1]);
        pos += n;
    }

    if pos < frames {
        let out = resampler
            .process_partial(Some(&[&left[pos..], &right[pos..]]), None)
            .map_err(|e| AudioError::ResampleError(e.to_string()))?;
        out_left.extend_from_slice(&out[0]);
        out_right.extend_from_slice(&out[1]);
    }

    // Flush the samples still held back by the resampler delay
    let out = resampler
        .process_partial::<&[f32]>(None, None)
        .map_err(|e| AudioError::ResampleError(e.to_string()))?;
    out_left.extend_from_slice(&out[0]);
    out_right.extend_from_slice(&out[1]);

    let delay = resampler.output_delay().min(out_left.len());
    let expected = (frames as f64 * ratio).round() as usize;
    let available = out_left.len() - delay;

    let mut interleaved = Vec::with_capacity(expected * CHANNELS);
    for i in delay..delay + expected.min(available) {
        interleaved.push(out_left[i]);
        interleaved.push(out_right[i]);
    }
    Ok(interleaved)
}
