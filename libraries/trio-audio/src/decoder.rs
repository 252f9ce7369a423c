//! In-memory decoding with Symphonia
//!
//! Local files arrive as bytes from a file provider and streams arrive as a
//! downloaded body, so everything is decoded from memory. Output is always
//! interleaved stereo `f32`: mono is duplicated, extra channels beyond the
//! first two are dropped.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::error::{AudioError, Result};
use crate::resampling::resample_interleaved;
use crate::source::{MemorySource, CHANNELS};

/// Decoded PCM at the file's native sample rate
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved stereo samples
    pub samples: Vec<f32>,
    /// Native sample rate
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Number of stereo frames
    pub fn frames(&self) -> usize {
        self.samples.len() / CHANNELS
    }

    /// Resample to the output rate and wrap as a playable source
    pub fn into_source(self, output_rate: u32) -> Result<MemorySource> {
        let samples = resample_interleaved(&self.samples, self.sample_rate, output_rate)?;
        MemorySource::new(samples, output_rate)
    }
}

/// Decode a complete audio file held in memory
///
/// # Arguments
/// * `bytes` - Encoded file contents
/// * `extension` - Optional file extension to help format detection
pub fn decode_bytes<B>(bytes: B, extension: Option<&str>) -> Result<DecodedAudio>
where
    B: AsRef<[u8]> + Send + Sync + 'static,
{
    if bytes.as_ref().is_empty() {
        return Err(AudioError::DecodeError("empty input".to_string()));
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::UnsupportedFormat(format!("Failed to probe input: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::DecodeError("No audio tracks found".to_string()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Symphonia(format!("Failed to create decoder: {}", e)))?;

    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AudioError::Symphonia(format!("Error reading packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(error = %e, "Skipping corrupt packet");
                continue;
            }
            Err(e) => return Err(AudioError::DecodeError(e.to_string())),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        let channels = spec.channels.count();
        if channels == 0 {
            continue;
        }

        let fits = matches!(&sample_buf, Some(buf) if buf.capacity() >= decoded.capacity() * channels);
        if !fits {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }
        let Some(buf) = sample_buf.as_mut() else {
            continue;
        };
        buf.copy_interleaved_ref(decoded);

        for frame in buf.samples().chunks_exact(channels) {
            let left = frame[0];
            let right = if channels > 1 { frame[1] } else { left };
            samples.push(left);
            samples.push(right);
        }
    }

    if samples.is_empty() {
        return Err(AudioError::DecodeError("No audio decoded".to_string()));
    }

    debug!(
        frames = samples.len() / CHANNELS,
        sample_rate, "Decoded audio from memory"
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}
