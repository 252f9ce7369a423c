//! Trio Audio
//!
//! Sample-level processing for the Trio player.
//!
//! This crate provides:
//! - A graphic equalizer built from a fixed bank of biquad stages
//! - EQ presets
//! - An analysis tap with frequency and time-domain snapshots
//! - A gain stage
//! - The fixed processing graph: source → EQ → analysis tap → gain → output
//! - In-memory decoding (Symphonia) and resampling (rubato)
//! - Device output through CPAL (`desktop` feature)
//!
//! # Example
//!
//! ```rust
//! use trio_audio::{EqPreset, ProcessingGraph};
//!
//! let mut graph = ProcessingGraph::new(44_100);
//! graph.equalizer_mut().apply_preset(&EqPreset::bass_boost());
//! graph.gain_mut().set_gain(0.5);
//!
//! let mut block = vec![0.25f32; 512];
//! graph.process(&mut block);
//! ```

#![forbid(unsafe_code)]

pub mod decoder;
pub mod effects;
pub mod error;
pub mod graph;
#[cfg(feature = "desktop")]
pub mod output;
pub mod resampling;
pub mod source;

pub use decoder::{decode_bytes, DecodedAudio};
pub use effects::{
    clamp_gain, AnalyserTap, AudioEffect, EqPreset, Equalizer, GainStage, CUSTOM_PRESET_NAME,
    FLAT_PRESET_NAME, ISO_10_BAND_FREQUENCIES, MAX_GAIN_DB, MIN_GAIN_DB,
};
pub use error::{AudioError, Result};
pub use graph::ProcessingGraph;
pub use source::{AudioSource, MemorySource, CHANNELS};
