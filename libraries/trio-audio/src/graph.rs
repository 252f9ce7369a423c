//! Fixed processing graph
//!
//! source → equalizer (bands in series) → analysis tap → gain → output
//!
//! The order never changes and no stage is ever removed. The graph outlives
//! individual sources, so EQ and gain settings carry over track changes.

use tracing::debug;

use crate::effects::{AnalyserTap, AudioEffect, Equalizer, GainStage};

/// The processing graph applied to every rendered block
pub struct ProcessingGraph {
    sample_rate: u32,
    equalizer: Equalizer,
    analyser: AnalyserTap,
    gain: GainStage,
}

impl ProcessingGraph {
    /// Create a graph with a 10-band equalizer
    pub fn new(sample_rate: u32) -> Self {
        Self::with_equalizer(Equalizer::new(sample_rate))
    }

    /// Create a graph around a preconfigured equalizer
    pub fn with_equalizer(equalizer: Equalizer) -> Self {
        Self {
            sample_rate: equalizer.sample_rate(),
            equalizer,
            analyser: AnalyserTap::default(),
            gain: GainStage::default(),
        }
    }

    /// Sample rate the graph runs at
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Switch to the output's sample rate
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate != self.sample_rate {
            debug!(from = self.sample_rate, to = sample_rate, "Processing graph sample rate changed");
            self.sample_rate = sample_rate;
            self.equalizer.set_sample_rate(sample_rate);
        }
    }

    /// Equalizer stage
    pub fn equalizer(&self) -> &Equalizer {
        &self.equalizer
    }

    /// Equalizer stage, mutable
    pub fn equalizer_mut(&mut self) -> &mut Equalizer {
        &mut self.equalizer
    }

    /// Analysis tap
    pub fn analyser(&self) -> &AnalyserTap {
        &self.analyser
    }

    /// Analysis tap, mutable (frequency snapshots update smoothing state)
    pub fn analyser_mut(&mut self) -> &mut AnalyserTap {
        &mut self.analyser
    }

    /// Gain stage
    pub fn gain(&self) -> &GainStage {
        &self.gain
    }

    /// Gain stage, mutable
    pub fn gain_mut(&mut self) -> &mut GainStage {
        &mut self.gain
    }

    /// Run one interleaved stereo block through every stage in order
    pub fn process(&mut self, buffer: &mut [f32]) {
        let sample_rate = self.sample_rate;
        self.equalizer.process(buffer, sample_rate);
        self.analyser.process(buffer, sample_rate);
        self.gain.process(buffer, sample_rate);
    }

    /// Clear filter memory and analysis history (on source swap)
    pub fn reset(&mut self) {
        self.equalizer.reset();
        self.analyser.reset();
        self.gain.reset();
    }
}
