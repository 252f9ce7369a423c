//! Playback engine
//!
//! Owns exactly one active source and the fixed processing graph
//! (source → EQ → analysis tap → gain → output), and exposes transport
//! primitives over them.
//!
//! ```text
//! Uninitialized → Ready → Loading → Ready → Playing ⇄ Paused
//!                   ↑                          │
//!                   └──── load of new source ──┘
//! ```
//!
//! Loads are numbered. A load that finishes after a newer one was issued is
//! discarded and reported as `LoadOutcome::Superseded`, so the most recent
//! request always wins regardless of completion order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use trio_audio::{AudioSource, EqPreset, Equalizer, ProcessingGraph, CHANNELS};
use trio_core::{LocalFileProvider, LocalFileRef};

use crate::backend::{AudioBackend, OutputContext};
use crate::blob::{BlobHandle, BlobRegistry};
use crate::config::PlayerConfig;
use crate::error::{PlaybackError, Result};
use crate::events::{EngineEvent, EngineFailure, FailureStage};
use crate::listeners::{Listeners, Subscription};

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// No output context
    Uninitialized,
    /// Context available, no source playing
    Ready,
    /// A source is being fetched or decoded
    Loading,
    /// Rendering the active source
    Playing,
    /// Source loaded but not rendering
    Paused,
}

/// Result of a load request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Source is active and ready to play
    Loaded {
        /// Load sequence number, carried by this source's events
        load_id: u64,
        /// Source duration
        duration: Duration,
    },
    /// A newer load was issued before this one finished
    Superseded,
}

struct EngineInner {
    state: EngineState,
    context: Option<Arc<dyn OutputContext>>,
    graph: ProcessingGraph,
    source: Option<Box<dyn AudioSource>>,
    blob: Option<BlobHandle>,
    /// Latest load issued
    load_seq: u64,
    /// Load the active source came from
    active_load: u64,
    ended_emitted: bool,
    progress_interval_frames: usize,
    frames_since_progress: usize,
}

impl EngineInner {
    fn output_rate(&self) -> u32 {
        self.graph.sample_rate()
    }

    fn progress_event(&self) -> Option<EngineEvent> {
        self.source.as_ref().map(|source| EngineEvent::Progress {
            load_id: self.active_load,
            position: source.position(),
            duration: source.duration(),
        })
    }
}

struct EngineShared {
    inner: Mutex<EngineInner>,
    events: Listeners<EngineEvent>,
    blobs: BlobRegistry,
    backend: Arc<dyn AudioBackend>,
    progress_interval: Duration,
}

/// Handle the output uses to pull processed audio
///
/// Holds a weak reference: once the engine is dropped, rendering yields
/// silence.
#[derive(Clone)]
pub struct Renderer {
    shared: Weak<EngineShared>,
}

impl Renderer {
    /// Fill an interleaved stereo block
    pub fn render(&self, out: &mut [f32]) {
        match self.shared.upgrade() {
            Some(shared) => PlaybackEngine { shared }.render(out),
            None => out.fill(0.0),
        }
    }
}

/// Playback engine handle
///
/// Cheap to clone; all clones drive the same engine.
#[derive(Clone)]
pub struct PlaybackEngine {
    shared: Arc<EngineShared>,
}

impl PlaybackEngine {
    /// Create an engine; no output context exists until `initialize`
    pub fn new(backend: Arc<dyn AudioBackend>, config: &PlayerConfig) -> Self {
        let sample_rate = backend.preferred_sample_rate().max(1);
        let graph = ProcessingGraph::with_equalizer(Equalizer::with_frequencies(
            &config.band_frequencies,
            sample_rate,
        ));
        let progress_interval = config.progress_interval();

        Self {
            shared: Arc::new(EngineShared {
                inner: Mutex::new(EngineInner {
                    state: EngineState::Uninitialized,
                    context: None,
                    graph,
                    source: None,
                    blob: None,
                    load_seq: 0,
                    active_load: 0,
                    ended_emitted: false,
                    progress_interval_frames: interval_frames(progress_interval, sample_rate),
                    frames_since_progress: 0,
                }),
                events: Listeners::new(),
                blobs: BlobRegistry::new(),
                backend,
                progress_interval,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineInner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit_all(&self, events: Vec<EngineEvent>) {
        for event in &events {
            self.shared.events.emit(event);
        }
    }

    /// Subscribe to engine events
    pub fn subscribe(&self, callback: impl Fn(&EngineEvent) + Send + Sync + 'static) -> Subscription {
        self.shared.events.subscribe(callback)
    }

    /// Renderer for an output to pull from
    pub fn renderer(&self) -> Renderer {
        Renderer {
            shared: Arc::downgrade(&self.shared),
        }
    }

    // ===== Lifecycle =====

    /// Acquire and start the output context
    ///
    /// Must be triggered by a user action: platforms refuse to start audio
    /// on their own. Calling it again only resumes a suspended context.
    pub async fn initialize(&self) -> Result<()> {
        let existing = self.lock().context.clone();
        if let Some(context) = existing {
            if context.is_suspended() {
                debug!("Resuming suspended output context");
                if let Err(e) = context.resume() {
                    return Err(self.fail_initialization(e.to_string()));
                }
            }
            return Ok(());
        }

        let context: Arc<dyn OutputContext> =
            match self.shared.backend.create_context(self.renderer()).await {
                Ok(context) => Arc::from(context),
                Err(e) => return Err(self.fail_initialization(e.to_string())),
            };

        if context.is_suspended() {
            if let Err(e) = context.resume() {
                context.close();
                return Err(self.fail_initialization(e.to_string()));
            }
        }

        let duplicate = {
            let mut inner = self.lock();
            if inner.context.is_some() {
                true
            } else {
                let sample_rate = context.sample_rate().max(1);
                inner.graph.set_sample_rate(sample_rate);
                inner.progress_interval_frames =
                    interval_frames(self.shared.progress_interval, sample_rate);
                inner.context = Some(context.clone());
                if inner.state == EngineState::Uninitialized {
                    inner.state = EngineState::Ready;
                }
                false
            }
        };

        if duplicate {
            // Another initialize won the race
            context.close();
        } else {
            info!(sample_rate = context.sample_rate(), "Playback engine initialized");
        }
        Ok(())
    }

    fn fail_initialization(&self, message: String) -> PlaybackError {
        error!(error = %message, "Audio initialization failed");
        self.shared.events.emit(&EngineEvent::Error(EngineFailure {
            stage: FailureStage::Initialization,
            load_id: None,
            message: message.clone(),
        }));
        PlaybackError::Initialization(message)
    }

    /// Release the context, the source, and any transient handle
    ///
    /// Leaves the engine as if it had never been initialized. Pending loads
    /// are superseded. Safe to call at any time.
    pub fn destroy(&self) {
        let (context, blob) = {
            let mut inner = self.lock();
            inner.state = EngineState::Uninitialized;
            inner.source = None;
            inner.load_seq += 1;
            inner.ended_emitted = false;
            inner.frames_since_progress = 0;
            inner.graph.reset();
            (inner.context.take(), inner.blob.take())
        };

        if let Some(context) = context {
            context.close();
        }
        if let Some(blob) = blob {
            self.shared.blobs.release(&blob);
        }
        debug!("Playback engine destroyed");
    }

    // ===== Loading =====

    /// Load a local file through `provider`
    pub async fn load_local(
        &self,
        provider: &dyn LocalFileProvider,
        file: &LocalFileRef,
    ) -> Result<LoadOutcome> {
        let load_id = self.begin_load();

        let bytes: Arc<[u8]> = match provider.read(file).await {
            Ok(bytes) => Arc::from(bytes),
            Err(e) => return self.fail_load(load_id, None, e.to_string()),
        };

        let (handle, sample_rate) = {
            let mut inner = self.lock();
            if inner.load_seq != load_id {
                return Ok(LoadOutcome::Superseded);
            }
            if let Some(previous) = inner.blob.take() {
                self.shared.blobs.release(&previous);
            }
            let handle = self.shared.blobs.register(bytes.clone());
            inner.blob = Some(handle.clone());
            (handle, inner.output_rate())
        };

        let opened = self
            .shared
            .backend
            .open_bytes(bytes, file.extension(), sample_rate)
            .await;
        self.finish_load(load_id, Some(handle), opened)
    }

    /// Load a network stream
    pub async fn load_stream(&self, url: &str) -> Result<LoadOutcome> {
        let load_id = self.begin_load();
        let sample_rate = self.lock().output_rate();

        let opened = self.shared.backend.open_url(url, sample_rate).await;
        self.finish_load(load_id, None, opened)
    }

    fn begin_load(&self) -> u64 {
        let (load_id, previous_blob) = {
            let mut inner = self.lock();
            inner.load_seq += 1;
            inner.source = None;
            inner.ended_emitted = false;
            inner.frames_since_progress = 0;
            inner.state = EngineState::Loading;
            inner.graph.reset();
            (inner.load_seq, inner.blob.take())
        };

        if let Some(blob) = previous_blob {
            self.shared.blobs.release(&blob);
        }

        debug!(load_id, "Loading source");
        self.shared
            .events
            .emit(&EngineEvent::LoadingStarted { load_id });
        load_id
    }

    fn finish_load(
        &self,
        load_id: u64,
        handle: Option<BlobHandle>,
        opened: Result<Box<dyn AudioSource>>,
    ) -> Result<LoadOutcome> {
        let source = match opened {
            Ok(source) => source,
            Err(e) => return self.fail_load(load_id, handle, e.to_string()),
        };

        let duration = source.duration();
        {
            let mut inner = self.lock();
            if inner.load_seq != load_id {
                drop(inner);
                self.release_stale(handle);
                debug!(load_id, "Discarding superseded load");
                return Ok(LoadOutcome::Superseded);
            }

            if source.sample_rate() != inner.output_rate() {
                warn!(
                    source_rate = source.sample_rate(),
                    output_rate = inner.output_rate(),
                    "Source rate differs from output rate"
                );
            }
            inner.source = Some(source);
            inner.active_load = load_id;
            inner.state = if inner.context.is_some() {
                EngineState::Ready
            } else {
                EngineState::Uninitialized
            };
        }

        debug!(load_id, ?duration, "Source loaded");
        self.shared
            .events
            .emit(&EngineEvent::Loaded { load_id, duration });
        Ok(LoadOutcome::Loaded { load_id, duration })
    }

    fn fail_load(
        &self,
        load_id: u64,
        handle: Option<BlobHandle>,
        message: String,
    ) -> Result<LoadOutcome> {
        {
            let mut inner = self.lock();
            if inner.load_seq != load_id {
                drop(inner);
                self.release_stale(handle);
                debug!(load_id, error = %message, "Superseded load failed");
                return Ok(LoadOutcome::Superseded);
            }
            inner.source = None;
            inner.state = if inner.context.is_some() {
                EngineState::Ready
            } else {
                EngineState::Uninitialized
            };
            if let Some(blob) = inner.blob.take() {
                self.shared.blobs.release(&blob);
            }
        }

        error!(load_id, error = %message, "Load failed");
        self.shared.events.emit(&EngineEvent::Error(EngineFailure {
            stage: FailureStage::Load,
            load_id: Some(load_id),
            message: message.clone(),
        }));
        Err(PlaybackError::Load(message))
    }

    /// Release the handle of a superseded load unless it is still assigned
    fn release_stale(&self, handle: Option<BlobHandle>) {
        let Some(handle) = handle else { return };
        let still_assigned = self.lock().blob.as_ref() == Some(&handle);
        if !still_assigned {
            self.shared.blobs.release(&handle);
        }
    }

    // ===== Transport =====

    /// Start or resume playback
    ///
    /// Initializes the engine and resumes a suspended context first.
    pub async fn play(&self) -> Result<()> {
        self.play_inner(None).await.map(|_| ())
    }

    /// Play only if `load_id` is still the active source
    ///
    /// Returns false, without error, when a newer load replaced it.
    pub async fn play_load(&self, load_id: u64) -> Result<bool> {
        self.play_inner(Some(load_id)).await
    }

    async fn play_inner(&self, expected: Option<u64>) -> Result<bool> {
        self.initialize().await?;

        let mut inner = self.lock();
        let current = inner.load_seq == inner.active_load;
        if let Some(load_id) = expected {
            if inner.load_seq != load_id || !current {
                return Ok(false);
            }
        }

        let Some(source) = inner.source.as_mut() else {
            return Err(PlaybackError::NoTrackLoaded);
        };
        if source.is_finished() {
            source.reset()?;
            inner.ended_emitted = false;
        }
        inner.state = EngineState::Playing;
        Ok(true)
    }

    /// Pause playback; no-op without a source
    pub fn pause(&self) {
        let mut inner = self.lock();
        if inner.source.is_some() && inner.state == EngineState::Playing {
            inner.state = EngineState::Paused;
        }
    }

    /// Seek to a fraction (0.0 - 1.0) of the duration
    ///
    /// No-op while the duration is unknown.
    pub fn seek(&self, fraction: f64) {
        let duration = self.duration();
        if duration.is_zero() || fraction.is_nan() {
            return;
        }
        self.seek_to(duration.mul_f64(fraction.clamp(0.0, 1.0)));
    }

    /// Seek to an absolute position, clamped to the duration
    pub fn seek_to(&self, position: Duration) {
        let event = {
            let mut inner = self.lock();
            let Some(source) = inner.source.as_mut() else {
                return;
            };
            let position = position.min(source.duration());
            if let Err(e) = source.seek(position) {
                warn!(error = %e, "Seek failed");
                return;
            }
            let finished = source.is_finished();
            if !finished {
                inner.ended_emitted = false;
            }
            inner.graph.reset();
            inner.progress_event()
        };

        if let Some(event) = event {
            self.shared.events.emit(&event);
        }
    }

    /// Set output volume, clamped to 0.0 - 1.0
    pub fn set_volume(&self, volume: f32) {
        self.lock().graph.gain_mut().set_gain(volume);
    }

    /// Output volume
    pub fn volume(&self) -> f32 {
        self.lock().graph.gain().gain()
    }

    // ===== Equalizer =====

    /// Set one band's gain (clamped, out-of-range ignored)
    pub fn set_eq_band(&self, index: usize, gain_db: f32) {
        self.lock().graph.equalizer_mut().set_band_gain(index, gain_db);
    }

    /// Set all band gains position by position
    pub fn set_eq_bands(&self, gains: &[f32]) {
        self.lock().graph.equalizer_mut().set_all_bands(gains);
    }

    /// Apply a preset to the live graph
    pub fn apply_eq_preset(&self, preset: &EqPreset) {
        self.lock().graph.equalizer_mut().apply_preset(preset);
    }

    /// Enable the equalizer, or bypass it by flattening every band
    pub fn set_eq_enabled(&self, enabled: bool) {
        self.lock().graph.equalizer_mut().set_enabled(enabled);
    }

    /// Gains currently applied by the live graph
    pub fn eq_gains(&self) -> Vec<f32> {
        self.lock().graph.equalizer().gains()
    }

    /// Number of equalizer bands
    pub fn eq_band_count(&self) -> usize {
        self.lock().graph.equalizer().band_count()
    }

    // ===== Analysis =====

    /// Magnitude spectrum of the latest audio, normalized to 0.0 - 1.0
    pub fn frequency_data(&self) -> Vec<f32> {
        self.lock().graph.analyser_mut().frequency_data()
    }

    /// Latest mono samples, oldest first
    pub fn time_domain_data(&self) -> Vec<f32> {
        self.lock().graph.analyser().time_domain_data()
    }

    // ===== Rendering =====

    /// Produce the next interleaved stereo block
    ///
    /// Called by the output. Emits progress every configured interval and
    /// `Ended` once when the source runs out, leaving the engine paused.
    pub fn render(&self, out: &mut [f32]) {
        let mut events = Vec::new();
        {
            let mut guard = self.lock();
            let inner = &mut *guard;
            out.fill(0.0);

            let suspended = inner.context.as_ref().map_or(true, |c| c.is_suspended());
            if inner.state == EngineState::Playing && !suspended {
                if let Some(source) = inner.source.as_mut() {
                    if let Err(e) = source.read_samples(out) {
                        error!(error = %e, "Source read failed");
                        inner.state = EngineState::Paused;
                        events.push(EngineEvent::Error(EngineFailure {
                            stage: FailureStage::Playback,
                            load_id: Some(inner.active_load),
                            message: e.to_string(),
                        }));
                    }

                    let finished = source.is_finished();
                    inner.frames_since_progress += out.len() / CHANNELS;
                    if inner.frames_since_progress >= inner.progress_interval_frames || finished {
                        inner.frames_since_progress = 0;
                        events.extend(inner.progress_event());
                    }

                    if finished && !inner.ended_emitted {
                        inner.ended_emitted = true;
                        inner.state = EngineState::Paused;
                        events.push(EngineEvent::Ended {
                            load_id: inner.active_load,
                        });
                    }
                }
            }

            inner.graph.process(out);
        }

        self.emit_all(events);
    }

    // ===== Queries =====

    /// Current state
    pub fn state(&self) -> EngineState {
        self.lock().state
    }

    /// Whether audio is rendering
    pub fn is_playing(&self) -> bool {
        self.state() == EngineState::Playing
    }

    /// Whether an output context exists
    pub fn is_initialized(&self) -> bool {
        self.lock().context.is_some()
    }

    /// Whether a source is loaded
    pub fn has_source(&self) -> bool {
        self.lock().source.is_some()
    }

    /// Position in the active source
    pub fn position(&self) -> Duration {
        self.lock()
            .source
            .as_ref()
            .map_or(Duration::ZERO, |s| s.position())
    }

    /// Duration of the active source, zero when unknown
    pub fn duration(&self) -> Duration {
        self.lock()
            .source
            .as_ref()
            .map_or(Duration::ZERO, |s| s.duration())
    }

    /// Output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.lock().output_rate()
    }

    /// Load the active source came from, if one is loaded
    pub fn active_load_id(&self) -> Option<u64> {
        let inner = self.lock();
        inner.source.as_ref().map(|_| inner.active_load)
    }

    /// Number of live transient handles
    pub fn live_handles(&self) -> usize {
        self.shared.blobs.live_count()
    }
}

fn interval_frames(interval: Duration, sample_rate: u32) -> usize {
    ((interval.as_secs_f64() * f64::from(sample_rate)) as usize).max(1)
}
