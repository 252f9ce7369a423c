//! Player - state store and queue/transport coordinator
//!
//! `Player` is the only mutation surface for playback, queue, EQ, and UI
//! state. Every action mutates the shared `PlayerState` atomically, notifies
//! subscribers with a snapshot when something changed, and writes the durable
//! subset back to the settings store.
//!
//! Engine events and platform media actions arrive through an internal
//! channel. `process_pending_events` drains it on demand; `spawn_event_loop`
//! does the same on a background task.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use trio_audio::{clamp_gain, EqPreset, CUSTOM_PRESET_NAME};
use trio_core::{
    LocalFileProvider, LocalFileRef, MediaAction, MediaSession, NoopMediaSession,
    PersistedSettings, RepeatMode, SettingsStore, StreamResolver, Track, TrackSource,
};

use crate::backend::AudioBackend;
use crate::config::PlayerConfig;
use crate::engine::{LoadOutcome, PlaybackEngine};
use crate::error::{PlaybackError, Result};
use crate::events::EngineEvent;
use crate::listeners::{Listeners, Subscription};
use crate::local::MemoryFileProvider;
use crate::settings::{MemorySettingsStore, SettingsWriter};
use crate::store::{PlayerState, VisualizerMode};
use crate::volume::Volume;

/// Where the engine should load a track from
enum LoadTarget {
    Local(LocalFileRef),
    Stream(String),
}

enum Inbound {
    Engine(EngineEvent),
    Media(MediaAction),
    Shutdown,
}

struct Core {
    state: PlayerState,
    volume: Volume,
    /// Engine load backing the current track
    current_load: Option<u64>,
    /// Bumped whenever a different track becomes current
    request: u64,
}

struct PlayerShared {
    core: Mutex<Core>,
    engine: PlaybackEngine,
    listeners: Listeners<PlayerState>,
    files: Arc<dyn LocalFileProvider>,
    resolver: Option<Arc<dyn StreamResolver>>,
    settings: SettingsWriter,
    media: Arc<dyn MediaSession>,
    config: PlayerConfig,
    rng: Mutex<StdRng>,
    inbox_tx: mpsc::UnboundedSender<Inbound>,
    inbox_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Inbound>>,
    _engine_events: Subscription,
}

/// Builder for `Player`
pub struct PlayerBuilder {
    backend: Arc<dyn AudioBackend>,
    config: PlayerConfig,
    files: Option<Arc<dyn LocalFileProvider>>,
    resolver: Option<Arc<dyn StreamResolver>>,
    settings: Option<Arc<dyn SettingsStore>>,
    media: Option<Arc<dyn MediaSession>>,
}

impl PlayerBuilder {
    /// Player configuration
    #[must_use]
    pub fn config(mut self, config: PlayerConfig) -> Self {
        self.config = config;
        self
    }

    /// Source of local file bytes
    #[must_use]
    pub fn file_provider(mut self, files: Arc<dyn LocalFileProvider>) -> Self {
        self.files = Some(files);
        self
    }

    /// Resolver for catalog tracks without a direct URL
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn StreamResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Durable settings storage
    #[must_use]
    pub fn settings(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Platform media session
    #[must_use]
    pub fn media_session(mut self, media: Arc<dyn MediaSession>) -> Self {
        self.media = Some(media);
        self
    }

    /// Create the player, restoring persisted settings
    ///
    /// Unreadable settings are logged and replaced by defaults.
    pub fn build(self) -> Player {
        let settings_store = self
            .settings
            .unwrap_or_else(|| Arc::new(MemorySettingsStore::new()));
        let media = self.media.unwrap_or_else(|| Arc::new(NoopMediaSession));
        let files = self
            .files
            .unwrap_or_else(|| Arc::new(MemoryFileProvider::new()));

        let persisted = match settings_store.load() {
            Ok(Some(settings)) => settings,
            Ok(None) => PersistedSettings::default(),
            Err(e) => {
                warn!(error = %e, "Failed to load settings, using defaults");
                PersistedSettings::default()
            }
        };

        let mut state = PlayerState::new(self.config.band_count());
        let volume = Volume::new(persisted.volume);
        state.playback.volume = volume.level();
        state.shuffle = persisted.shuffle;
        state.repeat = persisted.repeat;
        state.eq.enabled = persisted.eq_enabled;
        state.eq.preset_name = persisted.eq_preset;
        for (slot, &gain) in state.eq.gains.iter_mut().zip(&persisted.eq_gains) {
            *slot = clamp_gain(gain);
        }

        let engine = PlaybackEngine::new(self.backend, &self.config);
        engine.set_volume(volume.effective());
        engine.set_eq_bands(&state.eq.gains);
        if !state.eq.enabled {
            engine.set_eq_enabled(false);
        }

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        let engine_events = {
            let tx = inbox_tx.clone();
            engine.subscribe(move |event| {
                let _ = tx.send(Inbound::Engine(event.clone()));
            })
        };

        {
            let tx = inbox_tx.clone();
            media.set_action_handler(Arc::new(move |action| {
                let _ = tx.send(Inbound::Media(action));
            }));
        }

        let rng = match self.config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        debug!(
            volume = volume.level(),
            shuffle = state.shuffle,
            repeat = ?state.repeat,
            "Player created"
        );

        Player {
            shared: Arc::new(PlayerShared {
                core: Mutex::new(Core {
                    state,
                    volume,
                    current_load: None,
                    request: 0,
                }),
                engine,
                listeners: Listeners::new(),
                files,
                resolver: self.resolver,
                settings: SettingsWriter::new(settings_store),
                media,
                config: self.config,
                rng: Mutex::new(rng),
                inbox_tx,
                inbox_rx: tokio::sync::Mutex::new(inbox_rx),
                _engine_events: engine_events,
            }),
        }
    }
}

/// Player handle
///
/// Cheap to clone; all clones share one state and one engine.
#[derive(Clone)]
pub struct Player {
    shared: Arc<PlayerShared>,
}

impl Player {
    /// Start building a player on top of `backend`
    pub fn builder(backend: Arc<dyn AudioBackend>) -> PlayerBuilder {
        PlayerBuilder {
            backend,
            config: PlayerConfig::default(),
            files: None,
            resolver: None,
            settings: None,
            media: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Core> {
        self.shared
            .core
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate state and notify subscribers if anything changed
    fn update<R>(&self, f: impl FnOnce(&mut Core) -> R) -> R {
        let (result, snapshot) = {
            let mut core = self.lock();
            let before = core.state.clone();
            let result = f(&mut core);
            let snapshot = (core.state != before).then(|| core.state.clone());
            (result, snapshot)
        };

        if let Some(snapshot) = snapshot {
            self.shared.listeners.emit(&snapshot);
        }
        result
    }

    fn persist(&self) {
        // Submit under the lock so snapshots reach the writer in order
        let inline = {
            let core = self.lock();
            self.shared.settings.submit(core.state.persisted())
        };
        if let Some(settings) = inline {
            self.shared.settings.save_inline(&settings);
        }
    }

    fn set_error(&self, message: String) {
        self.update(|core| {
            core.state.ui.loading = false;
            core.state.ui.last_error = Some(message);
        });
    }

    // ===== Observation =====

    /// Snapshot of the current state
    pub fn state(&self) -> PlayerState {
        self.lock().state.clone()
    }

    /// Called with a snapshot after every action that changed state
    pub fn subscribe(
        &self,
        callback: impl Fn(&PlayerState) + Send + Sync + 'static,
    ) -> Subscription {
        self.shared.listeners.subscribe(callback)
    }

    /// The underlying engine
    pub fn engine(&self) -> &PlaybackEngine {
        &self.shared.engine
    }

    /// Player configuration
    pub fn config(&self) -> &PlayerConfig {
        &self.shared.config
    }

    /// Wait until every durable change made so far has been saved
    ///
    /// Saves run in the background; call this before exiting.
    pub async fn flush_settings(&self) {
        self.shared.settings.flush().await;
    }

    // ===== Track Activation =====

    /// Make `track` current and start playing it
    ///
    /// A supplied `queue` replaces the current one and the cursor moves to
    /// the track's position in it (0 if absent). Without a queue the cursor
    /// follows the track only if it is already queued.
    ///
    /// # Errors
    /// Invalid tracks and unresolvable streams fail before any state change.
    /// Load failures are reported here and in `ui.last_error`.
    pub async fn play_track(&self, track: Track, queue: Option<Vec<Track>>) -> Result<()> {
        track.validate()?;
        let target = self.resolve_target(&track).await?;
        self.ensure_output().await?;

        let request = self.update(|core| {
            match queue {
                Some(tracks) => {
                    let index = tracks
                        .iter()
                        .position(|t| t.id == track.id)
                        .or_else(|| (!tracks.is_empty()).then_some(0));
                    core.state.queue.replace(tracks, index);
                }
                None => {
                    if let Some(index) = core.state.queue.position_of(&track) {
                        core.state.queue.set_index(index);
                    }
                }
            }
            Self::make_current(core, track.clone())
        });

        self.start(request, &track, target).await
    }

    /// Jump to a queue position and play it; out-of-range is a no-op
    pub async fn play_index(&self, index: usize) -> Result<()> {
        let track = self.lock().state.queue.get(index).cloned();
        match track {
            Some(track) => self.activate(index, track).await,
            None => Ok(()),
        }
    }

    /// Play the entry at `index`, moving the cursor only once it can be loaded
    ///
    /// The queue may change while the target resolves. The cursor follows the
    /// track wherever it went and stays put if the track was removed.
    async fn activate(&self, index: usize, track: Track) -> Result<()> {
        track.validate()?;
        let target = self.resolve_target(&track).await?;
        self.ensure_output().await?;

        let request = self.update(|core| {
            let queue = &mut core.state.queue;
            let position = match queue.get(index) {
                Some(entry) if entry.id == track.id => Some(index),
                _ => queue.position_of(&track),
            };
            if let Some(position) = position {
                queue.set_index(position);
            }
            Self::make_current(core, track.clone())
        });

        self.start(request, &track, target).await
    }

    fn make_current(core: &mut Core, track: Track) -> u64 {
        core.request += 1;
        core.current_load = None;
        core.state.playback.duration = track.duration;
        core.state.playback.current_track = Some(track);
        core.state.playback.progress = Duration::ZERO;
        core.state.ui.loading = true;
        core.state.ui.last_error = None;
        core.request
    }

    /// Start the output; play actions are the user gesture it needs
    async fn ensure_output(&self) -> Result<()> {
        if let Err(e) = self.shared.engine.initialize().await {
            self.set_error(e.to_string());
            return Err(e);
        }
        Ok(())
    }

    async fn resolve_target(&self, track: &Track) -> Result<LoadTarget> {
        if let TrackSource::Local { file } = &track.source {
            return Ok(LoadTarget::Local(file.clone()));
        }
        if let Some(url) = track.playable_url() {
            return Ok(LoadTarget::Stream(url.to_string()));
        }

        let resolved = match &self.shared.resolver {
            Some(resolver) => match resolver.resolve(track).await {
                Ok(url) => url.filter(|u| !u.trim().is_empty()),
                Err(e) => {
                    warn!(track = %track.id, error = %e, "Stream resolution failed");
                    self.set_error(format!("Could not resolve \"{}\": {}", track.title, e));
                    return Err(e.into());
                }
            },
            None => None,
        };

        match resolved {
            Some(url) => {
                debug!(track = %track.id, %url, "Resolved stream");
                Ok(LoadTarget::Stream(url))
            }
            None => {
                warn!(track = %track.id, "No playable stream found");
                self.set_error(format!("No playable stream found for \"{}\"", track.title));
                Err(PlaybackError::Unresolvable(track.id.clone()))
            }
        }
    }

    /// Load and play the current track
    async fn start(&self, request: u64, track: &Track, target: LoadTarget) -> Result<()> {
        self.shared.media.set_metadata(Some(&track.metadata()));
        info!(track = %track.id, title = %track.title, "Loading track");

        let engine = &self.shared.engine;
        let loaded = match &target {
            LoadTarget::Local(file) => engine.load_local(self.shared.files.as_ref(), file).await,
            LoadTarget::Stream(url) => engine.load_stream(url).await,
        };

        let load_id = match loaded {
            Ok(LoadOutcome::Loaded { load_id, duration }) => {
                let current = self.update(|core| {
                    if core.request != request {
                        return false;
                    }
                    core.current_load = Some(load_id);
                    core.state.ui.loading = false;
                    if !duration.is_zero() {
                        core.state.playback.duration = duration;
                    }
                    true
                });
                if !current {
                    return Ok(());
                }
                load_id
            }
            Ok(LoadOutcome::Superseded) => return Ok(()),
            Err(e) => {
                let is_current = self.lock().request == request;
                if is_current {
                    self.update(|core| core.state.playback.is_playing = false);
                    self.set_error(e.to_string());
                    self.shared.media.set_playback_state(false);
                }
                return Err(e);
            }
        };

        match engine.play_load(load_id).await {
            Ok(true) => {
                self.update(|core| core.state.playback.is_playing = true);
                self.shared.media.set_playback_state(true);
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => {
                self.update(|core| core.state.playback.is_playing = false);
                self.set_error(e.to_string());
                Err(e)
            }
        }
    }

    // ===== Transport =====

    /// Advance to the next entry
    ///
    /// With shuffle, any entry may be picked, the current one included.
    /// Without it, the end of the queue wraps only with `RepeatMode::All`;
    /// otherwise nothing changes.
    pub async fn next(&self) -> Result<()> {
        self.advance().await.map(|_| ())
    }

    /// Returns whether a new entry started
    async fn advance(&self) -> Result<bool> {
        let target = {
            let core = self.lock();
            let mut rng = self.shared.rng.lock().unwrap_or_else(PoisonError::into_inner);
            core.state
                .queue
                .next_index(core.state.shuffle, core.state.repeat, &mut *rng)
                .and_then(|index| core.state.queue.get(index).cloned().map(|t| (index, t)))
        };

        let Some((index, track)) = target else {
            debug!("Next: nothing to advance to");
            return Ok(false);
        };

        debug!(index, "Next");
        self.activate(index, track).await?;
        Ok(true)
    }

    /// Restart the current track, or go to the previous entry
    ///
    /// Restarts when less than the restart threshold has elapsed; otherwise
    /// moves back one entry, wrapping from the first to the last regardless
    /// of repeat mode.
    pub async fn previous(&self) -> Result<()> {
        let engine = &self.shared.engine;
        let has_track = self.lock().state.playback.current_track.is_some();

        if has_track
            && engine.has_source()
            && engine.position() < self.shared.config.restart_threshold()
        {
            debug!("Previous: restarting current track");
            engine.seek_to(Duration::ZERO);
            self.update(|core| core.state.playback.progress = Duration::ZERO);
            return Ok(());
        }

        let target = {
            let core = self.lock();
            core.state
                .queue
                .previous_index()
                .and_then(|index| core.state.queue.get(index).cloned().map(|t| (index, t)))
        };

        match target {
            Some((index, track)) => {
                debug!(index, "Previous");
                self.activate(index, track).await
            }
            None => Ok(()),
        }
    }

    /// Resume or start playback
    ///
    /// Reloads the current track if nothing is loaded, and starts the queue
    /// if no track is current.
    pub async fn play(&self) -> Result<()> {
        let engine = &self.shared.engine;
        if engine.has_source() {
            if let Err(e) = engine.play().await {
                self.set_error(e.to_string());
                return Err(e);
            }
            self.update(|core| core.state.playback.is_playing = true);
            self.shared.media.set_playback_state(true);
            return Ok(());
        }

        let (current, queued) = {
            let core = self.lock();
            let queue = &core.state.queue;
            let index = queue.index().unwrap_or(0);
            (
                core.state.playback.current_track.clone(),
                queue.get(index).cloned().map(|t| (index, t)),
            )
        };

        match (current, queued) {
            (Some(track), _) => self.play_track(track, None).await,
            (None, Some((index, track))) => self.activate(index, track).await,
            (None, None) => Err(PlaybackError::NoTrackLoaded),
        }
    }

    /// Pause playback
    pub fn pause(&self) {
        self.shared.engine.pause();
        self.update(|core| core.state.playback.is_playing = false);
        self.shared.media.set_playback_state(false);
    }

    /// Toggle between play and pause
    pub async fn toggle_play(&self) -> Result<()> {
        let playing = self.lock().state.playback.is_playing;
        if playing {
            self.pause();
            Ok(())
        } else {
            self.play().await
        }
    }

    /// Seek to a fraction (0.0 - 1.0) of the current track
    pub fn seek(&self, fraction: f64) {
        self.shared.engine.seek(fraction);
        self.sync_progress();
    }

    /// Seek to an absolute position
    pub fn seek_to(&self, position: Duration) {
        self.shared.engine.seek_to(position);
        self.sync_progress();
    }

    fn sync_progress(&self) {
        let engine = &self.shared.engine;
        if !engine.has_source() {
            return;
        }
        let position = engine.position();
        self.update(|core| core.state.playback.progress = position);
    }

    // ===== Queue =====

    /// Append a track; the cursor does not move
    pub fn add_to_queue(&self, track: Track) {
        self.update(|core| core.state.queue.push(track));
    }

    /// Remove the entry at `index`; out-of-range is a no-op
    pub fn remove_from_queue(&self, index: usize) {
        self.update(|core| {
            core.state.queue.remove(index);
        });
    }

    /// Move an entry; the cursor keeps pointing at the same track
    pub fn reorder_queue(&self, from: usize, to: usize) {
        self.update(|core| {
            core.state.queue.reorder(from, to);
        });
    }

    /// Empty the queue; playback continues
    pub fn clear_queue(&self) {
        self.update(|core| core.state.queue.clear());
    }

    // ===== Volume =====

    /// Set the volume (clamped to 0.0 - 1.0); also un-mutes
    pub fn set_volume(&self, volume: f32) {
        let effective = self.update(|core| {
            core.volume.set_level(volume);
            core.state.playback.volume = core.volume.level();
            core.state.playback.muted = false;
            core.volume.effective()
        });
        self.shared.engine.set_volume(effective);
        self.persist();
    }

    /// Toggle mute; un-muting restores the exact pre-mute level
    pub fn toggle_mute(&self) {
        let effective = self.update(|core| {
            core.volume.toggle_mute();
            core.state.playback.muted = core.volume.is_muted();
            core.volume.effective()
        });
        self.shared.engine.set_volume(effective);
    }

    // ===== Shuffle / Repeat =====

    /// Enable or disable shuffle
    pub fn set_shuffle(&self, shuffle: bool) {
        self.update(|core| core.state.shuffle = shuffle);
        self.persist();
    }

    /// Flip shuffle
    pub fn toggle_shuffle(&self) {
        self.update(|core| core.state.shuffle = !core.state.shuffle);
        self.persist();
    }

    /// Set the repeat mode
    pub fn set_repeat(&self, repeat: RepeatMode) {
        self.update(|core| core.state.repeat = repeat);
        self.persist();
    }

    /// Cycle off → all → one → off
    pub fn cycle_repeat(&self) {
        self.update(|core| core.state.repeat = core.state.repeat.cycle());
        self.persist();
    }

    // ===== Equalizer =====

    /// Set one band's gain (clamped to ±12 dB); out-of-range is a no-op
    ///
    /// Marks the EQ as "Custom". While the EQ is disabled only the stored
    /// gains change.
    pub fn set_eq_band(&self, index: usize, gain_db: f32) {
        let gain = clamp_gain(gain_db);
        let applied = self.update(|core| {
            let eq = &mut core.state.eq;
            let Some(slot) = eq.gains.get_mut(index) else {
                return None;
            };
            *slot = gain;
            eq.preset_name = CUSTOM_PRESET_NAME.to_string();
            Some(eq.enabled)
        });

        match applied {
            None => return,
            Some(true) => self.shared.engine.set_eq_band(index, gain),
            Some(false) => {}
        }
        self.persist();
    }

    /// Apply a preset position by position
    pub fn apply_eq_preset(&self, preset: &EqPreset) {
        let (gains, enabled) = self.update(|core| {
            let eq = &mut core.state.eq;
            for (slot, &gain) in eq.gains.iter_mut().zip(&preset.gains) {
                *slot = clamp_gain(gain);
            }
            eq.preset_name = preset.name.clone();
            (eq.gains.clone(), eq.enabled)
        });

        if enabled {
            self.shared.engine.set_eq_bands(&gains);
        }
        self.persist();
    }

    /// Apply a built-in preset by name; returns false if unknown
    pub fn apply_eq_preset_named(&self, name: &str) -> bool {
        match EqPreset::by_name(name) {
            Some(preset) => {
                self.apply_eq_preset(&preset);
                true
            }
            None => false,
        }
    }

    /// Enable or bypass the equalizer
    ///
    /// Bypassing flattens the live graph but keeps the stored gains;
    /// enabling re-applies them.
    pub fn set_eq_enabled(&self, enabled: bool) {
        let gains = self.update(|core| {
            core.state.eq.enabled = enabled;
            core.state.eq.gains.clone()
        });

        let engine = &self.shared.engine;
        engine.set_eq_enabled(enabled);
        if enabled {
            engine.set_eq_bands(&gains);
        }
        self.persist();
    }

    /// Flip the equalizer on or off
    pub fn toggle_eq(&self) {
        let enabled = self.lock().state.eq.enabled;
        self.set_eq_enabled(!enabled);
    }

    /// Back to the flat preset
    pub fn reset_eq(&self) {
        self.apply_eq_preset(&EqPreset::flat());
    }

    /// Built-in presets
    pub fn presets(&self) -> Vec<EqPreset> {
        EqPreset::builtin()
    }

    // ===== UI / Analysis =====

    /// Choose the visualizer mode
    pub fn set_visualizer(&self, mode: VisualizerMode) {
        self.update(|core| core.state.ui.visualizer = mode);
    }

    /// Clear the last user-visible error
    pub fn dismiss_error(&self) {
        self.update(|core| core.state.ui.last_error = None);
    }

    /// Spectrum snapshot for the visualizer
    pub fn frequency_data(&self) -> Vec<f32> {
        self.shared.engine.frequency_data()
    }

    /// Waveform snapshot for the visualizer
    pub fn time_domain_data(&self) -> Vec<f32> {
        self.shared.engine.time_domain_data()
    }

    // ===== Event Reconciliation =====

    /// Handle every queued engine event and media action
    ///
    /// Returns the number handled, including any queued while handling.
    /// While `spawn_event_loop` is running it owns the inbox, and this
    /// returns 0 without waiting.
    pub async fn process_pending_events(&self) -> usize {
        let mut handled = 0;
        loop {
            let next = match self.shared.inbox_rx.try_lock() {
                Ok(mut inbox) => inbox.try_recv(),
                Err(_) => return handled,
            };
            match next {
                Ok(Inbound::Shutdown) | Err(_) => return handled,
                Ok(message) => {
                    self.handle(message).await;
                    handled += 1;
                }
            }
        }
    }

    /// Reconcile events on a background task until `shutdown`
    pub fn spawn_event_loop(&self) -> JoinHandle<()> {
        let player = self.clone();
        tokio::spawn(async move {
            loop {
                let next = player.shared.inbox_rx.lock().await.recv().await;
                match next {
                    Some(Inbound::Shutdown) | None => break,
                    Some(message) => player.handle(message).await,
                }
            }
            debug!("Player event loop stopped");
        })
    }

    /// Stop playback, release the engine, and stop the event loop
    pub fn shutdown(&self) {
        self.shared.engine.destroy();
        self.update(|core| {
            core.current_load = None;
            core.state.playback.is_playing = false;
            core.state.ui.loading = false;
        });
        self.shared.media.set_playback_state(false);
        self.shared.media.set_metadata(None);
        let _ = self.shared.inbox_tx.send(Inbound::Shutdown);
        info!("Player shut down");
    }

    async fn handle(&self, message: Inbound) {
        match message {
            Inbound::Engine(event) => self.on_engine_event(event).await,
            Inbound::Media(action) => self.on_media_action(action).await,
            Inbound::Shutdown => {}
        }
    }

    async fn on_engine_event(&self, event: EngineEvent) {
        let current = self.lock().current_load;
        if let Some(load_id) = event.load_id() {
            if current != Some(load_id) {
                return;
            }
        }

        match event {
            EngineEvent::Progress {
                position, duration, ..
            } => self.update(|core| {
                core.state.playback.progress = position;
                if !duration.is_zero() {
                    core.state.playback.duration = duration;
                }
            }),
            EngineEvent::Loaded { duration, .. } => self.update(|core| {
                core.state.ui.loading = false;
                if !duration.is_zero() {
                    core.state.playback.duration = duration;
                }
            }),
            EngineEvent::LoadingStarted { .. } => {}
            EngineEvent::Ended { load_id } => self.on_ended(load_id).await,
            EngineEvent::Error(failure) => {
                self.update(|core| {
                    core.state.ui.loading = false;
                    core.state.ui.last_error = Some(failure.message.clone());
                });
            }
        }
    }

    async fn on_ended(&self, load_id: u64) {
        let repeat = self.lock().state.repeat;

        if repeat == RepeatMode::One {
            debug!(load_id, "Repeating track");
            let engine = &self.shared.engine;
            engine.seek_to(Duration::ZERO);
            match engine.play_load(load_id).await {
                Ok(true) => {
                    self.update(|core| {
                        core.state.playback.progress = Duration::ZERO;
                        core.state.playback.is_playing = true;
                    });
                    return;
                }
                Ok(false) => return,
                Err(e) => warn!(error = %e, "Failed to repeat track"),
            }
        } else {
            match self.advance().await {
                Ok(true) => return,
                Ok(false) => {}
                Err(e) => warn!(error = %e, "Failed to advance after track end"),
            }
        }

        let still_current = self.lock().current_load == Some(load_id);
        if still_current {
            self.update(|core| core.state.playback.is_playing = false);
            self.shared.media.set_playback_state(false);
        }
    }

    async fn on_media_action(&self, action: MediaAction) {
        debug!(?action, "Media action");
        let result = match action {
            MediaAction::Play => self.play().await,
            MediaAction::Pause => {
                self.pause();
                Ok(())
            }
            MediaAction::SeekBackward(offset) => {
                let position = self.shared.engine.position().saturating_sub(offset);
                self.seek_to(position);
                Ok(())
            }
            MediaAction::SeekForward(offset) => {
                let position = self.shared.engine.position().saturating_add(offset);
                self.seek_to(position);
                Ok(())
            }
            MediaAction::NextTrack => self.next().await,
            MediaAction::PreviousTrack => self.previous().await,
        };

        if let Err(e) = result {
            warn!(?action, error = %e, "Media action failed");
        }
    }
}
