//! Common test doubles and fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use trio_audio::{AudioSource, MemorySource, CHANNELS};
use trio_core::{
    LocalFileRef, MediaAction, MediaActionHandler, MediaMetadata, MediaSession, StreamResolver,
    Track, TrackSource,
};
use trio_playback::{
    AudioBackend, HeadlessContext, MemoryFileProvider, MemorySettingsStore, OutputContext,
    PlaybackError, Player, PlayerConfig, Renderer,
};

pub const RATE: u32 = 1_000;

/// Backend producing constant tones
///
/// Stream URLs carry their length as a `secs=` query parameter (default 10).
/// Local bytes are the length in seconds as UTF-8 text. URLs containing
/// `fail` never load; URLs containing `gated` wait for `release`.
#[derive(Default)]
pub struct TestBackend {
    pub fail_context: AtomicBool,
    opened: Mutex<Vec<String>>,
    gate: Notify,
}

impl TestBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// URLs opened so far
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    /// Let one gated load finish
    pub fn release(&self) {
        self.gate.notify_one();
    }
}

fn tone(seconds: f64) -> Result<Box<dyn AudioSource>, PlaybackError> {
    let frames = (seconds * f64::from(RATE)) as usize;
    Ok(Box::new(MemorySource::new(vec![0.2f32; frames * CHANNELS], RATE)?))
}

fn secs_param(url: &str) -> f64 {
    url.split_once("secs=")
        .and_then(|(_, v)| v.split('&').next())
        .and_then(|v| v.parse().ok())
        .unwrap_or(10.0)
}

#[async_trait]
impl AudioBackend for TestBackend {
    fn preferred_sample_rate(&self) -> u32 {
        RATE
    }

    async fn create_context(
        &self,
        renderer: Renderer,
    ) -> Result<Box<dyn OutputContext>, PlaybackError> {
        if self.fail_context.load(Ordering::SeqCst) {
            return Err(PlaybackError::Initialization("no audio device".into()));
        }
        Ok(Box::new(HeadlessContext::new(RATE, renderer)))
    }

    async fn open_bytes(
        &self,
        bytes: Arc<[u8]>,
        _extension: Option<String>,
        _sample_rate: u32,
    ) -> Result<Box<dyn AudioSource>, PlaybackError> {
        let seconds: f64 = std::str::from_utf8(&bytes)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| PlaybackError::Load("unsupported format".into()))?;
        tone(seconds)
    }

    async fn open_url(
        &self,
        url: &str,
        _sample_rate: u32,
    ) -> Result<Box<dyn AudioSource>, PlaybackError> {
        self.opened.lock().unwrap().push(url.to_string());
        if url.contains("gated") {
            self.gate.notified().await;
        }
        if url.contains("fail") {
            return Err(PlaybackError::Load(format!("network error fetching {}", url)));
        }
        tone(secs_param(url))
    }
}

/// Media session that records everything pushed to it
#[derive(Default)]
pub struct RecordingMediaSession {
    pub metadata: Mutex<Vec<Option<MediaMetadata>>>,
    pub playing: Mutex<Vec<bool>>,
    handler: Mutex<Option<MediaActionHandler>>,
}

impl RecordingMediaSession {
    /// Simulate a media key press
    pub fn trigger(&self, action: MediaAction) {
        let handler = self.handler.lock().unwrap().clone();
        if let Some(handler) = handler {
            handler(action);
        }
    }

    pub fn last_title(&self) -> Option<String> {
        self.metadata
            .lock()
            .unwrap()
            .last()
            .cloned()
            .flatten()
            .map(|m| m.title)
    }
}

impl MediaSession for RecordingMediaSession {
    fn set_metadata(&self, metadata: Option<&MediaMetadata>) {
        self.metadata.lock().unwrap().push(metadata.cloned());
    }

    fn set_playback_state(&self, playing: bool) {
        self.playing.lock().unwrap().push(playing);
    }

    fn set_action_handler(&self, handler: MediaActionHandler) {
        *self.handler.lock().unwrap() = Some(handler);
    }
}

/// Resolver answering every request with a fixed result
///
/// A gated resolver holds each answer until `release`.
pub struct ScriptedResolver {
    answer: Option<String>,
    gated: bool,
    gate: Notify,
    pub calls: AtomicUsize,
}

impl ScriptedResolver {
    pub fn new(answer: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.map(str::to_string),
            gated: false,
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn gated(answer: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.map(str::to_string),
            gated: true,
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        })
    }

    /// Let one held answer through
    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl StreamResolver for ScriptedResolver {
    async fn resolve(&self, _track: &Track) -> trio_core::Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.gated {
            self.gate.notified().await;
        }
        Ok(self.answer.clone())
    }
}

// ===== Fixtures =====

pub fn stream_track(title: &str, seconds: u64) -> Track {
    Track::new(
        title,
        "Test Artist",
        "Test Album",
        Duration::from_secs(seconds),
        TrackSource::ResolvedStream {
            url: format!("https://cdn.test/{}.mp3?secs={}", title, seconds),
        },
    )
    .with_id(title)
}

pub fn catalog_track(title: &str) -> Track {
    Track::new(
        title,
        "Catalog Artist",
        "Catalog Album",
        Duration::ZERO,
        TrackSource::Catalog {
            catalog_id: format!("cat-{}", title),
            stream_url: None,
        },
    )
    .with_id(title)
}

pub fn local_track(path: &str) -> Track {
    Track::new(
        path,
        "Local Artist",
        "Local Album",
        Duration::ZERO,
        TrackSource::Local {
            file: LocalFileRef::new(path),
        },
    )
    .with_id(path)
}

/// Three 20-second tracks named a, b, c
pub fn three_tracks() -> Vec<Track> {
    vec![
        stream_track("a", 20),
        stream_track("b", 20),
        stream_track("c", 20),
    ]
}

pub fn test_config() -> PlayerConfig {
    PlayerConfig {
        sample_rate: RATE,
        shuffle_seed: Some(7),
        ..PlayerConfig::default()
    }
}

pub fn create_test_player(backend: Arc<TestBackend>) -> Player {
    Player::builder(backend)
        .config(test_config())
        .settings(Arc::new(MemorySettingsStore::new()))
        .file_provider(Arc::new(MemoryFileProvider::new()))
        .build()
}

/// Pull `seconds` of audio through the engine, as an output would
pub fn render_secs(player: &Player, seconds: f64) {
    let frames = (seconds * f64::from(RATE)).round() as usize;
    let mut block = vec![0.0f32; 50 * CHANNELS];
    for _ in 0..frames / 50 {
        player.engine().render(&mut block);
    }
}

pub fn current_title(player: &Player) -> Option<String> {
    player.state().playback.current_track.map(|t| t.title)
}
