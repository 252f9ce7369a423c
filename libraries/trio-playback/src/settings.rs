//! Settings stores
//!
//! Persist the durable subset of player state (volume, shuffle, repeat, EQ)
//! between runs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{debug, warn};
use trio_core::{PersistedSettings, SettingsStore, TrioError};

/// Settings stored as a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    /// Store backed by `path`; the file is created on first save
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File location
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn load(&self) -> trio_core::Result<Option<PersistedSettings>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let settings = serde_json::from_str(&contents).map_err(|e| {
            TrioError::settings(format!("{}: {}", self.path.display(), e))
        })?;
        debug!(path = %self.path.display(), "Loaded settings");
        Ok(Some(settings))
    }

    fn save(&self, settings: &PersistedSettings) -> trio_core::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write then rename, so a crash never leaves a truncated file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(settings)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Settings kept in memory
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Option<PersistedSettings>>,
    saves: Mutex<usize>,
}

impl MemorySettingsStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with settings
    pub fn with_settings(settings: PersistedSettings) -> Self {
        Self {
            settings: Mutex::new(Some(settings)),
            saves: Mutex::new(0),
        }
    }

    /// Last saved settings
    pub fn current(&self) -> Option<PersistedSettings> {
        self.settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of saves so far
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> trio_core::Result<Option<PersistedSettings>> {
        Ok(self.current())
    }

    fn save(&self, settings: &PersistedSettings) -> trio_core::Result<()> {
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner) = Some(settings.clone());
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

/// Writes settings away from the caller's thread
///
/// Saves run on a blocking task, one at a time. Only the newest pending
/// snapshot is written, so a burst of changes (a dragged volume slider)
/// collapses into a single save. Without a tokio runtime at construction,
/// saves happen inline.
pub(crate) struct SettingsWriter {
    store: Arc<dyn SettingsStore>,
    background: Option<Background>,
}

struct Background {
    latest: watch::Sender<(u64, PersistedSettings)>,
    written: watch::Receiver<u64>,
}

impl SettingsWriter {
    pub(crate) fn new(store: Arc<dyn SettingsStore>) -> Self {
        let background = tokio::runtime::Handle::try_current().ok().map(|handle| {
            let (latest, pending) = watch::channel((0, PersistedSettings::default()));
            let (done, written) = watch::channel(0);
            handle.spawn(write_latest(store.clone(), pending, done));
            Background { latest, written }
        });

        Self { store, background }
    }

    /// Schedule `settings` for saving
    ///
    /// Returns them back when the caller has to save inline.
    pub(crate) fn submit(&self, settings: PersistedSettings) -> Option<PersistedSettings> {
        match &self.background {
            Some(background) => {
                background.latest.send_modify(|(version, latest)| {
                    *version += 1;
                    *latest = settings;
                });
                None
            }
            None => Some(settings),
        }
    }

    pub(crate) fn save_inline(&self, settings: &PersistedSettings) {
        if let Err(e) = self.store.save(settings) {
            warn!(error = %e, "Failed to save settings");
        }
    }

    /// Wait until everything submitted so far has been saved
    pub(crate) async fn flush(&self) {
        if let Some(background) = &self.background {
            let target = background.latest.borrow().0;
            let mut written = background.written.clone();
            // Err only if the writer task is gone, and then nothing is left to wait for
            let _ = written.wait_for(|&version| version >= target).await;
        }
    }
}

async fn write_latest(
    store: Arc<dyn SettingsStore>,
    mut pending: watch::Receiver<(u64, PersistedSettings)>,
    written: watch::Sender<u64>,
) {
    while pending.changed().await.is_ok() {
        let (version, settings) = pending.borrow_and_update().clone();
        let store = store.clone();
        match tokio::task::spawn_blocking(move || store.save(&settings)).await {
            Ok(Ok(())) => debug!(version, "Saved settings"),
            Ok(Err(e)) => warn!(error = %e, "Failed to save settings"),
            Err(e) => warn!(error = %e, "Settings save task failed"),
        }
        written.send_replace(version);
    }
}
