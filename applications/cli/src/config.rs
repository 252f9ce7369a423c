/// CLI configuration
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use trio_playback::PlayerConfig;

/// Default config file, read from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "trio.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Render in real time without a device
    #[default]
    Headless,
    /// Default output device (`desktop` feature)
    Device,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CliConfig {
    /// Where durable player settings live
    pub settings_path: Option<PathBuf>,

    pub output: OutputMode,

    pub player: PlayerConfig,
}

impl CliConfig {
    /// Load from an optional TOML file, then `TRIO_*` environment variables
    ///
    /// Nested keys use a double underscore: `TRIO_PLAYER__SAMPLE_RATE=48000`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        let path = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);
        if path.exists() {
            settings = settings.add_source(config::File::from(path.clone()));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("TRIO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        settings
            .build()
            .and_then(config::Config::try_deserialize)
            .with_context(|| format!("Invalid configuration ({})", path.display()))
    }

    /// Settings file, falling back to the platform config directory
    pub fn settings_path(&self) -> PathBuf {
        self.settings_path
            .clone()
            .unwrap_or_else(default_settings_path)
    }
}

/// `$XDG_CONFIG_HOME/trio/settings.json`, else `~/.config/trio/settings.json`
pub fn default_settings_path() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join("trio").join("settings.json")
}
