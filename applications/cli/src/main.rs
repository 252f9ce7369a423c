/// Trio - command line music player
mod config;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use trio_audio::{decode_bytes, EqPreset};
use trio_core::{LocalFileRef, RepeatMode, SettingsStore, Track, TrackSource};
use trio_playback::{
    DefaultBackend, FsFileProvider, JsonFileSettingsStore, Player, PlayerState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{CliConfig, OutputMode};

/// Length of one headless render block
const RENDER_BLOCK: Duration = Duration::from_millis(20);

#[derive(Parser)]
#[command(name = "trio")]
#[command(about = "Play local files and streams through the Trio engine", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "TRIO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum RepeatArg {
    Off,
    All,
    One,
}

impl From<RepeatArg> for RepeatMode {
    fn from(arg: RepeatArg) -> Self {
        match arg {
            RepeatArg::Off => RepeatMode::Off,
            RepeatArg::All => RepeatMode::All,
            RepeatArg::One => RepeatMode::One,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play files or URLs as a queue
    Play {
        /// File paths or http(s) URLs
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Volume (0.0 - 1.0)
        #[arg(short, long)]
        volume: Option<f32>,

        /// Shuffle the queue
        #[arg(long)]
        shuffle: Option<bool>,

        /// Repeat mode
        #[arg(long, value_enum)]
        repeat: Option<RepeatArg>,

        /// EQ preset name (see `trio presets`)
        #[arg(long)]
        preset: Option<String>,

        /// Play through the default output device
        #[arg(long)]
        device: bool,
    },
    /// List built-in EQ presets
    Presets,
    /// Show the persisted settings
    Settings,
    /// Decode a file and print its properties
    Info {
        /// Audio file path
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trio=info,trio_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Play {
            inputs,
            volume,
            shuffle,
            repeat,
            preset,
            device,
        } => {
            let options = PlayOptions {
                volume,
                shuffle,
                repeat: repeat.map(RepeatMode::from),
                preset,
                device: device || config.output == OutputMode::Device,
            };
            play(&config, &inputs, options).await?;
        }
        Commands::Presets => list_presets(),
        Commands::Settings => show_settings(&config)?,
        Commands::Info { path } => info(path).await?,
    }

    Ok(())
}

struct PlayOptions {
    volume: Option<f32>,
    shuffle: Option<bool>,
    repeat: Option<RepeatMode>,
    preset: Option<String>,
    device: bool,
}

fn track_from_input(input: &str) -> Track {
    let is_url = input.starts_with("http://") || input.starts_with("https://");
    let name = input
        .rsplit(['/', '\\'])
        .find(|s| !s.is_empty())
        .unwrap_or(input);
    let title = name.rsplit_once('.').map_or(name, |(stem, _)| stem);

    let source = if is_url {
        TrackSource::ResolvedStream {
            url: input.to_string(),
        }
    } else {
        TrackSource::Local {
            file: LocalFileRef::new(input),
        }
    };

    Track::new(title, "Unknown Artist", "Unknown Album", Duration::ZERO, source)
}

fn backend_for(config: &CliConfig, device: bool) -> anyhow::Result<DefaultBackend> {
    if !device {
        return Ok(DefaultBackend::headless(config.player.sample_rate));
    }

    #[cfg(feature = "desktop")]
    {
        Ok(DefaultBackend::device())
    }
    #[cfg(not(feature = "desktop"))]
    {
        bail!("device output requires building with the `desktop` feature")
    }
}

async fn play(config: &CliConfig, inputs: &[String], options: PlayOptions) -> anyhow::Result<()> {
    let settings_path = config.settings_path();
    tracing::info!("Settings: {}", settings_path.display());

    let backend = backend_for(config, options.device)?;
    let player = Player::builder(Arc::new(backend))
        .config(config.player.clone())
        .file_provider(Arc::new(FsFileProvider))
        .settings(Arc::new(JsonFileSettingsStore::new(settings_path)))
        .build();

    if let Some(volume) = options.volume {
        player.set_volume(volume);
    }
    if let Some(shuffle) = options.shuffle {
        player.set_shuffle(shuffle);
    }
    if let Some(repeat) = options.repeat {
        player.set_repeat(repeat);
    }
    if let Some(name) = &options.preset {
        if !player.apply_eq_preset_named(name) {
            bail!("unknown preset '{}'", name);
        }
    }

    let _now_playing = player.subscribe({
        let last = std::sync::Mutex::new(None::<String>);
        move |state: &PlayerState| {
            let title = state.playback.current_track.as_ref().map(|t| t.title.clone());
            let mut last = last.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if title != *last {
                if let Some(title) = &title {
                    tracing::info!("Now playing: {}", title);
                }
                *last = title;
            }
        }
    });

    let event_loop = player.spawn_event_loop();

    let queue: Vec<Track> = inputs.iter().map(|i| track_from_input(i)).collect();
    let result = match player
        .play_track(queue[0].clone(), Some(queue.clone()))
        .await
    {
        Ok(()) => drive(&player, options.device).await,
        Err(e) => Err(anyhow::Error::new(e).context("failed to start playback")),
    };

    player.shutdown();
    event_loop.await.context("event loop panicked")?;
    player.flush_settings().await;
    result
}

/// Run until playback stops or Ctrl-C
async fn drive(player: &Player, device: bool) -> anyhow::Result<()> {
    let engine = player.engine().clone();
    let frames = (u64::from(engine.sample_rate()) * RENDER_BLOCK.as_millis() as u64 / 1000) as usize;
    let mut block = vec![0.0f32; frames.max(1) * trio_audio::CHANNELS];
    let mut ticker = tokio::time::interval(RENDER_BLOCK);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !device {
                    engine.render(&mut block);
                }
                let state = player.state();
                if !state.playback.is_playing && !state.ui.loading {
                    if let Some(error) = state.ui.last_error {
                        bail!(error);
                    }
                    tracing::info!("Playback finished");
                    return Ok(());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                return Ok(());
            }
        }
    }
}

fn list_presets() {
    for preset in EqPreset::builtin() {
        let gains: Vec<String> = preset.gains.iter().map(|g| format!("{:+.0}", g)).collect();
        println!("{:<14} {}", preset.name, gains.join(" "));
    }
}

fn show_settings(config: &CliConfig) -> anyhow::Result<()> {
    let path = config.settings_path();
    let settings = JsonFileSettingsStore::new(&path)
        .load()?
        .unwrap_or_default();

    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

async fn info(path: PathBuf) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_string);

    let decoded = tokio::task::spawn_blocking(move || decode_bytes(bytes, extension.as_deref()))
        .await??;

    println!("file:        {}", path.display());
    println!("sample rate: {} Hz", decoded.sample_rate);
    println!("frames:      {}", decoded.frames());
    println!(
        "duration:    {:.2} s",
        decoded.frames() as f64 / f64::from(decoded.sample_rate)
    );
    Ok(())
}
