//! Platform seams of the engine
//!
//! `AudioBackend` creates the output context and opens sources. The
//! default backend decodes with Symphonia, fetches streams with reqwest, and
//! outputs either headless (the caller drives rendering) or to the default
//! device through CPAL with the `desktop` feature.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;
use trio_audio::{decode_bytes, AudioSource};

use crate::engine::Renderer;
use crate::error::{PlaybackError, Result};

/// Running output that pulls samples from a `Renderer`
pub trait OutputContext: Send + Sync {
    /// Output sample rate
    fn sample_rate(&self) -> u32;

    /// Whether the context is suspended (not pulling samples)
    fn is_suspended(&self) -> bool;

    /// Start or continue pulling samples
    fn resume(&self) -> Result<()>;

    /// Stop pulling samples
    fn suspend(&self) -> Result<()>;

    /// Release the output; the context is unusable afterwards
    fn close(&self);
}

/// Creates output contexts and opens sources
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Rate to decode sources at before a context exists
    fn preferred_sample_rate(&self) -> u32;

    /// Create the output context
    ///
    /// Fails when the platform has no usable audio output.
    async fn create_context(&self, renderer: Renderer) -> Result<Box<dyn OutputContext>>;

    /// Open in-memory file bytes
    async fn open_bytes(
        &self,
        bytes: Arc<[u8]>,
        extension: Option<String>,
        sample_rate: u32,
    ) -> Result<Box<dyn AudioSource>>;

    /// Open a network stream
    async fn open_url(&self, url: &str, sample_rate: u32) -> Result<Box<dyn AudioSource>>;
}

/// Output without a device
///
/// Nothing pulls samples on its own; the owner calls `Renderer::render` (or
/// `PlaybackEngine::render`) at whatever pace it needs.
pub struct HeadlessContext {
    sample_rate: u32,
    suspended: AtomicBool,
    closed: AtomicBool,
    renderer: Renderer,
}

impl HeadlessContext {
    /// Create a suspended headless context
    pub fn new(sample_rate: u32, renderer: Renderer) -> Self {
        Self {
            sample_rate,
            suspended: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            renderer,
        }
    }

    /// Renderer feeding this context
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Whether `close` was called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl OutputContext for HeadlessContext {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }

    fn resume(&self) -> Result<()> {
        if self.is_closed() {
            return Err(PlaybackError::Initialization("context is closed".into()));
        }
        self.suspended.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn suspend(&self) -> Result<()> {
        self.suspended.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {
        self.suspended.store(true, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(feature = "desktop")]
mod device {
    use std::sync::{Mutex, PoisonError};
    use trio_audio::output::DeviceOutput;

    use super::OutputContext;
    use crate::error::{PlaybackError, Result};

    /// Output context on the default CPAL device
    pub(super) struct DeviceContext {
        pub(super) sample_rate: u32,
        pub(super) output: Mutex<DeviceOutput>,
    }

    impl DeviceContext {
        fn output(&self) -> std::sync::MutexGuard<'_, DeviceOutput> {
            self.output.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl OutputContext for DeviceContext {
        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        fn is_suspended(&self) -> bool {
            self.output().is_suspended()
        }

        fn resume(&self) -> Result<()> {
            self.output()
                .resume()
                .map_err(|e| PlaybackError::Initialization(e.to_string()))
        }

        fn suspend(&self) -> Result<()> {
            self.output().suspend().map_err(PlaybackError::from)
        }

        fn close(&self) {
            self.output().close();
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum OutputKind {
    Headless { sample_rate: u32 },
    #[cfg(feature = "desktop")]
    Device,
}

/// Symphonia + reqwest backend
#[derive(Debug, Clone)]
pub struct DefaultBackend {
    output: OutputKind,
    http: reqwest::Client,
}

impl DefaultBackend {
    /// Backend with headless output at `sample_rate`
    pub fn headless(sample_rate: u32) -> Self {
        Self {
            output: OutputKind::Headless {
                sample_rate: sample_rate.max(1),
            },
            http: reqwest::Client::new(),
        }
    }

    /// Backend playing through the default output device
    #[cfg(feature = "desktop")]
    pub fn device() -> Self {
        Self {
            output: OutputKind::Device,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AudioBackend for DefaultBackend {
    fn preferred_sample_rate(&self) -> u32 {
        match self.output {
            OutputKind::Headless { sample_rate } => sample_rate,
            #[cfg(feature = "desktop")]
            OutputKind::Device => trio_audio::output::default_output_rate().unwrap_or(44_100),
        }
    }

    async fn create_context(&self, renderer: Renderer) -> Result<Box<dyn OutputContext>> {
        match self.output {
            OutputKind::Headless { sample_rate } => {
                Ok(Box::new(HeadlessContext::new(sample_rate, renderer)))
            }
            #[cfg(feature = "desktop")]
            OutputKind::Device => {
                use trio_audio::output::DeviceOutput;

                let output = tokio::task::spawn_blocking(move || {
                    DeviceOutput::open(Box::new(move |buffer: &mut [f32]| renderer.render(buffer)))
                })
                .await
                .map_err(|e| PlaybackError::Initialization(e.to_string()))?
                .map_err(|e| PlaybackError::Initialization(e.to_string()))?;

                Ok(Box::new(device::DeviceContext {
                    sample_rate: output.sample_rate(),
                    output: std::sync::Mutex::new(output),
                }))
            }
        }
    }

    async fn open_bytes(
        &self,
        bytes: Arc<[u8]>,
        extension: Option<String>,
        sample_rate: u32,
    ) -> Result<Box<dyn AudioSource>> {
        let source = tokio::task::spawn_blocking(move || {
            decode_bytes(bytes, extension.as_deref())?.into_source(sample_rate)
        })
        .await
        .map_err(|e| PlaybackError::Load(format!("decoder task failed: {}", e)))??;

        Ok(Box::new(source))
    }

    async fn open_url(&self, url: &str, sample_rate: u32) -> Result<Box<dyn AudioSource>> {
        debug!(url, "Fetching stream");
        let response = self.http.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?;

        self.open_bytes(Arc::from(body.as_ref()), url_extension(url), sample_rate)
            .await
    }
}

/// File extension of the last path segment of a URL
fn url_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 5 {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
