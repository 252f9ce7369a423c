//! Device output through CPAL
//!
//! The CPAL stream is owned by a dedicated thread, since streams cannot move
//! between threads on every platform. The owner controls it through a
//! command channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use crossbeam_channel::{bounded, Sender};
use tracing::{debug, error, info};

use crate::error::{AudioError, Result};
use crate::source::CHANNELS;

/// Fills an interleaved stereo block; called on the audio thread
pub type RenderCallback = Box<dyn FnMut(&mut [f32]) + Send + 'static>;

/// Commands sent to the output thread
#[derive(Debug, Clone, Copy)]
enum OutputCommand {
    Resume,
    Suspend,
    Close,
}

/// Sample rate of the default output device
pub fn default_output_rate() -> Result<u32> {
    let device = cpal::default_host()
        .default_output_device()
        .ok_or_else(|| AudioError::DeviceUnavailable("no default output device".into()))?;
    let config: StreamConfig = device
        .default_output_config()
        .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?
        .into();
    Ok(config.sample_rate)
}

/// Running output stream on the default device
pub struct DeviceOutput {
    commands: Sender<OutputCommand>,
    sample_rate: u32,
    suspended: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl DeviceOutput {
    /// Open the default device and start pulling from `render`
    ///
    /// The stream starts suspended; call `resume` to begin output.
    pub fn open(render: RenderCallback) -> Result<Self> {
        let (command_tx, command_rx) = bounded::<OutputCommand>(8);
        let (ready_tx, ready_rx) = bounded::<Result<u32>>(1);
        let suspended = Arc::new(AtomicBool::new(true));
        let suspended_for_thread = suspended.clone();

        let thread = std::thread::Builder::new()
            .name("trio-output".into())
            .spawn(move || {
                let stream = match build_stream(render) {
                    Ok((stream, sample_rate)) => {
                        ready_tx.send(Ok(sample_rate)).ok();
                        stream
                    }
                    Err(e) => {
                        ready_tx.send(Err(e)).ok();
                        return;
                    }
                };

                for command in command_rx {
                    let result = match command {
                        OutputCommand::Resume => stream.play().map(|()| false),
                        OutputCommand::Suspend => stream.pause().map(|()| true),
                        OutputCommand::Close => break,
                    };
                    match result {
                        Ok(paused) => suspended_for_thread.store(paused, Ordering::SeqCst),
                        Err(e) => error!(error = %e, "Output stream command failed"),
                    }
                }

                debug!("Output thread exiting");
            })?;

        let sample_rate = ready_rx
            .recv()
            .map_err(|_| AudioError::Output("output thread exited during startup".into()))??;

        info!(sample_rate, "Audio output opened");

        Ok(Self {
            commands: command_tx,
            sample_rate,
            suspended,
            thread: Some(thread),
        })
    }

    /// Device sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Whether the stream is currently paused
    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }

    /// Start or continue output
    pub fn resume(&self) -> Result<()> {
        self.send(OutputCommand::Resume)?;
        self.suspended.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Pause output
    pub fn suspend(&self) -> Result<()> {
        self.send(OutputCommand::Suspend)?;
        self.suspended.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Stop the stream and join the output thread
    pub fn close(&mut self) {
        self.commands.send(OutputCommand::Close).ok();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Output thread panicked");
            }
        }
    }

    fn send(&self, command: OutputCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| AudioError::Output("output thread is gone".into()))
    }
}

impl Drop for DeviceOutput {
    fn drop(&mut self) {
        self.close();
    }
}

fn build_stream(mut render: RenderCallback) -> Result<(cpal::Stream, u32)> {
    let device = cpal::default_host()
        .default_output_device()
        .ok_or_else(|| AudioError::DeviceUnavailable("no default output device".into()))?;

    let supported = device
        .default_output_config()
        .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;
    let device_channels = usize::from(supported.channels()).max(1);
    let config: StreamConfig = supported.into();
    let sample_rate = config.sample_rate;

    let mut scratch = Vec::new();
    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / device_channels;
                scratch.resize(frames * CHANNELS, 0.0);
                render(&mut scratch);

                for (frame, stereo) in data
                    .chunks_exact_mut(device_channels)
                    .zip(scratch.chunks_exact(CHANNELS))
                {
                    if device_channels == 1 {
                        frame[0] = (stereo[0] + stereo[1]) * 0.5;
                    } else {
                        frame[0] = stereo[0];
                        frame[1] = stereo[1];
                        frame[2..].fill(0.0);
                    }
                }
            },
            |err| error!(error = %err, "Audio stream error"),
            None,
        )
        .map_err(|e| AudioError::Output(e.to_string()))?;

    stream
        .pause()
        .map_err(|e| AudioError::Output(e.to_string()))?;

    Ok((stream, sample_rate))
}
