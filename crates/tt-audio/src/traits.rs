//! Output backend trait and its errors.

use thiserror::Error;

/// Failures opening or driving an output device.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("device init error: {0}")]
    DeviceInit(String),
    #[error("stream create error: {0}")]
    StreamCreate(String),
    #[error("playback error: {0}")]
    Playback(String),
    /// The host reports no default output device.
    #[error("no audio device available")]
    NoDevice,
}

/// A real-time output that pulls voices on its own callback thread.
pub trait AudioOutput {
    /// Device frame rate; voices must be built at this rate.
    fn sample_rate(&self) -> u32;

    /// Resume pulling from the voice queue.
    fn start(&mut self) -> Result<(), AudioError>;

    /// Output silence. Voices already queued stay queued.
    fn stop(&mut self) -> Result<(), AudioError>;
}
