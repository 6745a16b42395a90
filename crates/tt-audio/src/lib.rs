//! Real-time audio output for tetrackt.

mod cpal_backend;
mod traits;
mod voice_mixer;

pub use cpal_backend::CpalOutput;
pub use traits::{AudioError, AudioOutput};
pub use voice_mixer::{voice_channel, VoiceMixer, VoiceSender, MAX_VOICES, QUEUE_CAPACITY};
