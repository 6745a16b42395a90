//! Synthesis and playback engine for the tetrackt sequencer.
//!
//! Everything audible is a pull-based [`SampleStream`]: oscillators feed
//! envelopes, two shaped chains are balanced into a [`Voice`], and the
//! [`Sequencer`] mixes one voice per sounding track on every tick and hands
//! the result to a [`VoiceSink`].

extern crate alloc;

mod envelope;
mod frame;
mod gain;
mod mixer;
mod oscillator;
pub mod scheduler;
mod sink;
mod stream;
mod voice;

pub use envelope::{ramp_multiplier, Envelope, Stage, StageLengths, MIN_LEVEL};
pub use frame::Frame;
pub use gain::{volume_to_decibels, Gain, GainSetting, DECIBELS_PER_DOUBLING, GAIN_BASE};
pub use mixer::{balance, balance_gains, Mix};
pub use oscillator::{phase_increment, Oscillator};
pub use scheduler::{PlayState, Sequencer, TickOutcome};
pub use sink::VoiceSink;
pub use stream::{render_to_vec, BoxedStream, SampleStream, Take, BLOCK_SIZE};
pub use voice::{Synth, Voice};
