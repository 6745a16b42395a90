//! Core data model for the tetrackt sequencer.
//!
//! Notes and their pitch math, per-track synth parameters, and the
//! tracks x rows pattern grid. The editor mutates these types; the engine
//! reads them when a row is triggered.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod instrument;
mod note;
mod pattern;
mod presets;

pub use instrument::{
    EnvelopeConfig, EnvelopeField, Instrument, MixerConfig, OscillatorConfig, OscillatorKind,
};
pub use note::{Note, NoteParseError, PitchClass, MAX_OCTAVE, MIN_OCTAVE, REFERENCE_OCTAVE};
pub use pattern::{EffectTag, Pattern, Track, TrackRow, MAX_ROW_VOLUME};
pub use presets::{cycle_preset, find_preset, EnvelopePreset, ENVELOPE_PRESETS};
