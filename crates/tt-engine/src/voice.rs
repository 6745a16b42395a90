//! Voice assembly: one triggered note as a finite stream.

use tracing::debug;
use tt_ir::{EnvelopeConfig, Instrument, Note, OscillatorConfig};

use crate::envelope::Envelope;
use crate::frame::Frame;
use crate::mixer::{balance, Mix};
use crate::oscillator::Oscillator;
use crate::stream::{SampleStream, Take};

/// A single triggered note: two shaped oscillators blended by the track's
/// mixer, cut off after exactly the requested number of frames.
///
/// Voices are not restartable. Triggering the same note again means
/// building a new voice.
pub struct Voice {
    inner: Take<Mix>,
    frequency: f64,
}

impl Voice {
    /// Frames still to be produced.
    pub fn remaining(&self) -> usize {
        self.inner.remaining()
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }
}

impl SampleStream for Voice {
    fn stream(&mut self, out: &mut [Frame]) -> (usize, bool) {
        self.inner.stream(out)
    }
}

/// Builds voices from track parameters at a fixed sample rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Synth {
    sample_rate: u32,
    noise_seed: Option<u64>,
}

impl Synth {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate, noise_seed: None }
    }

    /// Seed noise oscillators deterministically (offline renders, tests).
    pub fn with_noise_seed(mut self, seed: u64) -> Self {
        self.noise_seed = Some(seed);
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frame count for a duration in milliseconds, rounded down.
    pub fn frames_for_ms(&self, ms: u32) -> usize {
        (self.sample_rate as u64 * ms as u64 / 1000) as usize
    }

    /// Voice for `note`, lasting `frames` frames. `None` for off notes.
    pub fn voice(&self, note: Note, frames: usize, instrument: &Instrument) -> Option<Voice> {
        if note.is_off() {
            return None;
        }
        debug!(%note, frames, "assembling voice");
        Some(self.voice_at(note.frequency(), frames, instrument))
    }

    /// Voice at an explicit frequency in Hz.
    pub fn voice_at(&self, frequency: f64, frames: usize, instrument: &Instrument) -> Voice {
        let a = self.chain(instrument.osc_a, &instrument.env_a, frequency, frames, 0);
        let b = self.chain(instrument.osc_b, &instrument.env_b, frequency, frames, 1);
        Voice {
            inner: Take::new(balance(a, b, &instrument.mixer), frames),
            frequency,
        }
    }

    fn chain(
        &self,
        osc: OscillatorConfig,
        env: &EnvelopeConfig,
        frequency: f64,
        frames: usize,
        slot: u64,
    ) -> Envelope<Oscillator> {
        let osc = match self.noise_seed {
            Some(seed) => Oscillator::with_seed(osc, frequency, self.sample_rate, seed.wrapping_add(slot)),
            None => Oscillator::new(osc, frequency, self.sample_rate),
        };
        Envelope::new(osc, env, frames)
    }
}

#[cfg(test)]
mod tests {
    use core::f64::consts::TAU;

    use super::*;
    use crate::stream::render_to_vec;
    use tt_ir::{EnvelopeConfig, MixerConfig, OscillatorKind, PitchClass};

    const SAMPLE_RATE: u32 = 44100;

    fn every_shape() -> impl Iterator<Item = Instrument> {
        let envelopes = [
            EnvelopeConfig::FLAT,
            EnvelopeConfig::new(0.3, 0.3, 0.5, 0.3),
            EnvelopeConfig::new(0.9, 0.9, 0.0, 0.9),
            EnvelopeConfig::new(0.0, 0.0, 0.0, 1.0),
        ];
        OscillatorKind::SELECTABLE.into_iter().flat_map(move |kind| {
            envelopes.into_iter().map(move |env| Instrument {
                osc_a: OscillatorConfig::new(kind),
                env_a: env,
                osc_b: OscillatorConfig::new(kind.next()),
                env_b: EnvelopeConfig::FLAT,
                mixer: MixerConfig::new(0.5),
            })
        })
    }

    #[test]
    fn flat_sine_voice_is_pure_sine() {
        let synth = Synth::new(SAMPLE_RATE);
        let instrument = Instrument::single(OscillatorKind::Sine);
        let mut voice = synth.voice_at(440.0, 1000, &instrument);
        let frames = render_to_vec(&mut voice, 5000);

        assert_eq!(frames.len(), 1000);
        for (n, f) in frames.iter().enumerate() {
            let expected = (TAU * 440.0 * n as f64 / SAMPLE_RATE as f64).sin() as f32;
            assert!((f.left - expected).abs() < 1e-5, "frame {}: {} vs {}", n, f.left, expected);
            assert_eq!(f.left, f.right);
        }
    }

    #[test]
    fn voice_never_exceeds_duration() {
        let synth = Synth::new(SAMPLE_RATE).with_noise_seed(3);
        for instrument in every_shape() {
            for frames in [0, 1, 255, 256, 257, 6615] {
                let mut voice = synth.voice_at(261.63, frames, &instrument);
                assert_eq!(render_to_vec(&mut voice, frames * 2 + 10).len(), frames);
                assert_eq!(voice.remaining(), 0);
                let mut buf = [Frame::silence(); 16];
                assert_eq!(voice.stream(&mut buf), (0, false));
            }
        }
    }

    #[test]
    fn off_note_builds_nothing() {
        let synth = Synth::new(SAMPLE_RATE);
        assert!(synth.voice(Note::Off, 100, &Instrument::default()).is_none());
    }

    #[test]
    fn note_voice_uses_note_frequency() {
        let synth = Synth::new(SAMPLE_RATE);
        let voice = synth.voice(Note::new(PitchClass::A, 5), 10, &Instrument::default());
        assert_eq!(voice.map(|v| v.frequency()), Some(880.0));
    }

    #[test]
    fn balance_one_plays_only_b() {
        let synth = Synth::new(SAMPLE_RATE);
        let instrument = Instrument {
            osc_a: OscillatorConfig::new(OscillatorKind::Square),
            osc_b: OscillatorConfig::new(OscillatorKind::Sawtooth),
            mixer: MixerConfig::new(1.0),
            ..Instrument::default()
        };
        let mut voice = synth.voice_at(SAMPLE_RATE as f64 / 4.0, 4, &instrument);
        let out: Vec<f32> = render_to_vec(&mut voice, 4).iter().map(|f| f.left).collect();
        assert_eq!(out, vec![-1.0, -0.5, 0.0, 0.5]);
    }

    #[test]
    fn seeded_synth_is_reproducible() {
        let synth = Synth::new(SAMPLE_RATE).with_noise_seed(11);
        let instrument = Instrument::single(OscillatorKind::Noise);
        let a = render_to_vec(&mut synth.voice_at(440.0, 512, &instrument), 512);
        let b = render_to_vec(&mut synth.voice_at(440.0, 512, &instrument), 512);
        assert_eq!(a, b);
    }

    #[test]
    fn frames_for_ms_rounds_down() {
        let synth = Synth::new(SAMPLE_RATE);
        assert_eq!(synth.frames_for_ms(250), 11025);
        assert_eq!(synth.frames_for_ms(150), 6615);
        assert_eq!(Synth::new(22050).frames_for_ms(1), 22);
    }
}
