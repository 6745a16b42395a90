//! Waveform oscillator: an endless mono source written to both channels.

use core::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tt_ir::{OscillatorConfig, OscillatorKind};

use crate::frame::Frame;
use crate::stream::SampleStream;

/// Phase-accumulator oscillator.
///
/// Never ends on its own; wrap it in [`Take`](crate::Take) or a voice to
/// bound its length. Restarting means building a new one.
#[derive(Clone, Debug)]
pub struct Oscillator {
    kind: OscillatorKind,
    /// Normalized phase, always in `[0, 1)`.
    phase: f64,
    /// Phase advance per frame (`frequency / sample_rate`).
    increment: f64,
    noise: Option<StdRng>,
}

impl Oscillator {
    /// Create an oscillator. Non-positive or non-finite frequencies and
    /// sample rates give a zero increment (a held phase).
    pub fn new(config: OscillatorConfig, frequency: f64, sample_rate: u32) -> Self {
        let noise = (config.kind == OscillatorKind::Noise).then(StdRng::from_entropy);
        Self::build(config, frequency, sample_rate, noise)
    }

    /// Like [`Oscillator::new`] but with a fixed noise seed, for reproducible renders.
    pub fn with_seed(config: OscillatorConfig, frequency: f64, sample_rate: u32, seed: u64) -> Self {
        let noise = (config.kind == OscillatorKind::Noise).then(|| StdRng::seed_from_u64(seed));
        Self::build(config, frequency, sample_rate, noise)
    }

    fn build(config: OscillatorConfig, frequency: f64, sample_rate: u32, noise: Option<StdRng>) -> Self {
        Self {
            kind: config.kind,
            phase: wrap_phase(config.phase),
            increment: phase_increment(frequency, sample_rate),
            noise,
        }
    }

    pub fn kind(&self) -> OscillatorKind {
        self.kind
    }

    /// Current normalized phase.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// Write `value(phase)` into every frame, advancing the phase per frame.
    #[inline]
    fn fill(&mut self, out: &mut [Frame], value: impl Fn(f64) -> f64) {
        for frame in out.iter_mut() {
            *frame = Frame::mono(value(self.phase) as f32);
            self.advance();
        }
    }

    #[inline]
    fn advance(&mut self) {
        let next = self.phase + self.increment;
        // Exact for next in [1, 2); also handles increments above 1.
        self.phase = next - next.floor();
    }
}

impl SampleStream for Oscillator {
    fn stream(&mut self, out: &mut [Frame]) -> (usize, bool) {
        match self.kind {
            OscillatorKind::Sine => self.fill(out, sine),
            OscillatorKind::Square => self.fill(out, square),
            OscillatorKind::Triangle => self.fill(out, triangle),
            OscillatorKind::Sawtooth => self.fill(out, sawtooth),
            OscillatorKind::SawtoothReverse => self.fill(out, sawtooth_reverse),
            OscillatorKind::Noise => {
                if let Some(rng) = self.noise.as_mut() {
                    for frame in out.iter_mut() {
                        *frame = Frame::mono(rng.gen_range(-1.0f32..=1.0));
                    }
                } else {
                    out.fill(Frame::silence());
                }
                // Keeps phase bookkeeping uniform across kinds.
                for _ in 0..out.len() {
                    self.advance();
                }
            }
            OscillatorKind::Silent => self.fill(out, |_| 0.0),
        }
        (out.len(), true)
    }
}

/// `frequency / sample_rate`, or 0 for degenerate inputs.
pub fn phase_increment(frequency: f64, sample_rate: u32) -> f64 {
    if sample_rate == 0 || !frequency.is_finite() || frequency <= 0.0 {
        return 0.0;
    }
    frequency / sample_rate as f64
}

fn wrap_phase(phase: f64) -> f64 {
    if !phase.is_finite() {
        return 0.0;
    }
    let wrapped = phase.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs.
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

fn sine(phase: f64) -> f64 {
    (TAU * phase).sin()
}

fn square(phase: f64) -> f64 {
    if phase < 0.5 { 1.0 } else { -1.0 }
}

/// -1 at phase 0, peak +1 at phase 0.5, back to -1 at phase 1.
fn triangle(phase: f64) -> f64 {
    if phase < 0.5 { 4.0 * phase - 1.0 } else { -4.0 * phase + 3.0 }
}

fn sawtooth(phase: f64) -> f64 {
    2.0 * phase - 1.0
}

fn sawtooth_reverse(phase: f64) -> f64 {
    1.0 - 2.0 * phase
}
