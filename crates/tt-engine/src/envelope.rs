//! ADSR envelope shaper with multiplicative (log-domain) ramps.

use tracing::trace;
use tt_ir::EnvelopeConfig;

use crate::frame::Frame;
use crate::stream::SampleStream;

/// Floor level for log-domain ramps. Ramps never start or end at 0.
pub const MIN_LEVEL: f64 = 1e-4;

/// Envelope stage. Stages run in declaration order and are never re-entered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    #[default]
    Off,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Stage lengths in frames, derived from fractional envelope settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageLengths {
    pub attack: usize,
    pub decay: usize,
    pub sustain: usize,
    pub release: usize,
}

impl StageLengths {
    /// Split a note of `total` frames.
    ///
    /// Attack, decay and release are floored fractions of `total`, each
    /// clamped to `[0, 1]`; sustain gets what is left, or 0 when the other
    /// three already exceed `total`.
    pub fn new(config: &EnvelopeConfig, total: usize) -> Self {
        let frames = |fraction: f64| {
            if fraction.is_finite() && fraction > 0.0 {
                (fraction.min(1.0) * total as f64).floor() as usize
            } else {
                0
            }
        };
        let attack = frames(config.attack);
        let decay = frames(config.decay);
        let release = frames(config.release);
        let sustain = total.saturating_sub(attack.saturating_add(decay).saturating_add(release));
        Self { attack, decay, sustain, release }
    }

    fn attack_end(&self) -> usize {
        self.attack
    }

    fn decay_end(&self) -> usize {
        self.attack_end().saturating_add(self.decay)
    }

    fn sustain_end(&self) -> usize {
        self.decay_end().saturating_add(self.sustain)
    }

    fn release_end(&self) -> usize {
        self.sustain_end().saturating_add(self.release)
    }

    /// Stage that owns frame index `idx`.
    pub fn stage_at(&self, idx: usize) -> Stage {
        if idx < self.attack_end() {
            Stage::Attack
        } else if idx < self.decay_end() {
            Stage::Decay
        } else if idx < self.sustain_end() {
            Stage::Sustain
        } else if idx < self.release_end() {
            Stage::Release
        } else {
            Stage::Off
        }
    }
}

/// Per-frame factor taking `start` to `end` in `length` multiplications.
///
/// Zero-length stages are instantaneous jumps and get a factor of 1.
pub fn ramp_multiplier(start: f64, end: f64, length: usize) -> f64 {
    if length == 0 {
        return 1.0;
    }
    ((end.ln() - start.ln()) / length as f64).exp()
}

/// Wraps a stream and scales every frame by an ADSR amplitude.
pub struct Envelope<S> {
    source: S,
    lengths: StageLengths,
    /// Sustain level, clamped to `[MIN_LEVEL, 1]`.
    sustain: f64,
    /// Frames consumed so far.
    idx: usize,
    stage: Stage,
    level: f64,
    multiplier: f64,
}

impl<S: SampleStream> Envelope<S> {
    /// Shape `source` for a note lasting `total` frames.
    pub fn new(source: S, config: &EnvelopeConfig, total: usize) -> Self {
        let sustain = if config.sustain.is_finite() {
            config.sustain.clamp(MIN_LEVEL, 1.0)
        } else {
            1.0
        };
        Self {
            source,
            lengths: StageLengths::new(config, total),
            sustain,
            idx: 0,
            stage: Stage::Off,
            level: 0.0,
            multiplier: 1.0,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Amplitude that will be applied to the next frame, assuming no
    /// stage change happens first.
    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn lengths(&self) -> StageLengths {
        self.lengths
    }

    /// Enter the stage owning the next frame, once per stage.
    fn update_stage(&mut self) {
        let stage = self.lengths.stage_at(self.idx);
        if stage == self.stage {
            return;
        }
        self.stage = stage;

        let (level, multiplier) = match stage {
            Stage::Attack => (MIN_LEVEL, ramp_multiplier(MIN_LEVEL, 1.0, self.lengths.attack)),
            Stage::Decay => (1.0, ramp_multiplier(1.0, self.sustain, self.lengths.decay)),
            Stage::Sustain => (self.sustain, 1.0),
            Stage::Release => (
                self.sustain,
                ramp_multiplier(self.sustain, MIN_LEVEL, self.lengths.release),
            ),
            Stage::Off => (0.0, 1.0),
        };
        self.level = level;
        self.multiplier = multiplier;

        trace!(?stage, idx = self.idx, level, multiplier, "envelope stage");
    }
}

impl<S: SampleStream> SampleStream for Envelope<S> {
    fn stream(&mut self, out: &mut [Frame]) -> (usize, bool) {
        let (n, more) = self.source.stream(out);
        for frame in &mut out[..n] {
            self.update_stage();
            frame.scale(self.level);
            self.level *= self.multiplier;
            self.idx += 1;
        }
        (n, more)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::render_to_vec;
    use crate::stream::tests::{Constant, Sequence};
    use crate::Take;

    fn shaped(config: EnvelopeConfig, total: usize) -> Vec<f32> {
        let mut env = Take::new(Envelope::new(Constant(1.0), &config, total), total);
        render_to_vec(&mut env, total).iter().map(|f| f.left).collect()
    }

    #[test]
    fn stage_lengths_floor_fractions() {
        let l = StageLengths::new(&EnvelopeConfig::new(0.1, 0.25, 0.5, 0.333), 1000);
        assert_eq!(l, StageLengths { attack: 100, decay: 250, sustain: 317, release: 333 });
    }

    #[test]
    fn stage_lengths_clamp_sustain_at_zero() {
        let l = StageLengths::new(&EnvelopeConfig::new(0.5, 0.5, 0.5, 0.5), 100);
        assert_eq!(l.sustain, 0);
        assert_eq!(l.stage_at(49), Stage::Attack);
        assert_eq!(l.stage_at(50), Stage::Decay);
        // Decay goes straight to release
        assert_eq!(l.stage_at(100), Stage::Release);
        assert_eq!(l.stage_at(150), Stage::Off);
    }

    #[test]
    fn flat_envelope_is_identity() {
        let values: Vec<f32> = (0..500).map(|i| ((i as f32) * 0.37).sin()).collect();
        let mut env = Envelope::new(Sequence::new(values.clone()), &EnvelopeConfig::FLAT, values.len());
        let out: Vec<f32> = render_to_vec(&mut env, 1000).iter().map(|f| f.left).collect();
        assert_eq!(out, values);
    }

    #[test]
    fn attack_rises_multiplicatively_to_one() {
        let total = 1000;
        let out = shaped(EnvelopeConfig::new(0.1, 0.0, 1.0, 0.0), total);
        assert!((out[0] as f64 - MIN_LEVEL).abs() < 1e-9);
        // Constant ratio between consecutive attack frames
        let ratio = out[1] as f64 / out[0] as f64;
        for w in out[..100].windows(2) {
            assert!((w[1] as f64 / w[0] as f64 - ratio).abs() < 1e-4);
        }
        assert!(out[..100].windows(2).all(|w| w[1] > w[0]));
        // Sustain at full level afterwards
        assert!(out[100..].iter().all(|v| *v == 1.0));
    }

    #[test]
    fn attack_reaches_one_at_decay_entry() {
        let config = EnvelopeConfig::new(0.2, 0.2, 0.5, 0.2);
        let mut env = Envelope::new(Constant(1.0), &config, 1000);
        let mut buf = [Frame::silence(); 200];
        env.stream(&mut buf);
        assert_eq!(env.stage(), Stage::Attack);
        // Level carried out of attack equals decay's entry level
        assert!((env.level() - 1.0).abs() < 1e-9, "{}", env.level());

        let mut one = [Frame::silence(); 1];
        env.stream(&mut one);
        assert_eq!(env.stage(), Stage::Decay);
        assert_eq!(one[0].left, 1.0);
    }

    #[test]
    fn decay_reaches_sustain_at_sustain_entry() {
        let config = EnvelopeConfig::new(0.1, 0.3, 0.4, 0.2);
        let mut env = Envelope::new(Constant(1.0), &config, 1000);
        let mut buf = [Frame::silence(); 400];
        env.stream(&mut buf);
        assert_eq!(env.stage(), Stage::Decay);
        assert!((env.level() - 0.4).abs() < 1e-9);

        let mut one = [Frame::silence(); 1];
        env.stream(&mut one);
        assert_eq!(env.stage(), Stage::Sustain);
        assert!((one[0].left - 0.4).abs() < 1e-7);
    }

    #[test]
    fn release_enters_at_sustain_level_and_falls_to_floor() {
        let config = EnvelopeConfig::new(0.0, 0.0, 0.6, 0.5);
        let out = shaped(config, 1000);
        assert!((out[499] - 0.6).abs() < 1e-7);
        assert!((out[500] - 0.6).abs() < 1e-7);
        assert!(out[500..].windows(2).all(|w| w[1] < w[0]));
        // One multiplication short of the floor on the final frame
        let m = ramp_multiplier(0.6, MIN_LEVEL, 500);
        assert!((out[999] as f64 - MIN_LEVEL / m).abs() < 1e-8);
    }

    #[test]
    fn release_without_decay_when_sum_overflows() {
        let config = EnvelopeConfig::new(0.5, 0.5, 0.5, 0.5);
        let mut env = Envelope::new(Constant(1.0), &config, 100);
        let mut buf = [Frame::silence(); 100];
        env.stream(&mut buf);
        assert_eq!(env.stage(), Stage::Decay);
        env.stream(&mut buf[..1]);
        assert_eq!(env.stage(), Stage::Release);
    }

    #[test]
    fn off_after_all_stages_is_silent() {
        let config = EnvelopeConfig::new(0.1, 0.1, 0.5, 0.1);
        let mut env = Envelope::new(Constant(1.0), &config, 100);
        let out = render_to_vec(&mut Take::new(&mut env, 150), 150);
        assert_eq!(env.stage(), Stage::Off);
        assert!(out[100..].iter().all(|f| *f == Frame::silence()));
    }

    #[test]
    fn zero_length_stages_are_skipped() {
        // 0% attack: first frame is already in decay at full level
        let out = shaped(EnvelopeConfig::new(0.0, 0.5, 0.5, 0.0), 100);
        assert_eq!(out[0], 1.0);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn zero_sustain_is_clamped_to_floor() {
        // Presets such as "Pluck Clean" use a sustain of 0.0
        let out = shaped(EnvelopeConfig::new(0.01, 0.12, 0.0, 0.10), 1000);
        assert!(out.iter().all(|v| v.is_finite() && *v >= 0.0));
        assert!((out[500] as f64 - MIN_LEVEL).abs() < 1e-9);
    }

    #[test]
    fn stage_is_entered_once() {
        // Multiplier must not be reset mid-stage across pull boundaries
        let config = EnvelopeConfig::new(0.5, 0.0, 1.0, 0.0);
        let whole = shaped(config, 200);
        let mut env = Envelope::new(Constant(1.0), &config, 200);
        let mut chunked = Vec::new();
        let mut buf = [Frame::silence(); 7];
        while chunked.len() < 200 {
            let want = buf.len().min(200 - chunked.len());
            let (n, _) = env.stream(&mut buf[..want]);
            chunked.extend(buf[..n].iter().map(|f| f.left));
        }
        assert_eq!(chunked, whole);
    }

    #[test]
    fn oversized_fractions_are_clamped() {
        let l = StageLengths::new(&EnvelopeConfig::new(1e300, 0.5, 1.0, 0.5), 100);
        assert_eq!(l, StageLengths { attack: 100, decay: 50, sustain: 0, release: 50 });

        let out = shaped(EnvelopeConfig::new(1e300, 1e300, 1.0, f64::MAX), 100);
        assert_eq!(out.len(), 100);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn huge_totals_do_not_overflow_boundaries() {
        let l = StageLengths::new(&EnvelopeConfig::new(1.0, 1.0, 1.0, 1.0), usize::MAX);
        assert_eq!(l.sustain, 0);
        assert_eq!(l.stage_at(usize::MAX - 1), Stage::Attack);
    }

    #[test]
    fn ramp_multiplier_guards_zero_length() {
        assert_eq!(ramp_multiplier(MIN_LEVEL, 1.0, 0), 1.0);
        let m = ramp_multiplier(MIN_LEVEL, 1.0, 10);
        assert!((MIN_LEVEL * m.powi(10) - 1.0).abs() < 1e-12);
    }
}
