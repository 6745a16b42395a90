//! Per-track synth parameters: two oscillators, two envelopes, one mixer.

/// Waveform produced by an oscillator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OscillatorKind {
    #[default]
    Sine,
    Square,
    Triangle,
    Sawtooth,
    SawtoothReverse,
    Noise,
    /// Always emits 0.
    Silent,
}

impl OscillatorKind {
    /// Kinds offered by the waveform selector, in display order.
    /// `Silent` is a valid track value but is not part of the cycle.
    pub const SELECTABLE: [OscillatorKind; 6] = [
        OscillatorKind::Sine,
        OscillatorKind::Square,
        OscillatorKind::Triangle,
        OscillatorKind::Sawtooth,
        OscillatorKind::SawtoothReverse,
        OscillatorKind::Noise,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            OscillatorKind::Sine => "sine",
            OscillatorKind::Square => "square",
            OscillatorKind::Triangle => "triangle",
            OscillatorKind::Sawtooth => "sawtooth",
            OscillatorKind::SawtoothReverse => "sawtooth_reverse",
            OscillatorKind::Noise => "noise",
            OscillatorKind::Silent => "silent",
        }
    }

    /// Look up a kind by its [`name`](Self::name). Unknown names degrade to `Silent`.
    pub fn from_name(name: &str) -> Self {
        OscillatorKind::SELECTABLE
            .into_iter()
            .find(|k| k.name() == name)
            .unwrap_or(OscillatorKind::Silent)
    }

    /// Next selectable kind, wrapping. `Silent` steps to the first entry.
    pub fn next(self) -> Self {
        match self.selectable_index() {
            Some(i) => Self::SELECTABLE[(i + 1) % Self::SELECTABLE.len()],
            None => Self::SELECTABLE[0],
        }
    }

    /// Previous selectable kind, wrapping. `Silent` steps to the last entry.
    pub fn prev(self) -> Self {
        let len = Self::SELECTABLE.len();
        match self.selectable_index() {
            Some(i) => Self::SELECTABLE[(i + len - 1) % len],
            None => Self::SELECTABLE[len - 1],
        }
    }

    fn selectable_index(self) -> Option<usize> {
        Self::SELECTABLE.iter().position(|k| *k == self)
    }
}

/// Oscillator settings: waveform plus normalized starting phase.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OscillatorConfig {
    pub kind: OscillatorKind,
    /// Starting phase in `[0, 1)`, independent of sample rate.
    pub phase: f64,
}

impl OscillatorConfig {
    pub const fn new(kind: OscillatorKind) -> Self {
        Self { kind, phase: 0.0 }
    }

    pub const fn silent() -> Self {
        Self::new(OscillatorKind::Silent)
    }
}

/// One of the four envelope parameters, for editing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeField {
    Attack,
    Decay,
    Sustain,
    Release,
}

/// ADSR shape.
///
/// `attack`, `decay` and `release` are fractions of the note's total length
/// and are treated independently (their sum may exceed 1). `sustain` is a
/// level in `(0, 1]`, not a duration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeConfig {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl EnvelopeConfig {
    /// Full level for the whole note: the identity envelope.
    pub const FLAT: EnvelopeConfig = EnvelopeConfig::new(0.0, 0.0, 1.0, 0.0);

    pub const fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Self { attack, decay, sustain, release }
    }

    pub fn get(&self, field: EnvelopeField) -> f64 {
        match field {
            EnvelopeField::Attack => self.attack,
            EnvelopeField::Decay => self.decay,
            EnvelopeField::Sustain => self.sustain,
            EnvelopeField::Release => self.release,
        }
    }

    fn field_mut(&mut self, field: EnvelopeField) -> &mut f64 {
        match field {
            EnvelopeField::Attack => &mut self.attack,
            EnvelopeField::Decay => &mut self.decay,
            EnvelopeField::Sustain => &mut self.sustain,
            EnvelopeField::Release => &mut self.release,
        }
    }

    /// Nudge one parameter by `delta`, clamping to `[0, 1]`.
    ///
    /// An increase of attack, decay or release that would push their sum
    /// above 1.0 is rejected. Returns whether the value changed.
    pub fn adjust(&mut self, field: EnvelopeField, delta: f64) -> bool {
        let current = self.get(field);
        let proposed = current + delta;

        if field != EnvelopeField::Sustain && delta > 0.0 {
            let others = self.attack + self.decay + self.release - current;
            // Small epsilon so 0.1-step edits can reach exactly 1.0.
            if proposed + others > 1.0 + 1e-9 {
                return false;
            }
        }

        let clamped = proposed.clamp(0.0, 1.0);
        let slot = self.field_mut(field);
        let changed = *slot != clamped;
        *slot = clamped;
        changed
    }
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self::FLAT
    }
}

/// Balance between the two oscillator chains of a track.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MixerConfig {
    /// 0 = oscillator A only, 1 = oscillator B only, 0.5 = equal blend.
    pub balance: f64,
}

impl MixerConfig {
    pub const fn new(balance: f64) -> Self {
        Self { balance }
    }

    /// Move the balance by `delta`, rounded to hundredths and clamped to `[0, 1]`.
    pub fn nudge(&mut self, delta: f64) {
        let moved = libm::round((self.balance + delta) * 100.0) / 100.0;
        self.balance = moved.clamp(0.0, 1.0);
    }
}

/// The parameter snapshot a voice is built from.
///
/// The editor owns and mutates these per track; the engine copies the
/// snapshot at trigger time and never reaches back into editor state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instrument {
    pub osc_a: OscillatorConfig,
    pub env_a: EnvelopeConfig,
    pub osc_b: OscillatorConfig,
    pub env_b: EnvelopeConfig,
    pub mixer: MixerConfig,
}

impl Instrument {
    /// Single oscillator A of the given kind, flat envelopes, B silent.
    pub const fn single(kind: OscillatorKind) -> Self {
        Self {
            osc_a: OscillatorConfig::new(kind),
            env_a: EnvelopeConfig::FLAT,
            osc_b: OscillatorConfig::silent(),
            env_b: EnvelopeConfig::FLAT,
            mixer: MixerConfig::new(0.0),
        }
    }
}

impl Default for Instrument {
    fn default() -> Self {
        Self::single(OscillatorKind::Sine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_wraps_both_ways() {
        assert_eq!(OscillatorKind::Sine.next(), OscillatorKind::Square);
        assert_eq!(OscillatorKind::Noise.next(), OscillatorKind::Sine);
        assert_eq!(OscillatorKind::Sine.prev(), OscillatorKind::Noise);
    }

    #[test]
    fn silent_enters_cycle_at_ends() {
        assert_eq!(OscillatorKind::Silent.next(), OscillatorKind::Sine);
        assert_eq!(OscillatorKind::Silent.prev(), OscillatorKind::Noise);
    }

    #[test]
    fn unknown_name_is_silent() {
        assert_eq!(OscillatorKind::from_name("sawtooth"), OscillatorKind::Sawtooth);
        assert_eq!(OscillatorKind::from_name("wobble"), OscillatorKind::Silent);
    }

    #[test]
    fn adjust_blocks_adr_overflow() {
        let mut env = EnvelopeConfig::new(0.5, 0.3, 1.0, 0.2);
        assert!(!env.adjust(EnvelopeField::Attack, 0.1));
        assert_eq!(env.attack, 0.5);

        // Decreases are always allowed
        assert!(env.adjust(EnvelopeField::Release, -0.1));
        assert!((env.release - 0.1).abs() < 1e-12);
    }

    #[test]
    fn adjust_sustain_ignores_adr_sum() {
        let mut env = EnvelopeConfig::new(0.5, 0.5, 0.5, 0.0);
        assert!(env.adjust(EnvelopeField::Sustain, 0.2));
        assert!((env.sustain - 0.7).abs() < 1e-12);
    }

    #[test]
    fn adjust_clamps_to_unit_range() {
        let mut env = EnvelopeConfig::new(0.05, 0.0, 0.95, 0.0);
        env.adjust(EnvelopeField::Attack, -0.1);
        assert_eq!(env.attack, 0.0);
        env.adjust(EnvelopeField::Sustain, 0.1);
        assert_eq!(env.sustain, 1.0);
    }

    #[test]
    fn mixer_nudge_rounds_and_clamps() {
        let mut mixer = MixerConfig::new(0.0);
        mixer.nudge(0.01);
        mixer.nudge(0.01);
        mixer.nudge(0.01);
        assert_eq!(mixer.balance, 0.03);

        mixer.nudge(-0.1);
        assert_eq!(mixer.balance, 0.0);

        let mut full = MixerConfig::new(0.95);
        full.nudge(0.1);
        assert_eq!(full.balance, 1.0);
    }

    #[test]
    fn default_instrument_is_sine_plus_silent() {
        let inst = Instrument::default();
        assert_eq!(inst.osc_a.kind, OscillatorKind::Sine);
        assert_eq!(inst.osc_b.kind, OscillatorKind::Silent);
        assert_eq!(inst.env_a, EnvelopeConfig::FLAT);
        assert_eq!(inst.mixer.balance, 0.0);
    }
}
