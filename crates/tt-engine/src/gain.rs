//! Logarithmic volume stage.
//!
//! Volume is expressed as an exponent of [`GAIN_BASE`]: each unit doubles
//! or halves the amplitude. A separate silent flag gives a hard mute, since
//! no finite exponent reaches zero.

use crate::frame::Frame;
use crate::stream::SampleStream;

/// Base of the volume exponent.
pub const GAIN_BASE: f64 = 2.0;

/// Units per doubling used when converting a linear volume control.
pub const DECIBELS_PER_DOUBLING: f64 = 6.0;

/// A volume setting: `GAIN_BASE ^ volume`, or silence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GainSetting {
    pub volume: f64,
    pub silent: bool,
}

impl GainSetting {
    pub const UNITY: GainSetting = GainSetting { volume: 0.0, silent: false };
    pub const MUTE: GainSetting = GainSetting { volume: 0.0, silent: true };

    pub const fn new(volume: f64, silent: bool) -> Self {
        Self { volume, silent }
    }

    /// Setting for a linear `[0, 1]` master volume control.
    ///
    /// 0 (or less) is a hard mute rather than `log2(0)`.
    pub fn from_linear(volume: f64) -> Self {
        if volume.is_nan() || volume <= 0.0 {
            return Self::MUTE;
        }
        Self::new(volume_to_decibels(volume.min(1.0)), false)
    }

    /// Linear factor applied to each sample.
    pub fn multiplier(&self) -> f64 {
        if self.silent {
            0.0
        } else {
            GAIN_BASE.powf(self.volume)
        }
    }
}

impl Default for GainSetting {
    fn default() -> Self {
        Self::UNITY
    }
}

/// `log2(volume) * 6`, the exponent form of a linear volume.
///
/// Only meaningful for `volume > 0`; use [`GainSetting::from_linear`] to get
/// the silent flag for 0.
pub fn volume_to_decibels(volume: f64) -> f64 {
    volume.log2() * DECIBELS_PER_DOUBLING
}

/// Scales a stream by a fixed [`GainSetting`].
pub struct Gain<S> {
    source: S,
    multiplier: f64,
}

impl<S: SampleStream> Gain<S> {
    pub fn new(source: S, setting: GainSetting) -> Self {
        Self { source, multiplier: setting.multiplier() }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

impl<S: SampleStream> SampleStream for Gain<S> {
    fn stream(&mut self, out: &mut [Frame]) -> (usize, bool) {
        let (n, more) = self.source.stream(out);
        if self.multiplier != 1.0 {
            for frame in &mut out[..n] {
                frame.scale(self.multiplier);
            }
        }
        (n, more)
    }
}
