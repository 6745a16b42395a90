//! Audio frame type.

use core::ops::{Add, AddAssign};

/// A stereo audio frame (32-bit float, nominal range -1.0..=1.0).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
}

impl Frame {
    /// Create a silent frame.
    pub const fn silence() -> Self {
        Self { left: 0.0, right: 0.0 }
    }

    /// Create a mono frame (same value for both channels).
    pub const fn mono(value: f32) -> Self {
        Self { left: value, right: value }
    }

    /// Mix another frame into this one. No clamping; the output stage clamps.
    pub fn mix(&mut self, other: Frame) {
        self.left += other.left;
        self.right += other.right;
    }

    /// Scale both channels by `gain`.
    pub fn scale(&mut self, gain: f64) {
        self.left = (self.left as f64 * gain) as f32;
        self.right = (self.right as f64 * gain) as f32;
    }

    /// Convert to a clamped 16-bit pair for PCM output.
    pub fn to_i16(self) -> (i16, i16) {
        let conv = |s: f32| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        (conv(self.left), conv(self.right))
    }
}

impl Add for Frame {
    type Output = Frame;

    fn add(mut self, rhs: Frame) -> Frame {
        self.mix(rhs);
        self
    }
}

impl AddAssign for Frame {
    fn add_assign(&mut self, rhs: Frame) {
        self.mix(rhs);
    }
}
