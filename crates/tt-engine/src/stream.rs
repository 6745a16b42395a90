//! Pull-based sample stream contract and the adapters built on it.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::frame::Frame;

/// Frames processed per internal chunk by adapters that need scratch space.
pub const BLOCK_SIZE: usize = 256;

/// A pull-based source of stereo frames.
///
/// `stream` fills the front of `out` and returns `(filled, more)`. `filled`
/// is less than `out.len()` only when the stream runs dry. Once `more` is
/// `false` the stream is exhausted and every later call returns `(0, false)`.
pub trait SampleStream: Send {
    fn stream(&mut self, out: &mut [Frame]) -> (usize, bool);
}

impl<S: SampleStream + ?Sized> SampleStream for Box<S> {
    fn stream(&mut self, out: &mut [Frame]) -> (usize, bool) {
        (**self).stream(out)
    }
}

impl<S: SampleStream + ?Sized> SampleStream for &mut S {
    fn stream(&mut self, out: &mut [Frame]) -> (usize, bool) {
        (**self).stream(out)
    }
}

/// Boxed stream handed across the engine/sink boundary.
pub type BoxedStream = Box<dyn SampleStream>;

/// Hard cutoff: passes at most `remaining` frames of `source`, then ends.
pub struct Take<S> {
    source: S,
    remaining: usize,
}

impl<S: SampleStream> Take<S> {
    pub fn new(source: S, frames: usize) -> Self {
        Self { source, remaining: frames }
    }

    /// Frames left before the cutoff.
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl<S: SampleStream> SampleStream for Take<S> {
    fn stream(&mut self, out: &mut [Frame]) -> (usize, bool) {
        if self.remaining == 0 {
            return (0, false);
        }
        let want = out.len().min(self.remaining);
        let (n, more) = self.source.stream(&mut out[..want]);
        self.remaining -= n;
        if !more {
            self.remaining = 0;
        }
        (n, self.remaining > 0)
    }
}

/// Pull a finite stream to exhaustion, stopping after `max_frames` at most.
pub fn render_to_vec<S: SampleStream + ?Sized>(stream: &mut S, max_frames: usize) -> Vec<Frame> {
    let mut frames = Vec::with_capacity(max_frames.min(1 << 20));
    let mut block = [Frame::silence(); BLOCK_SIZE];
    while frames.len() < max_frames {
        let want = BLOCK_SIZE.min(max_frames - frames.len());
        let (n, more) = stream.stream(&mut block[..want]);
        frames.extend_from_slice(&block[..n]);
        if !more {
            break;
        }
    }
    frames
}
