//! In-memory sink for offline rendering.

use tt_engine::{BoxedStream, Frame, SampleStream, VoiceSink, BLOCK_SIZE};

/// Holds every voice handed to it and sums them on demand.
#[derive(Default)]
pub struct OfflineSink {
    active: Vec<BoxedStream>,
}

impl OfflineSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Voices still producing frames.
    pub fn active(&self) -> usize {
        self.active.len()
    }

    /// Append exactly `frames` frames of the summed voices to `out`,
    /// padding with silence when nothing is sounding.
    ///
    /// Returns how many of the appended frames any voice wrote to.
    pub fn render(&mut self, frames: usize, out: &mut Vec<Frame>) -> usize {
        let start = out.len();
        out.resize(start + frames, Frame::silence());
        let mut scratch = [Frame::silence(); BLOCK_SIZE];
        let mut covered = 0;

        for (i, block) in out[start..].chunks_mut(BLOCK_SIZE).enumerate() {
            let scratch = &mut scratch[..block.len()];
            let mut filled = 0;
            self.active.retain_mut(|voice| {
                let (n, more) = voice.stream(scratch);
                for (dst, src) in block.iter_mut().zip(&scratch[..n]) {
                    dst.mix(*src);
                }
                filled = filled.max(n);
                more
            });
            if filled > 0 {
                covered = i * BLOCK_SIZE + filled;
            }
        }
        covered
    }

    /// Render until every voice has ended, without trailing padding.
    pub fn drain(&mut self, out: &mut Vec<Frame>) {
        while !self.active.is_empty() {
            let start = out.len();
            let covered = self.render(BLOCK_SIZE, out);
            if self.active.is_empty() {
                out.truncate(start + covered);
            }
        }
    }
}

impl VoiceSink for OfflineSink {
    fn play(&mut self, stream: BoxedStream) {
        self.active.push(stream);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tt_engine::Take;

    struct Constant(f32);

    impl SampleStream for Constant {
        fn stream(&mut self, out: &mut [Frame]) -> (usize, bool) {
            out.fill(Frame::mono(self.0));
            (out.len(), true)
        }
    }

    #[test]
    fn overlapping_voices_are_summed() {
        let mut sink = OfflineSink::new();
        sink.play(Box::new(Take::new(Constant(0.5), 300)));
        let mut out = Vec::new();
        sink.render(100, &mut out);
        sink.play(Box::new(Take::new(Constant(0.25), 100)));
        sink.render(300, &mut out);

        assert_eq!(out.len(), 400);
        assert_eq!(out[99], Frame::mono(0.5));
        assert_eq!(out[100], Frame::mono(0.75));
        assert_eq!(out[200], Frame::mono(0.5));
        assert_eq!(out[300], Frame::silence());
        assert_eq!(sink.active(), 0);
    }

    #[test]
    fn drain_renders_tail() {
        let mut sink = OfflineSink::new();
        sink.play(Box::new(Take::new(Constant(1.0), 700)));
        let mut out = Vec::new();
        sink.drain(&mut out);
        assert_eq!(out.len(), 700);
        assert!(out.iter().all(|f| f.left == 1.0));
    }
}
