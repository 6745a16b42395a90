//! Stream summing and the two-chain balance mixer.

use alloc::boxed::Box;
use alloc::vec::Vec;

use tt_ir::MixerConfig;

use crate::frame::Frame;
use crate::gain::{Gain, GainSetting};
use crate::stream::{BoxedStream, SampleStream, BLOCK_SIZE};

struct Input {
    stream: BoxedStream,
    live: bool,
}

/// Sums any number of streams sample-wise.
///
/// Ends once every input has ended. Exhausted inputs are kept (not dropped)
/// so pulling never frees memory.
pub struct Mix {
    inputs: Vec<Input>,
}

impl Mix {
    pub fn new(streams: impl IntoIterator<Item = BoxedStream>) -> Self {
        Self {
            inputs: streams.into_iter().map(|stream| Input { stream, live: true }).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    fn mix_block(&mut self, out: &mut [Frame]) -> usize {
        let mut scratch = [Frame::silence(); BLOCK_SIZE];
        let scratch = &mut scratch[..out.len()];
        out.fill(Frame::silence());

        let mut filled = 0;
        for input in self.inputs.iter_mut().filter(|i| i.live) {
            let (n, more) = input.stream.stream(scratch);
            for (dst, src) in out.iter_mut().zip(&scratch[..n]) {
                dst.mix(*src);
            }
            filled = filled.max(n);
            input.live = more;
        }
        filled
    }
}

impl SampleStream for Mix {
    fn stream(&mut self, out: &mut [Frame]) -> (usize, bool) {
        let mut filled = 0;
        for block in out.chunks_mut(BLOCK_SIZE) {
            let n = self.mix_block(block);
            filled += n;
            if n < block.len() {
                break;
            }
        }
        (filled, self.inputs.iter().any(|i| i.live))
    }
}

/// Gains for chains A and B at a given balance.
///
/// The balance is rescaled to a pan `p` in `-1..=1`. Chain A gets exponent
/// `-p - 1`, chain B gets `p - 1` (base 2), and each side is muted at its far
/// end. Balance 0 passes A at unity with B muted, 1 does the reverse, and 0.5
/// gives both a gain of one half.
pub fn balance_gains(mixer: &MixerConfig) -> (GainSetting, GainSetting) {
    let balance = if mixer.balance.is_finite() {
        mixer.balance.clamp(0.0, 1.0)
    } else {
        0.5
    };
    let pan = (balance - 0.5) * 2.0;
    let a = GainSetting::new(-pan - 1.0, pan >= 1.0);
    let b = GainSetting::new(pan - 1.0, pan <= -1.0);
    (a, b)
}

/// Blend two chains additively according to `mixer`.
pub fn balance<A, B>(a: A, b: B, mixer: &MixerConfig) -> Mix
where
    A: SampleStream + 'static,
    B: SampleStream + 'static,
{
    let (gain_a, gain_b) = balance_gains(mixer);
    Mix::new([
        Box::new(Gain::new(a, gain_a)) as BoxedStream,
        Box::new(Gain::new(b, gain_b)) as BoxedStream,
    ])
}
