//! Hand-off of voices from the sequencer to the audio callback.
//!
//! Voices travel through a lock-free ring buffer. The callback side keeps a
//! fixed-capacity list of active voices and sums them; finished voices are
//! sent back on a second ring so they are freed outside the callback.

use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::warn;
use tt_engine::{BoxedStream, Frame, VoiceSink, BLOCK_SIZE};

/// Voices the callback sums at once.
pub const MAX_VOICES: usize = 64;

/// Voices that may wait in the queue before the callback picks them up.
pub const QUEUE_CAPACITY: usize = 64;

/// Create a connected sender/mixer pair.
pub fn voice_channel() -> (VoiceSender, VoiceMixer) {
    let (queue_prod, queue_cons) = HeapRb::<BoxedStream>::new(QUEUE_CAPACITY).split();
    let (retired_prod, retired_cons) = HeapRb::<BoxedStream>::new(MAX_VOICES + QUEUE_CAPACITY).split();
    let sender = VoiceSender {
        queue: queue_prod,
        retired: retired_cons,
        dropped: 0,
    };
    let mixer = VoiceMixer {
        queue: queue_cons,
        retired: retired_prod,
        active: Vec::with_capacity(MAX_VOICES),
    };
    (sender, mixer)
}

/// Producer side, used from the tick thread and for note previews.
pub struct VoiceSender {
    queue: HeapProd<BoxedStream>,
    retired: HeapCons<BoxedStream>,
    dropped: usize,
}

impl VoiceSender {
    /// Free voices the callback has finished with. Returns how many.
    pub fn collect_garbage(&mut self) -> usize {
        self.retired.pop_iter().count()
    }

    /// Voices discarded because the queue was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl VoiceSink for VoiceSender {
    fn play(&mut self, stream: BoxedStream) {
        self.collect_garbage();
        if self.queue.try_push(stream).is_err() {
            self.dropped += 1;
            warn!(dropped = self.dropped, "voice queue full, dropping voice");
        }
    }
}

/// Consumer side, owned by the audio callback.
pub struct VoiceMixer {
    queue: HeapCons<BoxedStream>,
    retired: HeapProd<BoxedStream>,
    active: Vec<BoxedStream>,
}

impl VoiceMixer {
    /// Voices currently sounding.
    pub fn active(&self) -> usize {
        self.active.len()
    }

    /// Fill `out` with the sum of all active voices.
    ///
    /// Does not allocate: the active list never grows past its initial
    /// capacity, and finished voices are handed back to the sender.
    pub fn render(&mut self, out: &mut [Frame]) {
        while self.active.len() < self.active.capacity() {
            match self.queue.try_pop() {
                Some(voice) => self.active.push(voice),
                None => break,
            }
        }

        out.fill(Frame::silence());
        let mut scratch = [Frame::silence(); BLOCK_SIZE];
        for block in out.chunks_mut(BLOCK_SIZE) {
            let scratch = &mut scratch[..block.len()];
            let mut i = 0;
            while i < self.active.len() {
                let (n, more) = self.active[i].stream(scratch);
                for (dst, src) in block.iter_mut().zip(&scratch[..n]) {
                    dst.mix(*src);
                }
                if more {
                    i += 1;
                } else {
                    let done = self.active.swap_remove(i);
                    // Ring full: free here rather than leak.
                    let _ = self.retired.try_push(done);
                }
            }
        }
    }
}
