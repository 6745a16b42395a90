//! Where finished voice streams go.

use alloc::vec::Vec;

use crate::stream::BoxedStream;

/// Accepts streams for immediate, fire-and-forget playback.
///
/// Implementations sum everything they have been handed; the caller never
/// waits for a stream to finish.
pub trait VoiceSink {
    fn play(&mut self, stream: BoxedStream);
}

/// Collects streams without playing them.
impl VoiceSink for Vec<BoxedStream> {
    fn play(&mut self, stream: BoxedStream) {
        self.push(stream);
    }
}

impl<T: VoiceSink + ?Sized> VoiceSink for &mut T {
    fn play(&mut self, stream: BoxedStream) {
        (**self).play(stream);
    }
}
