//! WAV encoding for 16-bit stereo PCM.

use std::io::{Cursor, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use tt_engine::Frame;

fn spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

fn write_frames<W: Write + Seek>(writer: W, frames: &[Frame], sample_rate: u32) -> Result<(), hound::Error> {
    let mut wav = WavWriter::new(writer, spec(sample_rate))?;
    let mut samples = wav.get_i16_writer(frames.len() as u32 * 2);
    for frame in frames {
        let (left, right) = frame.to_i16();
        samples.write_sample(left);
        samples.write_sample(right);
    }
    samples.flush()?;
    wav.finalize()
}

/// Write `frames` to a WAV file at `path`.
pub fn write_wav(path: impl AsRef<Path>, frames: &[Frame], sample_rate: u32) -> Result<(), hound::Error> {
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    write_frames(file, frames, sample_rate)
}

/// Encode `frames` as an in-memory WAV file.
pub fn frames_to_wav(frames: &[Frame], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let mut buf = Vec::new();
    write_frames(Cursor::new(&mut buf), frames, sample_rate)?;
    Ok(buf)
}
