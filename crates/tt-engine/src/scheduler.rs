//! Row-by-row pattern playback driven by an external tick.
//!
//! The [`Sequencer`] owns the playback cursor and nothing else: it reads the
//! pattern when a tick arrives, assembles one voice per sounding track, mixes
//! them under the global volume and hands the result to a [`VoiceSink`].

use alloc::boxed::Box;
use alloc::vec::Vec;

use tracing::{debug, info, trace};
use tt_ir::Pattern;

use crate::gain::{Gain, GainSetting};
use crate::mixer::Mix;
use crate::sink::VoiceSink;
use crate::stream::BoxedStream;
use crate::voice::Synth;

/// Playback state. The row is the one the next tick will play.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayState {
    #[default]
    Stopped,
    /// Wraps to row 0 after the last row.
    Playing { row: u16 },
    /// Wraps to row 0 after `end`.
    Looping { row: u16, end: u16 },
}

/// What a tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickOutcome {
    /// Row that was played.
    pub row: u16,
    /// Voices triggered for that row.
    pub voices: usize,
}

/// Pattern playback cursor and row trigger.
#[derive(Clone, Debug)]
pub struct Sequencer {
    state: PlayState,
    /// Linear master volume in `[0, 1]`.
    global_volume: f64,
    /// Length of every row-triggered voice, in frames.
    row_frames: usize,
}

impl Sequencer {
    pub fn new(row_frames: usize) -> Self {
        Self {
            state: PlayState::Stopped,
            global_volume: 1.0,
            row_frames,
        }
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state != PlayState::Stopped
    }

    /// Row the next tick will play, if playing.
    pub fn playback_row(&self) -> Option<u16> {
        match self.state {
            PlayState::Stopped => None,
            PlayState::Playing { row } | PlayState::Looping { row, .. } => Some(row),
        }
    }

    /// Last row of the loop, in loop mode.
    pub fn loop_end(&self) -> Option<u16> {
        match self.state {
            PlayState::Looping { end, .. } => Some(end),
            _ => None,
        }
    }

    pub fn global_volume(&self) -> f64 {
        self.global_volume
    }

    /// Set the linear master volume, clamped to `[0, 1]`. NaN mutes.
    pub fn set_global_volume(&mut self, volume: f64) {
        self.global_volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
    }

    pub fn row_frames(&self) -> usize {
        self.row_frames
    }

    pub fn set_row_frames(&mut self, frames: usize) {
        self.row_frames = frames;
    }

    /// Start from row 0.
    ///
    /// With `looping`, the loop end is fixed to the edit cursor's row at
    /// this moment; later cursor moves do not change it.
    pub fn start(&mut self, pattern: &Pattern, looping: bool) {
        self.state = if looping {
            let end = pattern.cursor_row.min(pattern.rows().saturating_sub(1));
            PlayState::Looping { row: 0, end }
        } else {
            PlayState::Playing { row: 0 }
        };
        info!(state = ?self.state, "playback started");
    }

    /// Halt future ticks. Voices already in the sink keep playing.
    pub fn stop(&mut self) {
        if self.is_playing() {
            info!("playback stopped");
        }
        self.state = PlayState::Stopped;
    }

    /// Play the current row and advance the cursor.
    ///
    /// Returns `None` when stopped or when the pattern has no rows.
    pub fn tick(
        &mut self,
        pattern: &Pattern,
        synth: &Synth,
        sink: &mut impl VoiceSink,
    ) -> Option<TickOutcome> {
        let row = self.playback_row()?;
        let rows = pattern.rows();
        if rows == 0 {
            return None;
        }
        // The pattern may have shrunk since the last tick.
        let row = if row >= rows { 0 } else { row };

        let voices = self.row_voices(pattern, row, synth);
        let count = voices.len();
        if count > 0 {
            debug!(row, voices = count, "triggering row");
            sink.play(Box::new(self.master(voices)));
        }

        self.state = match self.state {
            PlayState::Playing { .. } => PlayState::Playing { row: next_row(row, rows - 1) },
            PlayState::Looping { end, .. } => {
                PlayState::Looping { row: next_row(row, end.min(rows - 1)), end }
            }
            PlayState::Stopped => PlayState::Stopped,
        };
        trace!(row, next = ?self.playback_row(), "tick");

        Some(TickOutcome { row, voices: count })
    }

    /// One voice per sounding track in `row`, at the row note length.
    pub fn row_voices(&self, pattern: &Pattern, row: u16, synth: &Synth) -> Vec<BoxedStream> {
        pattern
            .sounding(row)
            .filter_map(|(_, note, instrument)| synth.voice(note, self.row_frames, instrument))
            .map(|voice| Box::new(voice) as BoxedStream)
            .collect()
    }

    /// Sum `voices` and apply the global volume.
    pub fn master(&self, voices: Vec<BoxedStream>) -> Gain<Mix> {
        Gain::new(Mix::new(voices), GainSetting::from_linear(self.global_volume))
    }
}

fn next_row(row: u16, last: u16) -> u16 {
    if row >= last { 0 } else { row + 1 }
}
