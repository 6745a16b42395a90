//! Tracks, rows and the pattern grid the sequencer plays.

use alloc::vec::Vec;
use arrayvec::ArrayString;
use core::fmt::Write;

use crate::instrument::Instrument;
use crate::note::Note;

/// Highest value of the volume column.
pub const MAX_ROW_VOLUME: u8 = 64;

/// Effect column text. Carried for the editor; the engine ignores it.
pub type EffectTag = ArrayString<4>;

/// A single row of one track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackRow {
    pub note: Note,
    /// Volume column (0-64). Stored, not applied by the engine.
    pub volume: u8,
    pub effect: EffectTag,
}

impl TrackRow {
    /// An off row with no volume and a `---` effect.
    pub fn empty() -> Self {
        Self {
            note: Note::Off,
            volume: 0,
            effect: EffectTag::from("---").unwrap_or_default(),
        }
    }

    /// Row with a note and otherwise empty columns.
    pub fn with_note(note: Note) -> Self {
        Self { note, ..Self::empty() }
    }

    /// Volume column as shown in a cell: `..` for 0, two digits otherwise.
    pub fn volume_label(&self) -> ArrayString<2> {
        let mut label = ArrayString::new();
        if self.volume == 0 {
            let _ = label.try_push_str("..");
        } else {
            let _ = write!(label, "{:02}", self.volume.min(MAX_ROW_VOLUME));
        }
        label
    }
}

impl Default for TrackRow {
    fn default() -> Self {
        Self::empty()
    }
}

/// One column of the pattern: instrument parameters plus its rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub instrument: Instrument,
    pub rows: Vec<TrackRow>,
}

impl Track {
    pub fn new(rows: u16) -> Self {
        Self {
            instrument: Instrument::default(),
            rows: alloc::vec![TrackRow::empty(); rows as usize],
        }
    }
}

/// The tracks x rows grid plus the editor's cursor.
///
/// Every track has exactly `rows` entries. The playback cursor is not stored
/// here: the sequencer owns it and only reads this grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    tracks: Vec<Track>,
    rows: u16,
    /// Track under the edit cursor.
    pub cursor_track: usize,
    /// Row under the edit cursor.
    pub cursor_row: u16,
}

impl Pattern {
    /// Default grid: 8 tracks of 64 rows.
    pub const DEFAULT_TRACKS: usize = 8;
    pub const DEFAULT_ROWS: u16 = 64;

    /// Create an empty pattern.
    pub fn new(tracks: usize, rows: u16) -> Self {
        Self {
            tracks: (0..tracks).map(|_| Track::new(rows)).collect(),
            rows,
            cursor_track: 0,
            cursor_row: 0,
        }
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn track_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    /// Get a reference to a row of one track.
    pub fn cell(&self, track: usize, row: u16) -> Option<&TrackRow> {
        self.tracks.get(track)?.rows.get(row as usize)
    }

    /// Get a mutable reference to a row of one track.
    pub fn cell_mut(&mut self, track: usize, row: u16) -> Option<&mut TrackRow> {
        self.tracks.get_mut(track)?.rows.get_mut(row as usize)
    }

    /// Sounding notes in `row`, with the owning track's index and parameters.
    pub fn sounding(&self, row: u16) -> impl Iterator<Item = (usize, Note, &Instrument)> + '_ {
        self.tracks.iter().enumerate().filter_map(move |(i, track)| {
            let cell = track.rows.get(row as usize)?;
            (!cell.note.is_off()).then_some((i, cell.note, &track.instrument))
        })
    }

    /// Track under the edit cursor.
    pub fn current_track(&self) -> Option<&Track> {
        self.tracks.get(self.cursor_track)
    }

    pub fn current_track_mut(&mut self) -> Option<&mut Track> {
        self.tracks.get_mut(self.cursor_track)
    }

    /// Note under the edit cursor.
    pub fn note_at_cursor(&self) -> Option<Note> {
        self.cell(self.cursor_track, self.cursor_row).map(|c| c.note)
    }

    /// Write a note under the edit cursor and return the updated row.
    pub fn set_note_at_cursor(&mut self, note: Note) -> Option<TrackRow> {
        let cell = self.cell_mut(self.cursor_track, self.cursor_row)?;
        cell.note = note;
        Some(*cell)
    }

    /// Transpose the note under the edit cursor by whole octaves.
    ///
    /// Leaves the cell untouched and returns `None` when the note is off or
    /// the shift would leave the octave range.
    pub fn transpose_at_cursor(&mut self, octaves: i8) -> Option<Note> {
        let shifted = self.note_at_cursor()?.transpose(octaves)?;
        self.set_note_at_cursor(shifted);
        Some(shifted)
    }

    /// Move the edit cursor, clamped to the grid.
    pub fn move_cursor(&mut self, tracks: isize, rows: isize) {
        let max_track = self.tracks.len().saturating_sub(1) as isize;
        let max_row = self.rows.saturating_sub(1) as isize;
        self.cursor_track = (self.cursor_track as isize + tracks).clamp(0, max_track) as usize;
        self.cursor_row = (self.cursor_row as isize + rows).clamp(0, max_row) as u16;
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TRACKS, Self::DEFAULT_ROWS)
    }
}
