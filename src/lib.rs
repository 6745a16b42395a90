//! Text form of a pattern, as typed on the command line.
//!
//! Each track is one line of whitespace-separated note cells, e.g.
//! `"C-4 --- E-4 G#3"`. Cell `n` of a line lands in row `n` of that track.

use thiserror::Error;
use tt_ir::{Note, NoteParseError, Pattern};

#[derive(Debug, Error)]
pub enum PatternTextError {
    #[error("track {track}, row {row}: bad note {text:?}: {source}")]
    Note {
        track: usize,
        row: usize,
        text: String,
        #[source]
        source: NoteParseError,
    },
    #[error("track {track} has {len} rows but the pattern only has {rows}")]
    TooLong { track: usize, len: usize, rows: u16 },
    #[error("pattern cannot have more than {} rows", u16::MAX)]
    TooManyRows,
}

/// Parse one track line into notes.
pub fn parse_track(track: usize, line: &str) -> Result<Vec<Note>, PatternTextError> {
    line.split_whitespace()
        .enumerate()
        .map(|(row, text)| {
            text.parse::<Note>().map_err(|source| PatternTextError::Note {
                track,
                row,
                text: text.to_string(),
                source,
            })
        })
        .collect()
}

/// Build a pattern from track lines.
///
/// The pattern has at least `min_tracks` tracks and one per line. Without
/// an explicit `rows`, it is as long as the longest line, or `default_rows`
/// when there are no notes at all.
pub fn build_pattern(
    lines: &[String],
    rows: Option<u16>,
    min_tracks: usize,
    default_rows: u16,
) -> Result<Pattern, PatternTextError> {
    let tracks = lines
        .iter()
        .enumerate()
        .map(|(i, line)| parse_track(i, line))
        .collect::<Result<Vec<_>, _>>()?;

    let longest = tracks.iter().map(Vec::len).max().unwrap_or(0);
    let rows = match rows {
        Some(rows) => rows,
        None if longest == 0 => default_rows,
        None => u16::try_from(longest).map_err(|_| PatternTextError::TooManyRows)?,
    };

    let mut pattern = Pattern::new(min_tracks.max(tracks.len()), rows);
    for (track, notes) in tracks.iter().enumerate() {
        if notes.len() > rows as usize {
            return Err(PatternTextError::TooLong { track, len: notes.len(), rows });
        }
        for (row, note) in notes.iter().enumerate() {
            if let Some(cell) = pattern.cell_mut(track, row as u16) {
                cell.note = *note;
            }
        }
    }
    Ok(pattern)
}
