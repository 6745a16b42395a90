//! Note values and equal-tempered pitch math.

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

/// Lowest octave a note can sit in.
pub const MIN_OCTAVE: u8 = 0;

/// Highest octave a note can sit in.
pub const MAX_OCTAVE: u8 = 8;

/// Octave at which [`PitchClass::base_frequency`] is defined.
pub const REFERENCE_OCTAVE: u8 = 4;

/// One of the twelve equal-tempered pitch classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    /// All pitch classes in ascending order.
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Frequency in Hz at the reference octave (4).
    pub const fn base_frequency(self) -> f64 {
        match self {
            PitchClass::C => 261.63,
            PitchClass::CSharp => 277.18,
            PitchClass::D => 293.66,
            PitchClass::DSharp => 311.13,
            PitchClass::E => 329.63,
            PitchClass::F => 349.23,
            PitchClass::FSharp => 369.99,
            PitchClass::G => 392.00,
            PitchClass::GSharp => 415.30,
            PitchClass::A => 440.00,
            PitchClass::ASharp => 466.16,
            PitchClass::B => 493.88,
        }
    }

    /// Semitone index (0 = C, 11 = B).
    pub const fn semitone(self) -> u8 {
        self as u8
    }

    /// Note name as written in a pattern cell ("C", "C#", ...).
    pub const fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        PitchClass::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

/// A note in a pattern cell.
///
/// `Off` silences a row and carries no octave. Notes are plain values:
/// transposition returns a new note rather than changing this one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Note {
    /// Empty / silent row.
    #[default]
    Off,
    /// A sounding pitch.
    On { pitch: PitchClass, octave: u8 },
}

impl Note {
    /// Create a sounding note. Octaves above [`MAX_OCTAVE`] are clamped.
    pub const fn new(pitch: PitchClass, octave: u8) -> Self {
        let octave = if octave > MAX_OCTAVE { MAX_OCTAVE } else { octave };
        Note::On { pitch, octave }
    }

    /// Whether this note silences its row.
    pub const fn is_off(self) -> bool {
        matches!(self, Note::Off)
    }

    /// Pitch class, if sounding.
    pub const fn pitch(self) -> Option<PitchClass> {
        match self {
            Note::On { pitch, .. } => Some(pitch),
            Note::Off => None,
        }
    }

    /// Octave, if sounding.
    pub const fn octave(self) -> Option<u8> {
        match self {
            Note::On { octave, .. } => Some(octave),
            Note::Off => None,
        }
    }

    /// Equal-tempered frequency in Hz.
    ///
    /// `Off` has no pitch and yields 0.0, as does an octave above
    /// [`MAX_OCTAVE`]; callers should check [`Note::is_off`] before building
    /// a voice from the result.
    pub fn frequency(self) -> f64 {
        match self {
            Note::On { pitch, octave } if octave <= MAX_OCTAVE => {
                pitch.base_frequency() * octave_scale(octave)
            }
            _ => 0.0,
        }
    }

    /// Shift by whole octaves.
    ///
    /// Returns `None` for `Off` notes and for shifts that would leave
    /// `MIN_OCTAVE..=MAX_OCTAVE`.
    pub fn transpose(self, octaves: i8) -> Option<Note> {
        let Note::On { pitch, octave } = self else {
            return None;
        };
        let shifted = octave as i16 + octaves as i16;
        if shifted < MIN_OCTAVE as i16 || shifted > MAX_OCTAVE as i16 {
            return None;
        }
        Some(Note::On { pitch, octave: shifted as u8 })
    }
}

/// `2^(octave - REFERENCE_OCTAVE)`, exact for `MIN_OCTAVE..=MAX_OCTAVE`.
fn octave_scale(octave: u8) -> f64 {
    if octave >= REFERENCE_OCTAVE {
        (1u32 << (octave - REFERENCE_OCTAVE)) as f64
    } else {
        1.0 / (1u32 << (REFERENCE_OCTAVE - octave)) as f64
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Note::Off => f.write_str("---"),
            Note::On { pitch, octave } if pitch.name().len() < 2 => {
                write!(f, "{}-{}", pitch.name(), octave)
            }
            Note::On { pitch, octave } => write!(f, "{}{}", pitch.name(), octave),
        }
    }
}

/// Error returned when parsing note text such as `"C-4"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum NoteParseError {
    #[error("empty note text")]
    Empty,
    #[error("unknown pitch class")]
    UnknownPitch,
    #[error("octave missing or outside 0-8")]
    BadOctave,
}

impl FromStr for Note {
    type Err = NoteParseError;

    /// Parses `---` (off), `C-4` style naturals and `C#4` style sharps.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(NoteParseError::Empty);
        }
        if s == "---" {
            return Ok(Note::Off);
        }

        let split = s.char_indices().last().map_or(0, |(i, _)| i);
        let (name, octave) = s.split_at(split);
        let octave = octave
            .parse::<u8>()
            .ok()
            .filter(|o| *o <= MAX_OCTAVE)
            .ok_or(NoteParseError::BadOctave)?;
        let name = name.strip_suffix('-').unwrap_or(name);
        let pitch = PitchClass::from_name(name).ok_or(NoteParseError::UnknownPitch)?;

        Ok(Note::On { pitch, octave })
    }
}
