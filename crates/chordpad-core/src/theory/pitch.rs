//! Pitch classes and octave-qualified notes.
//!
//! All transposition arithmetic is done on the index into the fixed chromatic
//! ordering `C, C#, D, ... B`, reduced mod 12. Octaves are plain `i32`s and are
//! never clamped here; clamping belongs to whoever picks the octave.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Pitch class names in chromatic order (sharps only).
pub const CHROMATIC_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Octave assumed when a note name carries no octave suffix.
pub const DEFAULT_OCTAVE: i32 = 4;

/// One of the twelve chromatic pitch classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PitchClass {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

/// A key is named by its tonic pitch class.
pub type MusicalKey = PitchClass;

impl PitchClass {
    /// All pitch classes in chromatic order.
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Index into the chromatic ordering (C = 0).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Pitch class for any integer index, reduced mod 12.
    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.rem_euclid(12) as usize]
    }

    /// Transpose by a number of semitones, wrapping around the octave.
    pub fn transpose(self, semitones: i32) -> Self {
        Self::from_index(self.index() as i32 + semitones)
    }

    /// Display name, e.g. `"C#"`.
    pub fn name(self) -> &'static str {
        CHROMATIC_NAMES[self.index()]
    }

    /// Whether this pitch class is a black key.
    pub fn is_sharp(self) -> bool {
        self.name().ends_with('#')
    }

    /// Place this pitch class in an octave.
    pub fn at_octave(self, octave: i32) -> Note {
        Note::new(self, octave)
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PitchClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match split_pitch(s.trim()) {
            Some((pitch, "")) => Ok(pitch),
            _ => Err(Error::InvalidKey(s.to_string())),
        }
    }
}

impl From<PitchClass> for String {
    fn from(pitch: PitchClass) -> Self {
        pitch.name().to_string()
    }
}

impl TryFrom<String> for PitchClass {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Parse a leading letter plus accidentals, returning the rest of the input.
///
/// Accidentals wrap the pitch class only: `B#` is `C`, `Cb` is `B`.
fn split_pitch(s: &str) -> Option<(PitchClass, &str)> {
    let mut chars = s.char_indices().peekable();
    let (_, letter) = chars.next()?;
    let base = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let mut accidental = 0i32;
    let mut rest_start = letter.len_utf8();
    while let Some(&(pos, c)) = chars.peek() {
        match c {
            '#' | '♯' => accidental += 1,
            'b' | '♭' => accidental -= 1,
            _ => break,
        }
        rest_start = pos + c.len_utf8();
        chars.next();
    }

    Some((PitchClass::from_index(base + accidental), &s[rest_start..]))
}

/// A pitch class placed in a specific octave, e.g. `C#5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Note {
    pub pitch: PitchClass,
    pub octave: i32,
}

impl Note {
    pub fn new(pitch: PitchClass, octave: i32) -> Self {
        Self { pitch, octave }
    }

    /// Absolute semitone number (C4 = 60, matching MIDI numbering).
    pub fn semitone(self) -> i32 {
        (self.octave + 1) * 12 + self.pitch.index() as i32
    }

    /// The same pitch class one octave higher.
    pub fn octave_up(self) -> Self {
        self.with_octave(self.octave + 1)
    }

    pub fn with_octave(self, octave: i32) -> Self {
        Self { octave, ..self }
    }

    /// Display form without the octave suffix.
    pub fn pitch_name(self) -> &'static str {
        self.pitch.name()
    }
}

impl Ord for Note {
    fn cmp(&self, other: &Self) -> Ordering {
        self.semitone().cmp(&other.semitone())
    }
}

impl PartialOrd for Note {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch, self.octave)
    }
}

impl FromStr for Note {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let (pitch, rest) =
            split_pitch(trimmed).ok_or_else(|| Error::InvalidNote(s.to_string()))?;
        let octave = if rest.is_empty() {
            DEFAULT_OCTAVE
        } else {
            rest.parse::<i32>()
                .map_err(|_| Error::InvalidNote(s.to_string()))?
        };
        Ok(Note::new(pitch, octave))
    }
}

/// Format notes in playback form (`["C4", "E4"]`).
pub fn note_names(notes: &[Note]) -> Vec<String> {
    notes.iter().map(Note::to_string).collect()
}

/// Format notes in display form, dropping the octave (`["C", "E"]`).
pub fn pitch_names(notes: &[Note]) -> Vec<String> {
    notes.iter().map(|n| n.pitch_name().to_string()).collect()
}
