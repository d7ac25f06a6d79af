//! Major-scale lookup.
//!
//! Every diatonic tone in chordpad comes from [`note_in_key`], which is a
//! table lookup into [`MAJOR_SCALE_INTERVALS`] rather than computed step
//! arithmetic.

use super::pitch::{MusicalKey, PitchClass};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semitone offsets of the seven major-scale degrees from the tonic.
pub const MAJOR_SCALE_INTERVALS: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

const NUMERALS: [&str; 7] = ["I", "ii", "iii", "IV", "V", "vi", "vii"];

/// Position within the major scale, always in `0..7`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub struct ScaleDegree(u8);

impl ScaleDegree {
    pub const TONIC: ScaleDegree = ScaleDegree(0);

    /// Build a degree, reducing any input mod 7.
    pub fn new(degree: i32) -> Self {
        Self(degree.rem_euclid(7) as u8)
    }

    /// All seven degrees in order.
    pub fn all() -> impl Iterator<Item = ScaleDegree> {
        (0..7).map(ScaleDegree::new)
    }

    /// Zero-based index.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The degree `steps` scale steps above this one (mod 7).
    pub fn offset(self, steps: i32) -> Self {
        Self::new(self.0 as i32 + steps)
    }

    /// Roman numeral as shown on the pad (`I ii iii IV V vi vii`).
    pub fn numeral(self) -> &'static str {
        NUMERALS[self.index()]
    }

    /// Degrees shown with lowercase numerals; chord labels call these "Minor".
    pub fn is_minor(self) -> bool {
        matches!(self.0, 1 | 2 | 5 | 6)
    }

    /// Parse a roman numeral, case-insensitively.
    pub fn from_numeral(numeral: &str) -> Option<Self> {
        NUMERALS
            .iter()
            .position(|n| n.eq_ignore_ascii_case(numeral.trim()))
            .map(|i| ScaleDegree(i as u8))
    }
}

impl From<u8> for ScaleDegree {
    fn from(value: u8) -> Self {
        Self::new(value as i32)
    }
}

impl From<ScaleDegree> for u8 {
    fn from(degree: ScaleDegree) -> Self {
        degree.0
    }
}

impl fmt::Display for ScaleDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.numeral())
    }
}

/// Parses either a 1-based number (`"1"`..`"7"`) or a roman numeral.
impl FromStr for ScaleDegree {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<u8>() {
            if (1..=7).contains(&n) {
                return Ok(ScaleDegree(n - 1));
            }
            return Err(Error::InvalidDegree(s.to_string()));
        }
        Self::from_numeral(trimmed).ok_or_else(|| Error::InvalidDegree(s.to_string()))
    }
}

/// Pitch class of `degree` in the major scale of `key`.
pub fn note_in_key(key: MusicalKey, degree: ScaleDegree) -> PitchClass {
    key.transpose(MAJOR_SCALE_INTERVALS[degree.index()])
}

/// The seven pitch classes of the major scale of `key`.
pub fn scale_notes(key: MusicalKey) -> [PitchClass; 7] {
    let mut notes = [key; 7];
    for degree in ScaleDegree::all() {
        notes[degree.index()] = note_in_key(key, degree);
    }
    notes
}

/// Which degree of `key` a pitch class is, if it belongs to the scale.
pub fn degree_of(key: MusicalKey, pitch: PitchClass) -> Option<ScaleDegree> {
    ScaleDegree::all().find(|&d| note_in_key(key, d) == pitch)
}

pub fn is_in_scale(key: MusicalKey, pitch: PitchClass) -> bool {
    degree_of(key, pitch).is_some()
}
