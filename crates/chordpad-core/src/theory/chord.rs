//! Chord construction from a key, a scale degree and a modifier.
//!
//! Diatonic modifiers take every tone from the key's scale; chromatic
//! modifiers stack fixed semitone offsets on the root. Dominant 7th mixes the
//! two (diatonic third and fifth, chromatic flat seventh).

use super::inversion::apply_inversion;
use super::pitch::{self, MusicalKey, Note};
use super::scale::{note_in_key, ScaleDegree};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Harmonic modifier applied on top of a scale degree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ChordModifier {
    /// Root only
    #[default]
    Plain,
    /// Diatonic major/minor triad
    Triad,
    Diminished,
    Augmented,
    Dominant7,
    /// Diatonic major/minor 7th
    Seventh,
    /// Diatonic major/minor 9th
    Ninth,
    Sus2,
    Sus4,
}

/// One chord tone: either a diatonic step above the degree or a chromatic
/// interval above the root, plus how many octaves above the chord's octave.
#[derive(Clone, Copy, Debug)]
enum Tone {
    Degree(i32, i32),
    Semitones(i32, i32),
}

impl ChordModifier {
    pub const ALL: [ChordModifier; 9] = [
        ChordModifier::Plain,
        ChordModifier::Triad,
        ChordModifier::Diminished,
        ChordModifier::Augmented,
        ChordModifier::Dominant7,
        ChordModifier::Seventh,
        ChordModifier::Ninth,
        ChordModifier::Sus2,
        ChordModifier::Sus4,
    ];

    /// Look up a modifier by name. Unknown names give [`ChordModifier::Plain`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "triad" | "maj" | "min" | "major" | "minor" => Self::Triad,
            "dim" | "diminished" => Self::Diminished,
            "aug" | "augmented" => Self::Augmented,
            "dom7" | "dominant7" | "dominant_7" | "7" => Self::Dominant7,
            "seventh" | "7th" | "maj7" | "min7" => Self::Seventh,
            "ninth" | "9th" | "9" | "maj9" | "min9" => Self::Ninth,
            "sus2" => Self::Sus2,
            "sus4" => Self::Sus4,
            _ => Self::Plain,
        }
    }

    /// Canonical name, as accepted by [`ChordModifier::from_name`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Triad => "triad",
            Self::Diminished => "dim",
            Self::Augmented => "aug",
            Self::Dominant7 => "dom7",
            Self::Seventh => "seventh",
            Self::Ninth => "ninth",
            Self::Sus2 => "sus2",
            Self::Sus4 => "sus4",
        }
    }

    fn tones(self) -> &'static [Tone] {
        use Tone::{Degree, Semitones};
        match self {
            Self::Plain => &[Degree(0, 0)],
            Self::Triad => &[Degree(0, 0), Degree(2, 0), Degree(4, 0)],
            Self::Diminished => &[Semitones(0, 0), Semitones(3, 0), Semitones(6, 0)],
            Self::Augmented => &[Semitones(0, 0), Semitones(4, 0), Semitones(8, 0)],
            Self::Dominant7 => &[Degree(0, 0), Degree(2, 0), Degree(4, 0), Semitones(10, 0)],
            Self::Seventh => &[Degree(0, 0), Degree(2, 0), Degree(4, 0), Degree(6, 0)],
            Self::Ninth => &[
                Degree(0, 0),
                Degree(2, 0),
                Degree(4, 0),
                Degree(6, 0),
                Degree(1, 1),
            ],
            Self::Sus2 => &[Degree(0, 0), Degree(1, 0), Degree(4, 0)],
            Self::Sus4 => &[Degree(0, 0), Degree(3, 0), Degree(4, 0)],
        }
    }

    /// Label suffix for a chord built on `degree`, if any.
    fn label_suffix(self, degree: ScaleDegree) -> Option<&'static str> {
        let minor = degree.is_minor();
        match self {
            Self::Plain => None,
            Self::Triad if minor => Some("Minor"),
            Self::Triad => Some("Major"),
            Self::Diminished => Some("Diminished"),
            Self::Augmented => Some("Augmented"),
            Self::Dominant7 => Some("Dominant 7th"),
            Self::Seventh if minor => Some("Minor 7th"),
            Self::Seventh => Some("Major 7th"),
            Self::Ninth if minor => Some("Minor 9th"),
            Self::Ninth => Some("Major 9th"),
            Self::Sus2 => Some("Sus2"),
            Self::Sus4 => Some("Sus4"),
        }
    }
}

impl fmt::Display for ChordModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Never fails: unknown names fall back to a root-only chord.
impl FromStr for ChordModifier {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl From<String> for ChordModifier {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<ChordModifier> for String {
    fn from(modifier: ChordModifier) -> Self {
        modifier.name().to_string()
    }
}

/// A non-empty, ordered set of notes with a display label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chord {
    notes: Vec<Note>,
    label: String,
}

impl Chord {
    pub fn new(notes: Vec<Note>, label: impl Into<String>) -> Result<Self> {
        if notes.is_empty() {
            return Err(Error::EmptyChord);
        }
        Ok(Self {
            notes,
            label: label.into(),
        })
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// First note in chord order.
    pub fn root(&self) -> Note {
        self.notes[0]
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Always false for a constructed chord.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Display form, without octaves.
    pub fn pitch_names(&self) -> Vec<String> {
        pitch::pitch_names(&self.notes)
    }

    /// Playback form, e.g. `["C4", "E4", "G4"]`.
    pub fn note_names(&self) -> Vec<String> {
        pitch::note_names(&self.notes)
    }

    pub fn pitch_classes(&self) -> Vec<pitch::PitchClass> {
        self.notes.iter().map(|n| n.pitch).collect()
    }

    /// The same chord with inversion `k` applied; the label is kept.
    pub fn inverted(&self, k: usize) -> Self {
        Self {
            notes: apply_inversion(&self.notes, k),
            label: self.label.clone(),
        }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.label, self.note_names().join(" "))
    }
}

/// Label shown for `modifier` on `degree` of `key`, e.g. `"D Minor 7th"`.
pub fn chord_label(key: MusicalKey, degree: ScaleDegree, modifier: ChordModifier) -> String {
    let root = note_in_key(key, degree);
    match modifier.label_suffix(degree) {
        Some(suffix) => format!("{root} {suffix}"),
        None => root.to_string(),
    }
}

/// Build the chord on `degree` of `key` in `octave`.
///
/// Every tone carries `octave` except the ninth of a 9th chord, which sits an
/// octave higher. No octave wrap is applied when a tone's pitch class is lower
/// than the root.
pub fn build_chord(key: MusicalKey, degree: ScaleDegree, modifier: ChordModifier, octave: i32) -> Chord {
    let root = note_in_key(key, degree);
    let notes = modifier
        .tones()
        .iter()
        .map(|tone| match *tone {
            Tone::Degree(steps, octaves) => {
                Note::new(note_in_key(key, degree.offset(steps)), octave + octaves)
            }
            Tone::Semitones(semitones, octaves) => {
                Note::new(root.transpose(semitones), octave + octaves)
            }
        })
        .collect();

    Chord {
        notes,
        label: chord_label(key, degree, modifier),
    }
}
