use crate::error::{Error, Result};
use crate::theory::{Chord, PitchClass};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Label shown for a rest slot.
pub const REST_LABEL: &str = "REST";

/// How a chord is voiced when played.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    /// All notes at once
    #[default]
    Chord,
    /// One note at a time, staggered
    Arp,
}

impl PlayMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Chord => Self::Arp,
            Self::Arp => Self::Chord,
        }
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chord => f.write_str("chord"),
            Self::Arp => f.write_str("arp"),
        }
    }
}

impl FromStr for PlayMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chord" => Ok(Self::Chord),
            "arp" | "arpeggio" => Ok(Self::Arp),
            _ => Err(Error::InvalidPlayMode(s.to_string())),
        }
    }
}

/// A captured chord.
///
/// Notes are stored in display form (pitch classes only) together with the
/// octave they were captured at. Playback re-voices every pitch class at that
/// octave, so sequencer playback does not depend on live pad settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilledSlot {
    pub label: String,
    pub notes: Vec<PitchClass>,
    pub octave: i32,
    pub play_mode: PlayMode,
    /// Sustain into the next slot instead of retriggering.
    pub tied: bool,
}

impl FilledSlot {
    pub fn from_chord(chord: &Chord, octave: i32, play_mode: PlayMode) -> Self {
        Self {
            label: chord.label().to_string(),
            notes: chord.pitch_classes(),
            octave,
            play_mode,
            tied: false,
        }
    }

    /// Playback note names, e.g. `["C4", "E4", "G4"]`.
    pub fn note_names(&self) -> Vec<String> {
        self.notes
            .iter()
            .map(|pc| pc.at_octave(self.octave).to_string())
            .collect()
    }

    pub fn display_notes(&self) -> Vec<String> {
        self.notes.iter().map(|pc| pc.name().to_string()).collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SequencerSlot {
    #[default]
    Empty,
    Rest,
    Filled(FilledSlot),
}

impl SequencerSlot {
    /// `""` for an empty slot, `"REST"` for a rest, else the chord label.
    pub fn label(&self) -> &str {
        match self {
            Self::Empty => "",
            Self::Rest => REST_LABEL,
            Self::Filled(filled) => &filled.label,
        }
    }

    /// Whether the transport stops on this slot.
    pub fn is_steppable(&self) -> bool {
        !self.label().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Self::Rest)
    }

    pub fn is_tied(&self) -> bool {
        matches!(self, Self::Filled(FilledSlot { tied: true, .. }))
    }

    pub fn as_filled(&self) -> Option<&FilledSlot> {
        match self {
            Self::Filled(filled) => Some(filled),
            _ => None,
        }
    }

    pub fn display_notes(&self) -> Vec<String> {
        self.as_filled()
            .map(FilledSlot::display_notes)
            .unwrap_or_default()
    }
}
