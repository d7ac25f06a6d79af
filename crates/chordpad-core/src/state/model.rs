//! Snapshot of engine state for display collaborators.

use crate::sequencer::{PlayMode, SequencerSlot};
use crate::theory::{ArpeggioOrder, ChordModifier, MusicalKey, PitchClass};

/// Display view of one sequencer slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotView {
    /// `""` for empty, `"REST"` for rests.
    pub label: String,
    /// Pitch names without octave.
    pub notes: Vec<String>,
    pub tied: bool,
}

impl From<&SequencerSlot> for SlotView {
    fn from(slot: &SequencerSlot) -> Self {
        Self {
            label: slot.label().to_string(),
            notes: slot.display_notes(),
            tied: slot.is_tied(),
        }
    }
}

/// Everything a display needs, published after each engine mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineSnapshot {
    pub key: MusicalKey,
    pub octave: i32,
    pub inversion: usize,
    pub modifier: ChordModifier,
    pub play_mode: PlayMode,
    pub arp_order: ArpeggioOrder,

    /// Label of the last chord sounded or captured.
    pub last_chord_label: Option<String>,
    /// Display notes of that chord.
    pub last_chord_notes: Vec<String>,

    pub slots: Vec<SlotView>,
    pub recording_index: Option<usize>,
    pub playing_index: Option<usize>,
    pub has_clipboard: bool,
    pub loop_mode: bool,
    pub sequencer_bpm: u32,
    pub transport_running: bool,

    pub metronome_running: bool,
    pub metronome_bpm: u32,
    pub metronome_beat: u32,
    pub beats_per_measure: u32,

    /// Incremented on every publish.
    pub version: u64,
}

impl Default for EngineSnapshot {
    fn default() -> Self {
        Self {
            key: PitchClass::C,
            octave: 4,
            inversion: 0,
            modifier: ChordModifier::default(),
            play_mode: PlayMode::default(),
            arp_order: ArpeggioOrder::default(),
            last_chord_label: None,
            last_chord_notes: Vec::new(),
            slots: Vec::new(),
            recording_index: None,
            playing_index: None,
            has_clipboard: false,
            loop_mode: false,
            sequencer_bpm: 120,
            transport_running: false,
            metronome_running: false,
            metronome_bpm: 120,
            metronome_beat: 0,
            beats_per_measure: 4,
            version: 0,
        }
    }
}

impl EngineSnapshot {
    pub fn row_count(&self) -> usize {
        self.slots.len() / crate::sequencer::ROW_LEN
    }

    pub fn slot_labels(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.label.as_str()).collect()
    }

    pub fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}
