//! Engine messages.
//!
//! Every command the engine accepts is an [`EngineMessage`] variant. The
//! runtime thread applies them one at a time between ticks, so commands and
//! transport steps share a single total order.

use crate::sequencer::PlayMode;
use crate::theory::{ArpeggioOrder, ChordModifier, MusicalKey, ScaleDegree};

/// Commands applied by the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineMessage {
    // === Performance pad ===
    /// Build and sound the chord on a degree. Captured into the sequencer when
    /// a slot is armed.
    PlayDegree { degree: ScaleDegree },

    /// Select the key.
    SetKey { key: MusicalKey },

    /// Select the chord modifier.
    SetModifier { modifier: ChordModifier },

    /// Set the pad octave (clamped).
    SetOctave { octave: i32 },

    /// Move the pad octave up or down (clamped).
    ShiftOctave { delta: i32 },

    /// Set the pad inversion (clamped).
    SetInversion { inversion: usize },

    /// Move the pad inversion up or down (clamped).
    ShiftInversion { delta: i32 },

    SetPlayMode { mode: PlayMode },

    SetArpeggioOrder { order: ArpeggioOrder },

    /// Delay between pad arpeggio notes.
    SetArpSpeed { secs: f64 },

    /// Length of pad notes.
    SetNoteLength { secs: f64 },

    // === Sequencer edits ===
    /// Arm (or disarm, if already armed) a slot for capture.
    ArmRecording { index: usize },

    /// Capture the pad's current chord on a degree without sounding it.
    CaptureChord { degree: ScaleDegree },

    SetRest { index: usize },

    DeleteSlot { index: usize },

    ToggleTie { index: usize },

    CopySlot { index: usize },

    PasteSlot { index: usize },

    AddRow,

    RemoveRow,

    /// Empty every slot and stop playback.
    ClearSequencer,

    // === Sequencer playback ===
    /// Start the transport.
    StartTransport,

    /// Stop the transport, cancelling pending triggers.
    StopTransport,

    /// Reset the playing cursor to before the first slot.
    StepFirst,

    /// Step to and play the next steppable slot.
    StepNext,

    /// Step to and play the previous steppable slot.
    StepPrev,

    /// Play a specific slot.
    PlaySlot { index: usize },

    SetSequencerBpm { bpm: u32 },

    AdjustSequencerBpm { delta: i32 },

    SetLoopMode { enabled: bool },

    ToggleLoop,

    // === Metronome ===
    StartMetronome,

    StopMetronome,

    SetMetronomeBpm { bpm: u32 },

    SetBeatsPerMeasure { beats: u32 },
}
