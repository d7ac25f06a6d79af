//! chordpad core - music theory and step sequencing for a chord pad.
//!
//! This crate provides the building blocks for chordpad:
//!
//! - **Theory** - Pitch classes, the major scale, chord building, inversions, arpeggios
//! - **Sequencer** - Rows of slots with rests, ties and copy/paste
//! - **Transport** - Tempo-driven stepping with cancellable deferred triggers
//! - **Metronome** - Independent click track
//! - **Performance** - Live pad settings turning a degree into sound
//! - **Engine / Runtime** - Message-driven engine owned by a single runtime thread
//! - **Config** - TOML configuration
//!
//! # Architecture
//!
//! chordpad never produces audio. It computes note names and durations and
//! hands them to a [`NoteTrigger`] supplied by the host. All mutations flow
//! through the [`EngineMessage`] enum; the [`Runtime`] applies them on one
//! thread and publishes an [`EngineSnapshot`] through the [`StateManager`]
//! after every change.

pub mod config;
pub mod engine;
pub mod error;
pub mod metronome;
pub mod performance;
pub mod runtime;
pub mod sequencer;
pub mod state;
pub mod theory;
pub mod timing;
pub mod transport;
pub mod trigger;

// Re-export main types for convenience
pub use config::{Config, MetronomeSettings, SequencerSettings};
pub use engine::Engine;
pub use error::{Error, Result};
pub use metronome::Metronome;
pub use performance::{degree_for_key, PadPlay, PerformanceSettings};
pub use runtime::{Runtime, RuntimeHandle};
pub use sequencer::{FilledSlot, PlayMode, SequencerSlot, SequencerState, SlotPlayback, ROW_LEN};
pub use state::{EngineMessage, EngineSnapshot, SlotView, StateManager};
pub use theory::{
    apply_inversion, arpeggiate, build_chord, note_in_key, scale_notes, ArpeggioOrder, Chord,
    ChordModifier, MusicalKey, Note, PitchClass, ScaleDegree,
};
pub use timing::{Bpm, TransportTimer};
pub use transport::{DeferredTriggers, TransportScheduler};
pub use trigger::{LogTrigger, NoteTrigger, RecordingTrigger, TriggerRequest, TriggeredNotes};
