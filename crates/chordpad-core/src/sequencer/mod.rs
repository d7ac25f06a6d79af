//! Step sequencer.
//!
//! Slots come in rows of [`ROW_LEN`]. A slot is empty, a rest, or a captured
//! chord that may be tied into the next slot. The playing cursor only stops on
//! rests and chords.

mod slot;
mod state;

pub use slot::{FilledSlot, PlayMode, SequencerSlot, REST_LABEL};
pub use state::{SequencerState, SlotPlayback, DEFAULT_ARP_STAGGER};

/// Slots per sequencer row.
pub const ROW_LEN: usize = 8;
