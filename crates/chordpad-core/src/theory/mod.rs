//! Music theory: pitch classes, the major scale, chords, inversions and
//! arpeggio orderings. Everything here is pure and allocation-light.

pub mod arpeggio;
pub mod chord;
pub mod inversion;
pub mod pitch;
pub mod scale;

pub use arpeggio::{arpeggiate, ArpeggioOrder};
pub use chord::{build_chord, chord_label, Chord, ChordModifier};
pub use inversion::apply_inversion;
pub use pitch::{MusicalKey, Note, PitchClass};
pub use scale::{degree_of, is_in_scale, note_in_key, scale_notes, ScaleDegree, MAJOR_SCALE_INTERVALS};
