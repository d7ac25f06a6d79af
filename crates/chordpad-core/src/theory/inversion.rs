use super::pitch::Note;

/// Apply inversion `k` to a chord voicing.
///
/// Repeats `k mod n` times: take the first note off the front and append it
/// again one octave higher. Each displaced note keeps its own octave plus one,
/// independent of the others.
pub fn apply_inversion(notes: &[Note], k: usize) -> Vec<Note> {
    if k == 0 || notes.is_empty() {
        return notes.to_vec();
    }

    let split = k % notes.len();
    let (moved, kept) = notes.split_at(split);
    kept.iter()
        .copied()
        .chain(moved.iter().map(|n| n.octave_up()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::chord::{build_chord, ChordModifier};
    use crate::theory::pitch::PitchClass;
    use crate::theory::scale::ScaleDegree;

    fn parse(names: &[&str]) -> Vec<Note> {
        names.iter().map(|n| n.parse().unwrap()).collect()
    }

    #[test]
    fn test_zero_is_identity() {
        let notes = parse(&["C4", "E4", "G4"]);
        assert_eq!(apply_inversion(&notes, 0), notes);
        assert!(apply_inversion(&[], 3).is_empty());
    }

    #[test]
    fn test_first_and_second_inversion() {
        let notes = parse(&["C4", "E4", "G4"]);
        assert_eq!(apply_inversion(&notes, 1), parse(&["E4", "G4", "C5"]));
        assert_eq!(apply_inversion(&notes, 2), parse(&["G4", "C5", "E5"]));
    }

    #[test]
    fn test_large_k_reduces_mod_len() {
        let notes = parse(&["C4", "E4", "G4"]);
        assert_eq!(apply_inversion(&notes, 4), apply_inversion(&notes, 1));
        // A full cycle keeps the order and does not bump any octave
        assert_eq!(apply_inversion(&notes, 3), notes);
    }

    #[test]
    fn test_displaced_note_keeps_its_own_octave() {
        let notes = parse(&["D5", "F3", "A3"]);
        assert_eq!(apply_inversion(&notes, 1), parse(&["F3", "A3", "D6"]));
    }

    #[test]
    fn test_inversion_is_cyclic_over_pitch_classes() {
        for modifier in ChordModifier::ALL {
            for degree in ScaleDegree::all() {
                let chord = build_chord(PitchClass::E, degree, modifier, 4);
                let notes = chord.notes();
                let n = notes.len();
                for k in 0..(2 * n + 1) {
                    let inverted = apply_inversion(notes, k);
                    let restored = apply_inversion(&inverted, (n - k % n) % n);
                    let restored_pcs: Vec<PitchClass> = restored.iter().map(|n| n.pitch).collect();
                    assert_eq!(restored_pcs, chord.pitch_classes(), "{modifier} k={k}");
                }
            }
        }
    }
}
