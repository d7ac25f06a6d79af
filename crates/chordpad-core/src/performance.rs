//! Live chord pad.
//!
//! Holds the player's current choices (key, octave, inversion, modifier, play
//! mode, arpeggio settings) and turns a pressed scale degree into a chord plus
//! the trigger requests that sound it.

use crate::sequencer::PlayMode;
use crate::theory::{arpeggiate, build_chord, ArpeggioOrder, Chord, ChordModifier, MusicalKey, Note, PitchClass, ScaleDegree};
use crate::timing::{clamp_secs, clamped_duration};
use crate::trigger::TriggerRequest;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MIN_OCTAVE: i32 = 2;
pub const MAX_OCTAVE: i32 = 6;
pub const MAX_INVERSION: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceSettings {
    pub key: MusicalKey,
    pub octave: i32,
    pub inversion: usize,
    pub modifier: ChordModifier,
    pub play_mode: PlayMode,
    pub arp_order: ArpeggioOrder,
    /// Delay between arpeggiated notes
    pub arp_speed_secs: f64,
    pub note_length_secs: f64,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            key: PitchClass::C,
            octave: 4,
            inversion: 0,
            modifier: ChordModifier::Triad,
            play_mode: PlayMode::Chord,
            arp_order: ArpeggioOrder::Up,
            arp_speed_secs: 0.15,
            note_length_secs: 0.5,
        }
    }
}

/// A chord sounded from the pad.
#[derive(Debug, Clone, PartialEq)]
pub struct PadPlay {
    pub chord: Chord,
    pub requests: Vec<TriggerRequest>,
}

impl PerformanceSettings {
    /// Bring loaded or hand-edited values back into range.
    pub fn normalized(mut self) -> Self {
        self.set_octave(self.octave);
        self.set_inversion(self.inversion);
        self.set_arp_speed(self.arp_speed_secs);
        self.set_note_length(self.note_length_secs);
        self
    }

    pub fn set_arp_speed(&mut self, secs: f64) {
        self.arp_speed_secs = clamp_secs(secs);
    }

    pub fn set_note_length(&mut self, secs: f64) {
        self.note_length_secs = clamp_secs(secs);
    }

    pub fn set_octave(&mut self, octave: i32) {
        self.octave = octave.clamp(MIN_OCTAVE, MAX_OCTAVE);
    }

    pub fn shift_octave(&mut self, delta: i32) -> i32 {
        self.set_octave(self.octave.saturating_add(delta));
        self.octave
    }

    pub fn set_inversion(&mut self, inversion: usize) {
        self.inversion = inversion.min(MAX_INVERSION);
    }

    pub fn shift_inversion(&mut self, delta: i32) -> usize {
        let shifted = (self.inversion as i64 + delta as i64).clamp(0, MAX_INVERSION as i64);
        self.inversion = shifted as usize;
        self.inversion
    }

    pub fn arp_speed(&self) -> Duration {
        clamped_duration(self.arp_speed_secs)
    }

    /// Chord for `degree` with the current key, modifier, octave and inversion.
    pub fn chord_for(&self, degree: ScaleDegree) -> Chord {
        build_chord(self.key, degree, self.modifier, self.octave).inverted(self.inversion)
    }

    /// Build the chord for `degree` and the requests that play it.
    pub fn play_degree<R: Rng + ?Sized>(&self, degree: ScaleDegree, rng: &mut R) -> PadPlay {
        let chord = self.chord_for(degree);
        let requests = match self.play_mode {
            PlayMode::Chord => TriggerRequest::simultaneous(chord.note_names(), self.note_length_secs),
            PlayMode::Arp => {
                let ordered = arpeggiate(chord.notes(), self.arp_order, rng);
                let names = ordered.iter().map(Note::to_string).collect();
                TriggerRequest::staggered(names, self.note_length_secs, self.arp_speed())
            }
        };
        PadPlay { chord, requests }
    }
}

/// Number keys `1`..`7` select degrees I..vii.
pub fn degree_for_key(key: char) -> Option<ScaleDegree> {
    let digit = key.to_digit(10)?;
    if (1..=7).contains(&digit) {
        Some(ScaleDegree::new(digit as i32 - 1))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_clamping() {
        let mut settings = PerformanceSettings::default();
        assert_eq!(settings.shift_octave(5), 6);
        assert_eq!(settings.shift_octave(-10), 2);
        assert_eq!(settings.shift_inversion(-1), 0);
        assert_eq!(settings.shift_inversion(7), 2);
        settings.set_inversion(9);
        assert_eq!(settings.inversion, 2);

        let loaded = PerformanceSettings {
            octave: 11,
            inversion: 5,
            ..Default::default()
        }
        .normalized();
        assert_eq!(loaded.octave, 6);
        assert_eq!(loaded.inversion, 2);
    }

    #[test]
    fn test_lengths_clamp_non_finite() {
        let loaded = PerformanceSettings {
            arp_speed_secs: f64::INFINITY,
            note_length_secs: f64::NAN,
            ..Default::default()
        }
        .normalized();
        assert_eq!(loaded.arp_speed_secs, 60.0);
        assert_eq!(loaded.note_length_secs, 0.0);

        // Fields set directly still produce a usable duration
        let raw = PerformanceSettings {
            play_mode: PlayMode::Arp,
            arp_speed_secs: f64::INFINITY,
            ..Default::default()
        };
        assert_eq!(raw.arp_speed(), Duration::from_secs(60));
        let play = raw.play_degree(ScaleDegree::TONIC, &mut StdRng::seed_from_u64(0));
        assert_eq!(play.requests.len(), 3);
    }

    #[test]
    fn test_chord_for_applies_inversion() {
        let settings = PerformanceSettings {
            key: PitchClass::G,
            inversion: 1,
            ..Default::default()
        };
        let chord = settings.chord_for(ScaleDegree::TONIC);
        assert_eq!(chord.note_names(), ["B4", "D4", "G5"]);
        assert_eq!(chord.label(), "G Major");
    }

    #[test]
    fn test_play_chord_mode() {
        let settings = PerformanceSettings::default();
        let play = settings.play_degree(ScaleDegree::new(4), &mut StdRng::seed_from_u64(0));
        assert_eq!(play.requests.len(), 1);
        assert_eq!(play.requests[0].notes, ["G4", "B4", "D4"]);
        assert!((play.requests[0].duration_secs - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_play_arp_mode() {
        let settings = PerformanceSettings {
            play_mode: PlayMode::Arp,
            arp_order: ArpeggioOrder::Down,
            ..Default::default()
        };
        let play = settings.play_degree(ScaleDegree::TONIC, &mut StdRng::seed_from_u64(0));
        let notes: Vec<&str> = play.requests.iter().map(|r| r.notes[0].as_str()).collect();
        assert_eq!(notes, ["G4", "E4", "C4"]);
        assert!((play.requests[2].offset.as_secs_f64() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_degree_for_key() {
        assert_eq!(degree_for_key('1'), Some(ScaleDegree::TONIC));
        assert_eq!(degree_for_key('7').map(ScaleDegree::index), Some(6));
        assert_eq!(degree_for_key('8'), None);
        assert_eq!(degree_for_key('0'), None);
        assert_eq!(degree_for_key('a'), None);
    }
}
