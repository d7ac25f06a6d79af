//! Click track with its own tempo, independent of the sequencer.

use crate::timing::{Bpm, TransportTimer};
use crate::trigger::TriggerRequest;
use std::time::Instant;

/// Pitch of the first click in a measure.
pub const ACCENT_NOTE: &str = "C5";
/// Pitch of every other click.
pub const CLICK_NOTE: &str = "C4";

pub const DEFAULT_BEATS_PER_MEASURE: u32 = 4;

#[derive(Debug)]
pub struct Metronome {
    bpm: Bpm,
    beats_per_measure: u32,
    current_beat: u32,
    timer: Option<TransportTimer>,
}

impl Default for Metronome {
    fn default() -> Self {
        Self::new(Bpm::DEFAULT, DEFAULT_BEATS_PER_MEASURE)
    }
}

impl Metronome {
    pub fn new(bpm: Bpm, beats_per_measure: u32) -> Self {
        Self {
            bpm,
            beats_per_measure: normalize_beats(beats_per_measure),
            current_beat: 0,
            timer: None,
        }
    }

    pub fn bpm(&self) -> Bpm {
        self.bpm
    }

    pub fn beats_per_measure(&self) -> u32 {
        self.beats_per_measure
    }

    /// Position of the last click within the measure (0 = downbeat).
    pub fn current_beat(&self) -> u32 {
        self.current_beat
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Start clicking. The downbeat sounds immediately and is returned.
    pub fn start(&mut self, now: Instant) -> TriggerRequest {
        self.current_beat = 0;
        self.timer = Some(TransportTimer::from_bpm(self.bpm, now));
        log::info!("Metronome started at {}", self.bpm);
        self.click()
    }

    pub fn stop(&mut self) {
        if self.timer.take().is_some() {
            log::info!("Metronome stopped");
        }
        self.current_beat = 0;
    }

    /// Change tempo; a running metronome restarts its timer from `now`.
    pub fn set_bpm(&mut self, bpm: Bpm, now: Instant) {
        self.bpm = bpm;
        if self.timer.is_some() {
            self.timer = Some(TransportTimer::from_bpm(bpm, now));
        }
    }

    /// Values outside 3..=6 fall back to 4.
    pub fn set_beats_per_measure(&mut self, beats: u32) {
        self.beats_per_measure = normalize_beats(beats);
        if self.current_beat >= self.beats_per_measure {
            self.current_beat = 0;
        }
    }

    /// The click due at `now`, if any.
    pub fn poll(&mut self, now: Instant) -> Option<TriggerRequest> {
        if !self.timer.as_mut()?.poll(now) {
            return None;
        }
        self.current_beat = (self.current_beat + 1) % self.beats_per_measure;
        Some(self.click())
    }

    fn click(&self) -> TriggerRequest {
        let note = if self.current_beat == 0 {
            ACCENT_NOTE
        } else {
            CLICK_NOTE
        };
        // A 32nd note
        let duration = self.bpm.beat_seconds() / 8.0;
        log::trace!("Metronome beat {} ({note})", self.current_beat);
        TriggerRequest::now(vec![note.to_string()], duration)
    }
}

fn normalize_beats(beats: u32) -> u32 {
    if (3..=6).contains(&beats) {
        beats
    } else {
        DEFAULT_BEATS_PER_MEASURE
    }
}
