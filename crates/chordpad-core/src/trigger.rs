//! The note trigger capability.
//!
//! chordpad never makes sound itself. Whatever owns the engine supplies a
//! [`NoteTrigger`], and the engine calls it with note names in playback form
//! (`"C#4"`) and a duration in seconds. Staggered arpeggio notes are delayed by
//! the engine, so an implementation only ever sees "play these now".

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Fire-and-forget sink for note events.
pub trait NoteTrigger: Send {
    fn trigger_notes(&mut self, pitches: &[String], duration_secs: f64);
}

impl<T: NoteTrigger + ?Sized> NoteTrigger for Box<T> {
    fn trigger_notes(&mut self, pitches: &[String], duration_secs: f64) {
        (**self).trigger_notes(pitches, duration_secs)
    }
}

/// A trigger call computed by the core, to be fired `offset` after the moment
/// it was produced.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerRequest {
    pub notes: Vec<String>,
    pub duration_secs: f64,
    pub offset: Duration,
}

impl TriggerRequest {
    pub fn now(notes: Vec<String>, duration_secs: f64) -> Self {
        Self {
            notes,
            duration_secs,
            offset: Duration::ZERO,
        }
    }

    /// One request holding every note, fired immediately.
    pub fn simultaneous(notes: Vec<String>, duration_secs: f64) -> Vec<Self> {
        vec![Self::now(notes, duration_secs)]
    }

    /// One request per note, the i-th fired `i * stagger` later.
    pub fn staggered(notes: Vec<String>, duration_secs: f64, stagger: Duration) -> Vec<Self> {
        notes
            .into_iter()
            .enumerate()
            .map(|(i, note)| Self {
                notes: vec![note],
                duration_secs,
                offset: stagger * i as u32,
            })
            .collect()
    }

    pub fn is_immediate(&self) -> bool {
        self.offset.is_zero()
    }
}

/// Logs every trigger at info level.
#[derive(Debug, Default)]
pub struct LogTrigger;

impl NoteTrigger for LogTrigger {
    fn trigger_notes(&mut self, pitches: &[String], duration_secs: f64) {
        log::info!("Trigger {} for {:.3}s", pitches.join(" "), duration_secs);
    }
}

/// One recorded trigger call.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggeredNotes {
    pub pitches: Vec<String>,
    pub duration_secs: f64,
}

/// Collects trigger calls into a shared list.
///
/// Clones share the same list, so one clone can be handed to the runtime
/// thread while another is inspected.
#[derive(Clone, Debug, Default)]
pub struct RecordingTrigger {
    calls: Arc<Mutex<Vec<TriggeredNotes>>>,
}

impl RecordingTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every call recorded so far.
    pub fn calls(&self) -> Vec<TriggeredNotes> {
        self.calls.lock().expect("Trigger lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().expect("Trigger lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.calls.lock().expect("Trigger lock poisoned").clear();
    }
}

impl NoteTrigger for RecordingTrigger {
    fn trigger_notes(&mut self, pitches: &[String], duration_secs: f64) {
        self.calls
            .lock()
            .expect("Trigger lock poisoned")
            .push(TriggeredNotes {
                pitches: pitches.to_vec(),
                duration_secs,
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(notes: &[&str]) -> Vec<String> {
        notes.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_staggered_offsets() {
        let reqs = TriggerRequest::staggered(names(&["C4", "E4", "G4"]), 0.5, Duration::from_millis(100));
        assert_eq!(reqs.len(), 3);
        assert_eq!(reqs[0].offset, Duration::ZERO);
        assert_eq!(reqs[2].offset, Duration::from_millis(200));
        assert_eq!(reqs[1].notes, ["E4"]);
        assert!(reqs[0].is_immediate());
        assert!(!reqs[1].is_immediate());
    }

    #[test]
    fn test_simultaneous() {
        let reqs = TriggerRequest::simultaneous(names(&["C4", "E4"]), 1.0);
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].notes, ["C4", "E4"]);
    }

    #[test]
    fn test_recording_trigger_shares_calls() {
        let recorder = RecordingTrigger::new();
        let mut boxed: Box<dyn NoteTrigger> = Box::new(recorder.clone());
        boxed.trigger_notes(&names(&["A4"]), 0.25);
        assert_eq!(recorder.len(), 1);
        assert_eq!(recorder.calls()[0].pitches, ["A4"]);
        recorder.clear();
        assert!(recorder.is_empty());
    }
}
