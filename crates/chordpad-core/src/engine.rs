//! The engine ties the pad, sequencer, transport and metronome together.
//!
//! It is driven synchronously: [`Engine::handle_message`] applies one command
//! and [`Engine::tick`] advances the timers. Both take `now` so the engine can
//! be stepped with synthetic time. The runtime thread is the production
//! driver.

use crate::config::Config;
use crate::error::Result;
use crate::metronome::Metronome;
use crate::performance::PerformanceSettings;
use crate::sequencer::{SequencerState, SlotPlayback};
use crate::state::{EngineMessage, EngineSnapshot, SlotView, StateManager};
use crate::theory::Chord;
use crate::timing::Bpm;
use crate::transport::{DeferredTriggers, TransportScheduler};
use crate::trigger::{NoteTrigger, TriggerRequest};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::time::Instant;

pub struct Engine<T: NoteTrigger> {
    sequencer: SequencerState,
    transport: TransportScheduler,
    metronome: Metronome,
    pad: PerformanceSettings,
    /// Staggered pad notes. Independent of the transport, so stopping
    /// playback does not cut off a pad arpeggio.
    pad_deferred: DeferredTriggers,
    trigger: T,
    rng: Box<dyn RngCore + Send>,
    last_chord: Option<(String, Vec<String>)>,
    state: StateManager,
}

impl<T: NoteTrigger> Engine<T> {
    pub fn new(trigger: T, config: &Config) -> Self {
        Self::with_rng(trigger, config, StdRng::from_os_rng())
    }

    /// Use a specific random source for the random arpeggio order.
    pub fn with_rng(trigger: T, config: &Config, rng: impl RngCore + Send + 'static) -> Self {
        let engine = Self {
            sequencer: config.build_sequencer(),
            transport: TransportScheduler::new(),
            metronome: config.build_metronome(),
            pad: config.performance.clone().normalized(),
            pad_deferred: DeferredTriggers::new(),
            trigger,
            rng: Box::new(rng),
            last_chord: None,
            state: StateManager::new(),
        };
        engine.publish();
        engine
    }

    pub fn state_manager(&self) -> StateManager {
        self.state.clone()
    }

    pub fn sequencer(&self) -> &SequencerState {
        &self.sequencer
    }

    pub fn pad(&self) -> &PerformanceSettings {
        &self.pad
    }

    pub fn metronome(&self) -> &Metronome {
        &self.metronome
    }

    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    pub fn is_transport_running(&self) -> bool {
        self.transport.is_running()
    }

    /// Requests still waiting to fire (sequencer and pad).
    pub fn pending_triggers(&self) -> usize {
        self.transport.pending() + self.pad_deferred.len()
    }

    /// Apply one command and publish the resulting snapshot.
    ///
    /// A failing command leaves the engine unchanged.
    pub fn handle_message(&mut self, msg: EngineMessage, now: Instant) -> Result<()> {
        log::debug!("Engine message: {:?}", msg);
        let result = self.apply(msg, now);
        self.publish();
        result
    }

    fn apply(&mut self, msg: EngineMessage, now: Instant) -> Result<()> {
        match msg {
            // === Performance pad ===
            EngineMessage::PlayDegree { degree } => {
                let play = self.pad.play_degree(degree, &mut *self.rng);
                let immediate = self.pad_deferred.schedule(play.requests, now);
                self.fire(immediate);
                self.capture(&play.chord);
            }
            EngineMessage::SetKey { key } => self.pad.key = key,
            EngineMessage::SetModifier { modifier } => self.pad.modifier = modifier,
            EngineMessage::SetOctave { octave } => self.pad.set_octave(octave),
            EngineMessage::ShiftOctave { delta } => {
                self.pad.shift_octave(delta);
            }
            EngineMessage::SetInversion { inversion } => self.pad.set_inversion(inversion),
            EngineMessage::ShiftInversion { delta } => {
                self.pad.shift_inversion(delta);
            }
            EngineMessage::SetPlayMode { mode } => self.pad.play_mode = mode,
            EngineMessage::SetArpeggioOrder { order } => self.pad.arp_order = order,
            EngineMessage::SetArpSpeed { secs } => self.pad.set_arp_speed(secs),
            EngineMessage::SetNoteLength { secs } => self.pad.set_note_length(secs),

            // === Sequencer edits ===
            EngineMessage::ArmRecording { index } => {
                self.sequencer.arm_recording(index)?;
            }
            EngineMessage::CaptureChord { degree } => {
                let chord = self.pad.chord_for(degree);
                self.capture(&chord);
            }
            EngineMessage::SetRest { index } => self.sequencer.set_rest(index)?,
            EngineMessage::DeleteSlot { index } => self.sequencer.delete(index)?,
            EngineMessage::ToggleTie { index } => {
                self.sequencer.toggle_tie(index)?;
            }
            EngineMessage::CopySlot { index } => {
                self.sequencer.copy_slot(index)?;
            }
            EngineMessage::PasteSlot { index } => {
                self.sequencer.paste_slot(index)?;
            }
            EngineMessage::AddRow => self.sequencer.add_row(),
            EngineMessage::RemoveRow => {
                self.sequencer.remove_row();
            }
            EngineMessage::ClearSequencer => {
                self.stop_transport();
                self.sequencer.clear();
            }

            // === Sequencer playback ===
            EngineMessage::StartTransport => self.start_transport(now),
            EngineMessage::StopTransport => self.stop_transport(),
            EngineMessage::StepFirst => self.sequencer.step_first(),
            EngineMessage::StepNext => {
                if let Some(index) = self.sequencer.step_next() {
                    self.play_slot(index, now)?;
                }
            }
            EngineMessage::StepPrev => {
                if let Some(index) = self.sequencer.step_prev() {
                    self.play_slot(index, now)?;
                }
            }
            EngineMessage::PlaySlot { index } => self.play_slot(index, now)?,
            EngineMessage::SetSequencerBpm { bpm } => {
                self.sequencer.set_bpm(Bpm::new(bpm));
                self.transport.set_bpm(self.sequencer.bpm(), now);
            }
            EngineMessage::AdjustSequencerBpm { delta } => {
                let bpm = self.sequencer.adjust_bpm(delta);
                self.transport.set_bpm(bpm, now);
            }
            EngineMessage::SetLoopMode { enabled } => self.sequencer.set_loop_mode(enabled),
            EngineMessage::ToggleLoop => {
                self.sequencer.toggle_loop();
            }

            // === Metronome ===
            EngineMessage::StartMetronome => {
                if !self.metronome.is_running() {
                    let click = self.metronome.start(now);
                    self.fire(vec![click]);
                }
            }
            EngineMessage::StopMetronome => self.metronome.stop(),
            EngineMessage::SetMetronomeBpm { bpm } => self.metronome.set_bpm(Bpm::new(bpm), now),
            EngineMessage::SetBeatsPerMeasure { beats } => self.metronome.set_beats_per_measure(beats),
        }
        Ok(())
    }

    /// Advance timers to `now`: transport steps, due arpeggio notes and
    /// metronome clicks.
    pub fn tick(&mut self, now: Instant) {
        let mut changed = false;

        if self.transport.poll(now) {
            log::trace!("Transport tick");
            self.transport_tick(now);
            changed = true;
        }

        let due = self.transport.drain_due(now);
        self.fire(due);
        let due = self.pad_deferred.drain_due(now);
        self.fire(due);

        if let Some(click) = self.metronome.poll(now) {
            changed = true;
            self.fire(vec![click]);
        }

        if changed {
            self.publish();
        }
    }

    /// Start stepping at the sequencer tempo.
    ///
    /// From a reset cursor the first steppable slot plays immediately. With
    /// nothing to play the transport does not start.
    pub fn start_transport(&mut self, now: Instant) {
        if self.transport.is_running() {
            return;
        }
        if !self.sequencer.has_steppable() {
            log::warn!("Nothing to play; transport not started");
            return;
        }
        self.transport.start(self.sequencer.bpm(), now);
        if self.sequencer.playing_index().is_none() {
            if let Some(index) = self.sequencer.step_next() {
                self.play_checked(index, now);
            }
        }
    }

    /// Stop stepping and cancel pending sequencer triggers.
    pub fn stop_transport(&mut self) {
        self.transport.stop();
    }

    /// One transport step.
    ///
    /// Steps forward when a steppable slot follows the cursor, or when looping
    /// and anything is steppable; otherwise stops.
    pub fn transport_tick(&mut self, now: Instant) {
        let advance = match self.sequencer.playing_index() {
            Some(current) => {
                self.sequencer.has_steppable_after(current)
                    || (self.sequencer.loop_mode() && self.sequencer.has_steppable())
            }
            None => self.sequencer.has_steppable(),
        };
        if !advance {
            log::debug!("End of sequence");
            self.stop_transport();
            return;
        }
        if let Some(index) = self.sequencer.step_next() {
            self.play_checked(index, now);
        }
    }

    /// Stop everything and drop every pending trigger.
    pub fn shutdown(&mut self) {
        self.transport.stop();
        self.metronome.stop();
        let cancelled = self.pad_deferred.clear();
        if cancelled > 0 {
            log::debug!("Cancelled {cancelled} pending pad triggers");
        }
        self.publish();
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let (last_chord_label, last_chord_notes) = match &self.last_chord {
            Some((label, notes)) => (Some(label.clone()), notes.clone()),
            None => (None, Vec::new()),
        };
        EngineSnapshot {
            key: self.pad.key,
            octave: self.pad.octave,
            inversion: self.pad.inversion,
            modifier: self.pad.modifier,
            play_mode: self.pad.play_mode,
            arp_order: self.pad.arp_order,
            last_chord_label,
            last_chord_notes,
            slots: self.sequencer.slots().iter().map(SlotView::from).collect(),
            recording_index: self.sequencer.recording_index(),
            playing_index: self.sequencer.playing_index(),
            has_clipboard: self.sequencer.clipboard().is_some(),
            loop_mode: self.sequencer.loop_mode(),
            sequencer_bpm: self.sequencer.bpm().get(),
            transport_running: self.transport.is_running(),
            metronome_running: self.metronome.is_running(),
            metronome_bpm: self.metronome.bpm().get(),
            metronome_beat: self.metronome.current_beat(),
            beats_per_measure: self.metronome.beats_per_measure(),
            version: 0,
        }
    }

    fn publish(&self) {
        self.state.publish(self.snapshot());
    }

    /// Remember `chord` for display and write it into the armed slot, if any.
    fn capture(&mut self, chord: &Chord) {
        self.last_chord = Some((chord.label().to_string(), chord.pitch_names()));
        if let Some(index) = self
            .sequencer
            .capture_chord(chord, self.pad.octave, self.pad.play_mode)
        {
            log::info!("Recorded {} into slot {}", chord.label(), index);
        }
    }

    fn play_slot(&mut self, index: usize, now: Instant) -> Result<()> {
        match self.sequencer.play_slot(index)? {
            SlotPlayback::Trigger(requests) => {
                if let Some(filled) = self.sequencer.slot(index).and_then(|s| s.as_filled()) {
                    self.last_chord = Some((filled.label.clone(), filled.display_notes()));
                }
                let immediate = self.transport.defer(requests, now);
                self.fire(immediate);
            }
            SlotPlayback::Rest | SlotPlayback::Sustain | SlotPlayback::Silent => {}
        }
        Ok(())
    }

    /// Play a slot index the sequencer itself produced.
    fn play_checked(&mut self, index: usize, now: Instant) {
        if let Err(e) = self.play_slot(index, now) {
            log::warn!("Failed to play slot {index}: {e}");
        }
    }

    fn fire(&mut self, requests: Vec<TriggerRequest>) {
        for request in requests {
            self.trigger
                .trigger_notes(&request.notes, request.duration_secs);
        }
    }
}

impl<T: NoteTrigger> std::fmt::Debug for Engine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("sequencer", &self.sequencer)
            .field("transport", &self.transport)
            .field("metronome", &self.metronome)
            .field("pad", &self.pad)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::PlayMode;
    use crate::theory::{ArpeggioOrder, ChordModifier, PitchClass, ScaleDegree};
    use crate::trigger::RecordingTrigger;
    use std::time::Duration;

    fn engine() -> (Engine<RecordingTrigger>, RecordingTrigger) {
        let recorder = RecordingTrigger::new();
        let engine = Engine::with_rng(recorder.clone(), &Config::default(), StdRng::seed_from_u64(3));
        (engine, recorder)
    }

    fn send(engine: &mut Engine<RecordingTrigger>, msg: EngineMessage, now: Instant) {
        engine.handle_message(msg, now).unwrap();
    }

    fn record(engine: &mut Engine<RecordingTrigger>, index: usize, degree: i32, now: Instant) {
        send(engine, EngineMessage::ArmRecording { index }, now);
        send(
            engine,
            EngineMessage::CaptureChord {
                degree: ScaleDegree::new(degree),
            },
            now,
        );
    }

    #[test]
    fn test_play_degree_triggers_and_records() {
        let (mut engine, recorder) = engine();
        let now = Instant::now();
        send(&mut engine, EngineMessage::ArmRecording { index: 2 }, now);
        send(
            &mut engine,
            EngineMessage::PlayDegree {
                degree: ScaleDegree::new(3),
            },
            now,
        );

        let calls = recorder.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].pitches, ["F4", "A4", "C4"]);

        let snapshot = engine.state_manager().snapshot();
        assert_eq!(snapshot.last_chord_label.as_deref(), Some("F Major"));
        assert_eq!(snapshot.last_chord_notes, ["F", "A", "C"]);
        assert_eq!(snapshot.slots[2].label, "F Major");
        assert_eq!(snapshot.recording_index, None);
    }

    #[test]
    fn test_pad_arpeggio_is_deferred() {
        let (mut engine, recorder) = engine();
        let now = Instant::now();
        send(&mut engine, EngineMessage::SetPlayMode { mode: PlayMode::Arp }, now);
        send(&mut engine, EngineMessage::SetArpSpeed { secs: 0.2 }, now);
        send(
            &mut engine,
            EngineMessage::PlayDegree {
                degree: ScaleDegree::TONIC,
            },
            now,
        );
        assert_eq!(recorder.len(), 1);
        assert_eq!(engine.pending_triggers(), 2);

        engine.tick(now + Duration::from_millis(250));
        assert_eq!(recorder.len(), 2);
        engine.tick(now + Duration::from_millis(450));
        let notes: Vec<String> = recorder.calls().into_iter().map(|c| c.pitches[0].clone()).collect();
        assert_eq!(notes, ["C4", "E4", "G4"]);
    }

    #[test]
    fn test_infinite_arp_speed_is_clamped() {
        let (mut engine, recorder) = engine();
        let now = Instant::now();
        send(&mut engine, EngineMessage::SetPlayMode { mode: PlayMode::Arp }, now);
        send(&mut engine, EngineMessage::SetArpSpeed { secs: f64::INFINITY }, now);
        send(&mut engine, EngineMessage::SetNoteLength { secs: f64::NAN }, now);
        send(
            &mut engine,
            EngineMessage::PlayDegree {
                degree: ScaleDegree::TONIC,
            },
            now,
        );
        assert_eq!(engine.pad().arp_speed_secs, 60.0);
        assert_eq!(engine.pad().note_length_secs, 0.0);
        assert_eq!(recorder.len(), 1);
        assert_eq!(engine.pending_triggers(), 2);

        engine.tick(now + Duration::from_secs(60));
        assert_eq!(recorder.len(), 2);
    }

    #[test]
    fn test_random_arpeggio_is_reproducible_with_seed() {
        let now = Instant::now();
        let play = |seed| {
            let recorder = RecordingTrigger::new();
            let mut engine = Engine::with_rng(recorder.clone(), &Config::default(), StdRng::seed_from_u64(seed));
            engine
                .handle_message(EngineMessage::SetModifier { modifier: ChordModifier::Ninth }, now)
                .unwrap();
            engine
                .handle_message(EngineMessage::SetPlayMode { mode: PlayMode::Arp }, now)
                .unwrap();
            engine
                .handle_message(EngineMessage::SetArpeggioOrder { order: ArpeggioOrder::Random }, now)
                .unwrap();
            engine
                .handle_message(EngineMessage::PlayDegree { degree: ScaleDegree::TONIC }, now)
                .unwrap();
            engine.tick(now + Duration::from_secs(2));
            recorder.calls()
        };
        assert_eq!(play(11), play(11));
        assert_eq!(play(11).len(), 5);
    }

    #[test]
    fn test_transport_plays_then_stops_at_end() {
        let (mut engine, recorder) = engine();
        let now = Instant::now();
        record(&mut engine, 1, 0, now);
        record(&mut engine, 3, 4, now);
        assert!(recorder.is_empty());

        send(&mut engine, EngineMessage::StartTransport, now);
        assert!(engine.is_transport_running());
        assert_eq!(engine.sequencer().playing_index(), Some(1));
        assert_eq!(recorder.calls()[0].pitches, ["C4", "E4", "G4"]);

        engine.tick(now + Duration::from_millis(500));
        assert_eq!(engine.sequencer().playing_index(), Some(3));
        assert_eq!(recorder.calls()[1].pitches, ["G4", "B4", "D4"]);

        // Nothing follows slot 3 and loop is off
        engine.tick(now + Duration::from_millis(1000));
        assert!(!engine.is_transport_running());
        assert_eq!(recorder.len(), 2);
        assert!(!engine.state_manager().is_transport_running());
    }

    #[test]
    fn test_transport_loops() {
        let (mut engine, recorder) = engine();
        let now = Instant::now();
        record(&mut engine, 1, 0, now);
        record(&mut engine, 3, 4, now);
        send(&mut engine, EngineMessage::SetLoopMode { enabled: true }, now);
        send(&mut engine, EngineMessage::StartTransport, now);

        engine.tick(now + Duration::from_millis(500));
        engine.tick(now + Duration::from_millis(1000));
        assert!(engine.is_transport_running());
        assert_eq!(engine.sequencer().playing_index(), Some(1));
        assert_eq!(recorder.len(), 3);
    }

    #[test]
    fn test_late_tick_steps_once() {
        let (mut engine, recorder) = engine();
        let now = Instant::now();
        for i in 0..6 {
            record(&mut engine, i, i as i32, now);
        }
        send(&mut engine, EngineMessage::StartTransport, now);
        assert_eq!(recorder.len(), 1);

        let late = now + Duration::from_millis(2600);
        engine.tick(late);
        assert_eq!(recorder.len(), 2);
        assert_eq!(engine.sequencer().playing_index(), Some(1));

        // Next step one full beat after the late tick
        engine.tick(late + Duration::from_millis(400));
        assert_eq!(recorder.len(), 2);
        engine.tick(late + Duration::from_millis(500));
        assert_eq!(engine.sequencer().playing_index(), Some(2));
    }

    #[test]
    fn test_start_with_nothing_to_play() {
        let (mut engine, _) = engine();
        send(&mut engine, EngineMessage::StartTransport, Instant::now());
        assert!(!engine.is_transport_running());
    }

    #[test]
    fn test_tied_slots_sustain_during_playback() {
        let (mut engine, recorder) = engine();
        let now = Instant::now();
        for i in 0..3 {
            record(&mut engine, i, 0, now);
        }
        send(&mut engine, EngineMessage::ToggleTie { index: 0 }, now);
        send(&mut engine, EngineMessage::ToggleTie { index: 1 }, now);
        send(&mut engine, EngineMessage::StartTransport, now);
        engine.tick(now + Duration::from_millis(500));
        engine.tick(now + Duration::from_millis(1000));

        let calls = recorder.calls();
        assert_eq!(calls.len(), 1);
        assert!((calls[0].duration_secs - 1.5).abs() < 1e-9);
        assert_eq!(engine.sequencer().playing_index(), Some(2));
    }

    #[test]
    fn test_stop_cancels_sequencer_arpeggio() {
        let (mut engine, recorder) = engine();
        let now = Instant::now();
        send(&mut engine, EngineMessage::SetPlayMode { mode: PlayMode::Arp }, now);
        record(&mut engine, 0, 0, now);
        send(&mut engine, EngineMessage::StartTransport, now);
        assert_eq!(recorder.len(), 1);
        assert_eq!(engine.pending_triggers(), 2);

        send(&mut engine, EngineMessage::StopTransport, now);
        assert_eq!(engine.pending_triggers(), 0);
        engine.tick(now + Duration::from_secs(3));
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn test_tempo_change_while_running() {
        let (mut engine, _) = engine();
        let now = Instant::now();
        for i in 0..4 {
            record(&mut engine, i, i as i32, now);
        }
        send(&mut engine, EngineMessage::StartTransport, now);
        send(&mut engine, EngineMessage::SetSequencerBpm { bpm: 60 }, now);
        engine.tick(now + Duration::from_millis(600));
        assert_eq!(engine.sequencer().playing_index(), Some(0));
        engine.tick(now + Duration::from_millis(1000));
        assert_eq!(engine.sequencer().playing_index(), Some(1));
    }

    #[test]
    fn test_out_of_range_is_an_error() {
        let (mut engine, _) = engine();
        let now = Instant::now();
        let before = engine.state_manager().version();
        assert!(engine
            .handle_message(EngineMessage::SetRest { index: 40 }, now)
            .is_err());
        // A snapshot is still published
        assert_eq!(engine.state_manager().version(), before + 1);
        assert!(engine.sequencer().slots().iter().all(|s| s.is_empty()));
    }

    #[test]
    fn test_pad_settings_clamp() {
        let (mut engine, _) = engine();
        let now = Instant::now();
        send(&mut engine, EngineMessage::SetOctave { octave: 12 }, now);
        send(&mut engine, EngineMessage::ShiftInversion { delta: 5 }, now);
        send(&mut engine, EngineMessage::SetKey { key: PitchClass::A }, now);
        let snapshot = engine.state_manager().snapshot();
        assert_eq!(snapshot.octave, 6);
        assert_eq!(snapshot.inversion, 2);
        assert_eq!(snapshot.key, PitchClass::A);
    }

    #[test]
    fn test_metronome_clicks() {
        let (mut engine, recorder) = engine();
        let now = Instant::now();
        send(&mut engine, EngineMessage::SetBeatsPerMeasure { beats: 3 }, now);
        send(&mut engine, EngineMessage::StartMetronome, now);
        for ms in [500, 1000, 1500] {
            engine.tick(now + Duration::from_millis(ms));
        }
        let notes: Vec<String> = recorder.calls().into_iter().map(|c| c.pitches[0].clone()).collect();
        assert_eq!(notes, ["C5", "C4", "C4", "C5"]);

        engine.shutdown();
        assert!(!engine.metronome().is_running());
        assert!(!engine.state_manager().snapshot().metronome_running);
    }

    #[test]
    fn test_clear_stops_and_drops_extra_rows() {
        let (mut engine, _) = engine();
        let now = Instant::now();
        send(&mut engine, EngineMessage::AddRow, now);
        record(&mut engine, 9, 2, now);
        send(&mut engine, EngineMessage::StartTransport, now);
        send(&mut engine, EngineMessage::ClearSequencer, now);
        let snapshot = engine.state_manager().snapshot();
        assert!(!snapshot.transport_running);
        assert_eq!(snapshot.row_count(), 1);
        assert_eq!(snapshot.playing_index, None);
        assert!(snapshot.slot_labels().iter().all(|l| l.is_empty()));
    }
}
