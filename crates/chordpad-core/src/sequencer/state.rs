use super::slot::{FilledSlot, PlayMode, SequencerSlot};
use super::ROW_LEN;
use crate::error::{Error, Result};
use crate::theory::Chord;
use crate::timing::Bpm;
use crate::trigger::TriggerRequest;
use std::time::Duration;

/// Default delay between arpeggiated notes in sequencer playback.
pub const DEFAULT_ARP_STAGGER: Duration = Duration::from_millis(100);

/// What playing a slot produced.
#[derive(Clone, Debug, PartialEq)]
pub enum SlotPlayback {
    /// Empty slot; nothing happened and the cursor did not move.
    Silent,
    /// Rest slot; the cursor moved, nothing sounds.
    Rest,
    /// Tied from the previous slot; the earlier trigger keeps sounding.
    Sustain,
    /// New attack.
    Trigger(Vec<TriggerRequest>),
}

/// The step sequencer.
///
/// Index-taking operations fail with [`Error::SlotOutOfRange`] and leave the
/// state untouched when the index is past the end.
#[derive(Clone, Debug)]
pub struct SequencerState {
    slots: Vec<SequencerSlot>,
    recording_index: Option<usize>,
    playing_index: Option<usize>,
    loop_mode: bool,
    bpm: Bpm,
    arp_stagger: Duration,
    clipboard: Option<SequencerSlot>,
}

impl Default for SequencerState {
    fn default() -> Self {
        Self::new()
    }
}

impl SequencerState {
    /// One row of empty slots at the default tempo.
    pub fn new() -> Self {
        Self::with_rows(1)
    }

    /// `rows` rows of empty slots (at least one).
    pub fn with_rows(rows: usize) -> Self {
        Self {
            slots: vec![SequencerSlot::Empty; rows.max(1) * ROW_LEN],
            recording_index: None,
            playing_index: None,
            loop_mode: false,
            bpm: Bpm::DEFAULT,
            arp_stagger: DEFAULT_ARP_STAGGER,
            clipboard: None,
        }
    }

    // === Accessors ===

    pub fn slots(&self) -> &[SequencerSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&SequencerSlot> {
        self.slots.get(index)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Never true: there is always at least one row.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.slots.len() / ROW_LEN
    }

    pub fn rows(&self) -> impl Iterator<Item = &[SequencerSlot]> {
        self.slots.chunks(ROW_LEN)
    }

    pub fn recording_index(&self) -> Option<usize> {
        self.recording_index
    }

    pub fn playing_index(&self) -> Option<usize> {
        self.playing_index
    }

    pub fn loop_mode(&self) -> bool {
        self.loop_mode
    }

    pub fn bpm(&self) -> Bpm {
        self.bpm
    }

    pub fn arp_stagger(&self) -> Duration {
        self.arp_stagger
    }

    pub fn clipboard(&self) -> Option<&SequencerSlot> {
        self.clipboard.as_ref()
    }

    fn check(&self, index: usize) -> Result<()> {
        if index < self.slots.len() {
            Ok(())
        } else {
            Err(Error::SlotOutOfRange {
                index,
                len: self.slots.len(),
            })
        }
    }

    // === Recording ===

    /// Arm slot `index` for capture, or disarm it if it is already armed.
    ///
    /// Returns the armed index after the toggle.
    pub fn arm_recording(&mut self, index: usize) -> Result<Option<usize>> {
        self.check(index)?;
        self.recording_index = if self.recording_index == Some(index) {
            None
        } else {
            Some(index)
        };
        log::debug!("Recording armed at {:?}", self.recording_index);
        Ok(self.recording_index)
    }

    pub fn disarm_recording(&mut self) {
        self.recording_index = None;
    }

    /// Write `chord` into the armed slot and disarm. No-op when nothing is armed.
    pub fn capture_chord(&mut self, chord: &Chord, octave: i32, play_mode: PlayMode) -> Option<usize> {
        let index = self.recording_index.take()?;
        self.slots[index] = SequencerSlot::Filled(FilledSlot::from_chord(chord, octave, play_mode));
        log::debug!("Captured {} into slot {}", chord.label(), index);
        Some(index)
    }

    // === Slot edits ===

    pub fn set_rest(&mut self, index: usize) -> Result<()> {
        self.check(index)?;
        self.slots[index] = SequencerSlot::Rest;
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> Result<()> {
        self.check(index)?;
        self.slots[index] = SequencerSlot::Empty;
        Ok(())
    }

    /// Flip the tie flag of a filled slot and return the new value.
    ///
    /// Empty and rest slots cannot carry a tie; they are left alone and `false`
    /// is returned. The next slot is not checked, see [`Self::can_tie`].
    pub fn toggle_tie(&mut self, index: usize) -> Result<bool> {
        self.check(index)?;
        match &mut self.slots[index] {
            SequencerSlot::Filled(filled) => {
                filled.tied = !filled.tied;
                Ok(filled.tied)
            }
            _ => Ok(false),
        }
    }

    /// Whether a tie from `index` into the next slot makes musical sense: the
    /// slot is filled and the next slot exists with the same label.
    pub fn can_tie(&self, index: usize) -> Result<bool> {
        self.check(index)?;
        let (Some(current), Some(next)) = (self.slots[index].as_filled(), self.slots.get(index + 1)) else {
            return Ok(false);
        };
        Ok(!next.is_rest() && next.label() == current.label)
    }

    /// Put a copy of a filled slot on the clipboard. Returns false for empty
    /// and rest slots.
    pub fn copy_slot(&mut self, index: usize) -> Result<bool> {
        self.check(index)?;
        if self.slots[index].as_filled().is_none() {
            return Ok(false);
        }
        self.clipboard = Some(self.slots[index].clone());
        Ok(true)
    }

    /// Write the clipboard into `index`, emptying the clipboard.
    pub fn paste_slot(&mut self, index: usize) -> Result<bool> {
        self.check(index)?;
        match self.clipboard.take() {
            Some(slot) => {
                self.slots[index] = slot;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // === Rows ===

    pub fn add_row(&mut self) {
        self.slots
            .extend(std::iter::repeat(SequencerSlot::Empty).take(ROW_LEN));
        log::debug!("Added row, now {} rows", self.row_count());
    }

    /// Drop the last row. Refused when only one row is left.
    pub fn remove_row(&mut self) -> bool {
        if self.row_count() <= 1 {
            log::warn!("Refusing to remove the last sequencer row");
            return false;
        }
        let new_len = self.slots.len() - ROW_LEN;
        self.slots.truncate(new_len);
        if self.recording_index.is_some_and(|i| i >= new_len) {
            self.recording_index = None;
        }
        if self.playing_index.is_some_and(|i| i >= new_len) {
            self.playing_index = None;
        }
        log::debug!("Removed row, now {} rows", self.row_count());
        true
    }

    /// Back to a single row of empty slots with both cursors cleared.
    pub fn clear(&mut self) {
        self.slots.truncate(ROW_LEN);
        self.slots.fill(SequencerSlot::Empty);
        self.recording_index = None;
        self.playing_index = None;
    }

    // === Tempo and loop ===

    pub fn set_bpm(&mut self, bpm: Bpm) {
        self.bpm = bpm;
    }

    pub fn adjust_bpm(&mut self, delta: i32) -> Bpm {
        self.bpm = self.bpm.adjust(delta);
        self.bpm
    }

    pub fn set_loop_mode(&mut self, enabled: bool) {
        self.loop_mode = enabled;
    }

    pub fn toggle_loop(&mut self) -> bool {
        self.loop_mode = !self.loop_mode;
        self.loop_mode
    }

    pub fn set_arp_stagger(&mut self, stagger: Duration) {
        self.arp_stagger = stagger;
    }

    // === Stepping ===

    /// Reset the playing cursor to "before the start".
    pub fn step_first(&mut self) {
        self.playing_index = None;
    }

    pub fn has_steppable(&self) -> bool {
        self.slots.iter().any(SequencerSlot::is_steppable)
    }

    /// Whether any steppable slot comes strictly after `index`.
    pub fn has_steppable_after(&self, index: usize) -> bool {
        self.slots
            .iter()
            .skip(index + 1)
            .any(SequencerSlot::is_steppable)
    }

    pub fn first_steppable(&self) -> Option<usize> {
        self.slots.iter().position(SequencerSlot::is_steppable)
    }

    pub fn last_steppable(&self) -> Option<usize> {
        self.slots.iter().rposition(SequencerSlot::is_steppable)
    }

    /// Move the playing cursor to the next steppable slot, wrapping.
    ///
    /// From no cursor this is the first steppable slot. Only the cursor moves;
    /// call [`Self::play_slot`] to produce sound.
    pub fn step_next(&mut self) -> Option<usize> {
        let len = self.slots.len();
        self.playing_index = match self.playing_index {
            None => self.first_steppable(),
            Some(current) => (1..=len)
                .map(|step| (current + step) % len)
                .find(|&i| self.slots[i].is_steppable()),
        };
        self.playing_index
    }

    /// Move the playing cursor to the previous steppable slot, wrapping.
    pub fn step_prev(&mut self) -> Option<usize> {
        let len = self.slots.len();
        self.playing_index = match self.playing_index {
            None => self.last_steppable(),
            Some(current) => (1..=len)
                .map(|step| (current + len - step % len) % len)
                .find(|&i| self.slots[i].is_steppable()),
        };
        self.playing_index
    }

    // === Playback ===

    /// Whether slot `index` continues a tie from the slot before it.
    pub fn is_tied_from_previous(&self, index: usize) -> bool {
        index > 0
            && index < self.slots.len()
            && self.slots[index - 1].is_tied()
            && self.slots[index - 1].label() == self.slots[index].label()
    }

    /// Number of slots sounded by a trigger at `index`: 1, plus the following
    /// same-label slots reached through unbroken ties.
    pub fn tie_chain_len(&self, index: usize) -> Result<usize> {
        self.check(index)?;
        let slot = &self.slots[index];
        if !slot.is_tied() {
            return Ok(1);
        }
        let label = slot.label();
        let mut count = 1;
        let mut next = index + 1;
        while next < self.slots.len()
            && self.slots[next].label() == label
            && self.slots[next - 1].is_tied()
        {
            count += 1;
            next += 1;
        }
        Ok(count)
    }

    /// Make `index` the current slot and compute what it sounds like.
    ///
    /// Playback uses the slot's stored octave and play mode.
    pub fn play_slot(&mut self, index: usize) -> Result<SlotPlayback> {
        self.check(index)?;
        let filled = match &self.slots[index] {
            SequencerSlot::Empty => return Ok(SlotPlayback::Silent),
            SequencerSlot::Rest => {
                self.playing_index = Some(index);
                return Ok(SlotPlayback::Rest);
            }
            SequencerSlot::Filled(filled) => filled,
        };

        if self.is_tied_from_previous(index) {
            self.playing_index = Some(index);
            return Ok(SlotPlayback::Sustain);
        }

        let duration = self.bpm.beat_seconds() * self.tie_chain_len(index)? as f64;
        let notes = filled.note_names();
        let requests = match filled.play_mode {
            PlayMode::Chord => TriggerRequest::simultaneous(notes, duration),
            PlayMode::Arp => TriggerRequest::staggered(notes, duration, self.arp_stagger),
        };
        self.playing_index = Some(index);
        Ok(SlotPlayback::Trigger(requests))
    }
}
