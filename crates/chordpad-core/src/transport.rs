//! Transport scheduler.
//!
//! The transport owns at most one [`TransportTimer`]; starting, stopping and
//! tempo changes replace it wholesale, so two drivers can never step the same
//! sequencer. Staggered arpeggio notes are parked in a [`DeferredTriggers`]
//! queue until their instant arrives, and stopping the transport cancels them.

use crate::timing::{Bpm, TransportTimer};
use crate::trigger::TriggerRequest;
use std::collections::BTreeMap;
use std::time::Instant;

/// Trigger requests waiting for their due instant.
#[derive(Debug, Default)]
pub struct DeferredTriggers {
    queue: BTreeMap<Instant, Vec<TriggerRequest>>,
}

impl DeferredTriggers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `requests` relative to `now`.
    ///
    /// Requests with a zero offset are not queued; they are handed back for the
    /// caller to fire right away.
    pub fn schedule(&mut self, requests: Vec<TriggerRequest>, now: Instant) -> Vec<TriggerRequest> {
        let mut immediate = Vec::new();
        for request in requests {
            if request.is_immediate() {
                immediate.push(request);
            } else {
                self.queue
                    .entry(now + request.offset)
                    .or_default()
                    .push(request);
            }
        }
        immediate
    }

    /// Remove and return every request due at or before `now`, oldest first.
    pub fn drain_due(&mut self, now: Instant) -> Vec<TriggerRequest> {
        let mut due = Vec::new();
        while let Some(entry) = self.queue.first_entry() {
            if *entry.key() > now {
                break;
            }
            due.extend(entry.remove());
        }
        due
    }

    /// Drop everything pending. Returns how many requests were cancelled.
    pub fn clear(&mut self) -> usize {
        let cancelled = self.len();
        self.queue.clear();
        cancelled
    }

    pub fn len(&self) -> usize {
        self.queue.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.queue.keys().next().copied()
    }
}

/// Periodic driver for sequencer stepping.
#[derive(Debug, Default)]
pub struct TransportScheduler {
    timer: Option<TransportTimer>,
    deferred: DeferredTriggers,
}

impl TransportScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Interval of the running timer.
    pub fn interval(&self) -> Option<std::time::Duration> {
        self.timer.as_ref().map(TransportTimer::interval)
    }

    /// Arm the timer; the first tick is due one beat after `now`.
    pub fn start(&mut self, bpm: Bpm, now: Instant) {
        self.timer = Some(TransportTimer::from_bpm(bpm, now));
        log::info!("Transport started at {bpm}");
    }

    /// Drop the timer and cancel every deferred trigger.
    pub fn stop(&mut self) {
        let was_running = self.timer.take().is_some();
        let cancelled = self.deferred.clear();
        if was_running || cancelled > 0 {
            log::info!("Transport stopped ({cancelled} pending triggers cancelled)");
        }
    }

    /// Restart the timer at the new tempo if the transport is running.
    pub fn set_bpm(&mut self, bpm: Bpm, now: Instant) {
        if self.timer.take().is_some() {
            self.timer = Some(TransportTimer::from_bpm(bpm, now));
            log::info!("Transport tempo changed to {bpm}");
        }
    }

    /// Whether a step is due at `now`. Always false while stopped.
    pub fn poll(&mut self, now: Instant) -> bool {
        self.timer.as_mut().is_some_and(|timer| timer.poll(now))
    }

    /// See [`DeferredTriggers::schedule`].
    pub fn defer(&mut self, requests: Vec<TriggerRequest>, now: Instant) -> Vec<TriggerRequest> {
        self.deferred.schedule(requests, now)
    }

    pub fn drain_due(&mut self, now: Instant) -> Vec<TriggerRequest> {
        self.deferred.drain_due(now)
    }

    pub fn pending(&self) -> usize {
        self.deferred.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn arp() -> Vec<TriggerRequest> {
        let notes = ["C4", "E4", "G4"].iter().map(|s| s.to_string()).collect();
        TriggerRequest::staggered(notes, 0.5, Duration::from_millis(100))
    }

    #[test]
    fn test_deferred_returns_immediate() {
        let now = Instant::now();
        let mut deferred = DeferredTriggers::new();
        let immediate = deferred.schedule(arp(), now);
        assert_eq!(immediate.len(), 1);
        assert_eq!(immediate[0].notes, ["C4"]);
        assert_eq!(deferred.len(), 2);
        assert_eq!(deferred.next_due(), Some(now + Duration::from_millis(100)));
    }

    #[test]
    fn test_deferred_drains_in_order() {
        let now = Instant::now();
        let mut deferred = DeferredTriggers::new();
        deferred.schedule(arp(), now);
        assert!(deferred.drain_due(now + Duration::from_millis(50)).is_empty());
        let due = deferred.drain_due(now + Duration::from_millis(250));
        let notes: Vec<&str> = due.iter().map(|r| r.notes[0].as_str()).collect();
        assert_eq!(notes, ["E4", "G4"]);
        assert!(deferred.is_empty());
    }

    #[test]
    fn test_start_and_poll() {
        let now = Instant::now();
        let mut transport = TransportScheduler::new();
        assert!(!transport.poll(now + Duration::from_secs(10)));

        transport.start(Bpm::new(120), now);
        assert!(transport.is_running());
        assert_eq!(transport.interval(), Some(Duration::from_millis(500)));
        assert!(!transport.poll(now + Duration::from_millis(400)));
        assert!(transport.poll(now + Duration::from_millis(500)));
        // Late by two beats: one step, not a burst
        assert!(transport.poll(now + Duration::from_millis(1500)));
        assert!(!transport.poll(now + Duration::from_millis(1500)));
    }

    #[test]
    fn test_stop_cancels_timer_and_deferred() {
        let now = Instant::now();
        let mut transport = TransportScheduler::new();
        transport.start(Bpm::new(120), now);
        transport.defer(arp(), now);
        assert_eq!(transport.pending(), 2);

        transport.stop();
        assert!(!transport.is_running());
        assert_eq!(transport.pending(), 0);
        assert!(!transport.poll(now + Duration::from_secs(5)));
        assert!(transport.drain_due(now + Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn test_set_bpm_replaces_timer() {
        let now = Instant::now();
        let mut transport = TransportScheduler::new();

        // Stopped: tempo change does not start anything
        transport.set_bpm(Bpm::new(60), now);
        assert!(!transport.is_running());

        transport.start(Bpm::new(120), now);
        let later = now + Duration::from_millis(300);
        transport.set_bpm(Bpm::new(60), later);
        assert_eq!(transport.interval(), Some(Duration::from_secs(1)));
        // The old 500ms deadline is gone; the new one is a full beat after the change
        assert!(!transport.poll(now + Duration::from_millis(600)));
        assert!(transport.poll(later + Duration::from_secs(1)));
    }
}
