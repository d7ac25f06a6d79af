//! Timing primitives for the transport and metronome.
//!
//! - [`Bpm`] - Tempo, clamped to the playable range at every mutation point
//! - [`TransportTimer`] - Deadline-driven periodic timer polled with `Instant`s
//!
//! Nothing here reads the clock; callers pass `now` in, so tests can advance
//! time synthetically.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Upper bound for note lengths and arpeggio gaps, in seconds.
pub const MAX_NOTE_SECS: f64 = 60.0;

/// Clamp a user-supplied length to `[0, MAX_NOTE_SECS]`. NaN becomes 0.
pub fn clamp_secs(secs: f64) -> f64 {
    if secs.is_nan() {
        0.0
    } else {
        secs.clamp(0.0, MAX_NOTE_SECS)
    }
}

/// [`clamp_secs`] as a `Duration`.
pub fn clamped_duration(secs: f64) -> Duration {
    Duration::from_secs_f64(clamp_secs(secs))
}

/// Tempo in beats per minute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Bpm(u32);

impl Bpm {
    pub const MIN: u32 = 40;
    pub const MAX: u32 = 240;
    pub const DEFAULT: Bpm = Bpm(120);

    /// Create a tempo, clamped to `[MIN, MAX]`.
    pub fn new(bpm: u32) -> Self {
        Self(bpm.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Tempo moved by `delta`, clamped.
    pub fn adjust(self, delta: i32) -> Self {
        let raw = (self.0 as i64 + delta as i64).clamp(Self::MIN as i64, Self::MAX as i64);
        Self(raw as u32)
    }

    /// Length of one beat in seconds (`60 / bpm`).
    pub fn beat_seconds(self) -> f64 {
        60.0 / self.0 as f64
    }

    /// Transport step interval (`60000 / bpm` milliseconds).
    pub fn beat_interval(self) -> Duration {
        Duration::from_secs_f64(self.beat_seconds())
    }
}

impl Default for Bpm {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for Bpm {
    fn from(value: u32) -> Self {
        Bpm::new(value)
    }
}

impl From<Bpm> for u32 {
    fn from(bpm: Bpm) -> Self {
        bpm.0
    }
}

impl fmt::Display for Bpm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.0)
    }
}

/// A periodic deadline.
///
/// The first tick is due one interval after creation. A poll fires at most one
/// tick. Polls that are only slightly late keep the original grid; after a
/// stall of a whole interval or more the grid restarts from `now` and the
/// missed ticks are dropped.
#[derive(Clone, Debug)]
pub struct TransportTimer {
    interval: Duration,
    next_due: Instant,
}

impl TransportTimer {
    pub fn new(interval: Duration, now: Instant) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        Self {
            interval,
            next_due: now + interval,
        }
    }

    pub fn from_bpm(bpm: Bpm, now: Instant) -> Self {
        Self::new(bpm.beat_interval(), now)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    /// Whether a tick is due at `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due += self.interval;
        if now >= self.next_due {
            log::debug!("Timer fell behind by {:?}; re-anchoring", now - self.next_due);
            self.next_due = now + self.interval;
        }
        true
    }
}
