//! Arpeggio orderings over a chord's notes.

use super::pitch::Note;
use crate::error::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArpeggioOrder {
    #[default]
    Up,
    Down,
    UpDown,
    Random,
}

impl ArpeggioOrder {
    pub const ALL: [ArpeggioOrder; 4] = [
        ArpeggioOrder::Up,
        ArpeggioOrder::Down,
        ArpeggioOrder::UpDown,
        ArpeggioOrder::Random,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::UpDown => "up-down",
            Self::Random => "random",
        }
    }
}

impl fmt::Display for ArpeggioOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ArpeggioOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "up-down" | "updown" | "up_down" => Ok(Self::UpDown),
            "random" => Ok(Self::Random),
            _ => Err(Error::InvalidArpeggioOrder(s.to_string())),
        }
    }
}

/// Order `notes` for arpeggiation.
///
/// `Random` draws a fresh permutation from `rng` on every call; the other
/// orders ignore it.
pub fn arpeggiate<R: Rng + ?Sized>(notes: &[Note], order: ArpeggioOrder, rng: &mut R) -> Vec<Note> {
    match order {
        ArpeggioOrder::Up => ascending(notes),
        ArpeggioOrder::Down => {
            let mut down = ascending(notes);
            down.reverse();
            down
        }
        ArpeggioOrder::UpDown => {
            let up = ascending(notes);
            let descent = up.iter().rev().skip(1).copied().collect::<Vec<_>>();
            let mut seq = up;
            // The peak appears once: the descent starts below it
            seq.extend(descent);
            seq
        }
        ArpeggioOrder::Random => {
            let mut shuffled = notes.to_vec();
            shuffled.shuffle(rng);
            shuffled
        }
    }
}

fn ascending(notes: &[Note]) -> Vec<Note> {
    let mut up = notes.to_vec();
    // sort_by_key is stable, so equal pitches keep their chord order
    up.sort_by_key(|n| n.semitone());
    up
}
