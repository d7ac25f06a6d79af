//! Chord progression notation for the `play` command.
//!
//! A progression is a whitespace-separated list of steps:
//!
//! - `4` or `IV` - the chord on that degree, with the default modifier
//! - `5:dom7` - with an explicit modifier
//! - `1~` - tied into the next step
//! - `-` - a rest

use chordpad_core::{ChordModifier, EngineMessage, Error, Result, RuntimeHandle, ScaleDegree, ROW_LEN};

/// One parsed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Rest,
    Chord {
        degree: ScaleDegree,
        modifier: Option<ChordModifier>,
        tied: bool,
    },
}

impl std::str::FromStr for Step {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self> {
        let token = token.trim();
        if token == "-" {
            return Ok(Step::Rest);
        }
        let (body, tied) = match token.strip_suffix('~') {
            Some(body) => (body, true),
            None => (token, false),
        };
        let (degree, modifier) = match body.split_once(':') {
            Some((degree, modifier)) => (degree, Some(ChordModifier::from_name(modifier))),
            None => (body, None),
        };
        Ok(Step::Chord {
            degree: degree.parse()?,
            modifier,
            tied,
        })
    }
}

pub fn parse_progression(text: &str) -> Result<Vec<Step>> {
    text.split_whitespace().map(str::parse).collect()
}

/// Rows needed to hold `steps` steps.
pub fn rows_needed(steps: usize) -> usize {
    steps.div_ceil(ROW_LEN).max(1)
}

/// Write `steps` into the sequencer from slot 0, growing it as needed.
///
/// Chords are captured with the pad's current key, octave and play mode.
pub fn load_into(
    handle: &RuntimeHandle,
    steps: &[Step],
    current_rows: usize,
    default_modifier: ChordModifier,
) -> Result<()> {
    for _ in current_rows..rows_needed(steps.len()) {
        handle.send(EngineMessage::AddRow)?;
    }

    for (index, step) in steps.iter().enumerate() {
        match *step {
            Step::Rest => handle.send(EngineMessage::SetRest { index })?,
            Step::Chord {
                degree,
                modifier,
                tied,
            } => {
                handle.send(EngineMessage::SetModifier {
                    modifier: modifier.unwrap_or(default_modifier),
                })?;
                handle.send(EngineMessage::ArmRecording { index })?;
                handle.send(EngineMessage::CaptureChord { degree })?;
                if tied {
                    handle.send(EngineMessage::ToggleTie { index })?;
                }
            }
        }
    }
    handle.send(EngineMessage::SetModifier {
        modifier: default_modifier,
    })?;
    Ok(())
}
