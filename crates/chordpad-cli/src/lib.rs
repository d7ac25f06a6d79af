//! chordpad-cli - command-line front end for chordpad
//!
//! Prints chords, scales and arpeggios, and plays chord progressions through
//! the chordpad runtime with a printing note trigger.
//!
//! # Usage as a Library
//!
//! ```no_run
//! use chordpad_cli::progression::{load_into, parse_progression};
//! use chordpad_cli::printer::PrintTrigger;
//! use chordpad_core::{ChordModifier, Config, EngineMessage, Runtime};
//!
//! let config = Config::load_or_default();
//! let runtime = Runtime::start(PrintTrigger::new(), &config).unwrap();
//! let steps = parse_progression("1 4 5:dom7 1").unwrap();
//! load_into(runtime.handle(), &steps, config.sequencer.rows, ChordModifier::Triad).unwrap();
//! runtime.handle().send(EngineMessage::StartTransport).unwrap();
//! ```

pub mod printer;
pub mod progression;

pub use printer::PrintTrigger;
pub use progression::{parse_progression, Step};
