//! chordpad runtime - drives the engine on its own thread.
//!
//! The runtime manages:
//! - The runtime thread lifecycle
//! - Command queueing from any number of handles
//! - Periodic transport and metronome ticks

pub mod thread;

pub use thread::{Runtime, RuntimeHandle};
