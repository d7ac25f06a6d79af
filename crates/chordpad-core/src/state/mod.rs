//! State management for chordpad.
//!
//! All engine mutations flow through [`EngineMessage`]. After each one the
//! engine publishes an [`EngineSnapshot`] into the [`StateManager`], which can
//! be shared with display threads.
//!
//! # Architecture
//!
//! - [`EngineMessage`] - All possible commands
//! - [`EngineSnapshot`] - What displays see
//! - [`StateManager`] - Thread-safe snapshot access

mod manager;
mod messages;
mod model;

pub use manager::StateManager;
pub use messages::EngineMessage;
pub use model::{EngineSnapshot, SlotView};
