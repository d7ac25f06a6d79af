//! Error types for chordpad-core

use thiserror::Error;

/// Result type alias for chordpad operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in chordpad-core
#[derive(Debug, Error)]
pub enum Error {
    /// A sequencer operation referenced a slot that does not exist
    #[error("Slot {index} is out of range (sequencer has {len} slots)")]
    SlotOutOfRange { index: usize, len: usize },

    /// A note name could not be parsed
    #[error("Invalid note name: {0:?}")]
    InvalidNote(String),

    /// A key / pitch class name could not be parsed
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    /// A scale degree could not be parsed
    #[error("Invalid scale degree: {0:?}")]
    InvalidDegree(String),

    /// An arpeggio order name could not be parsed
    #[error("Invalid arpeggio order: {0:?}")]
    InvalidArpeggioOrder(String),

    /// A play mode name could not be parsed
    #[error("Invalid play mode: {0:?}")]
    InvalidPlayMode(String),

    /// A chord must contain at least one note
    #[error("A chord needs at least one note")]
    EmptyChord,

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The runtime thread is gone or could not be started
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
