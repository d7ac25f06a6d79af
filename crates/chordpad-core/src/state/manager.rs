//! State manager for thread-safe state access.
//!
//! The [`StateManager`] provides synchronized access to the latest
//! [`EngineSnapshot`]. The runtime thread is the only writer; display code
//! reads.

use std::sync::{Arc, RwLock};

use super::model::EngineSnapshot;

/// Thread-safe handle to the published engine snapshot.
#[derive(Clone)]
pub struct StateManager {
    state: Arc<RwLock<EngineSnapshot>>,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    pub fn new() -> Self {
        Self::with_state(EngineSnapshot::default())
    }

    pub fn with_state(state: EngineSnapshot) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Read the state with a closure.
    ///
    /// Multiple readers can hold the lock simultaneously.
    pub fn with_state_read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&EngineSnapshot) -> R,
    {
        let state = self.state.read().expect("State lock poisoned");
        f(&state)
    }

    /// Write to the state with a closure.
    pub fn with_state_write<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut EngineSnapshot) -> R,
    {
        let mut state = self.state.write().expect("State lock poisoned");
        f(&mut state)
    }

    /// Replace the snapshot, keeping the version counter moving.
    pub fn publish(&self, mut snapshot: EngineSnapshot) {
        self.with_state_write(|s| {
            snapshot.version = s.version;
            snapshot.bump_version();
            *s = snapshot;
        });
    }

    /// Get a clone of the current state.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.with_state_read(|s| s.clone())
    }

    pub fn is_transport_running(&self) -> bool {
        self.with_state_read(|s| s.transport_running)
    }

    pub fn playing_index(&self) -> Option<usize> {
        self.with_state_read(|s| s.playing_index)
    }

    pub fn version(&self) -> u64 {
        self.with_state_read(|s| s.version)
    }
}

impl std::fmt::Debug for StateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateManager")
            .field("version", &self.version())
            .finish_non_exhaustive()
    }
}
