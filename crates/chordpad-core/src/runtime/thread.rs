//! Runtime thread for chordpad.
//!
//! The runtime thread owns the [`Engine`]. It:
//! - Applies queued [`EngineMessage`]s in arrival order
//! - Ticks the transport, metronome and deferred triggers
//! - Publishes snapshots through the shared [`StateManager`]
//!
//! All engine mutation happens on this one thread, so a command never
//! interleaves with a transport step.

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::state::{EngineMessage, EngineSnapshot, StateManager};
use crate::trigger::NoteTrigger;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const TICK_INTERVAL: Duration = Duration::from_millis(1);
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Handle to the running chordpad runtime.
///
/// Cheap to clone; every clone feeds the same runtime thread.
#[derive(Clone)]
pub struct RuntimeHandle {
    /// Sender for engine messages.
    message_tx: Sender<EngineMessage>,
    /// Shared state manager for read access.
    state_manager: StateManager,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
}

impl RuntimeHandle {
    /// Send a message to the runtime thread.
    pub fn send(&self, msg: EngineMessage) -> Result<()> {
        self.message_tx
            .send(msg)
            .map_err(|e| Error::Runtime(format!("Failed to send message: {}", e)))
    }

    /// Get the state manager for read access.
    pub fn state(&self) -> &StateManager {
        &self.state_manager
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.state_manager.snapshot()
    }

    /// Get a clone of the message sender.
    pub fn message_sender(&self) -> Sender<EngineMessage> {
        self.message_tx.clone()
    }

    /// Signal the runtime to shut down.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Block until `predicate` holds for a published snapshot.
    ///
    /// Returns false on timeout or when the runtime shuts down first.
    pub fn wait_until<F>(&self, predicate: F, timeout: Option<Duration>) -> bool
    where
        F: Fn(&EngineSnapshot) -> bool,
    {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if self.state_manager.with_state_read(&predicate) {
                return true;
            }
            if self.is_shutdown_requested() {
                return false;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return false;
            }
            thread::sleep(WAIT_POLL_INTERVAL);
        }
    }
}

impl std::fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("state", &self.state_manager)
            .field("shutdown", &self.is_shutdown_requested())
            .finish()
    }
}

/// The chordpad runtime.
///
/// Dropping it (or calling [`Runtime::shutdown`]) stops playback, cancels
/// pending triggers and joins the runtime thread.
pub struct Runtime {
    handle: RuntimeHandle,
    thread_handle: Option<JoinHandle<()>>,
}

impl Runtime {
    /// Start the runtime with a note trigger and configuration.
    pub fn start<T>(trigger: T, config: &Config) -> Result<Self>
    where
        T: NoteTrigger + 'static,
    {
        Self::start_with_engine(Engine::new(trigger, config))
    }

    /// Start the runtime around an existing engine.
    pub fn start_with_engine<T>(engine: Engine<T>) -> Result<Self>
    where
        T: NoteTrigger + 'static,
    {
        let (message_tx, message_rx) = unbounded();
        let shutdown = Arc::new(AtomicBool::new(false));

        let handle = RuntimeHandle {
            message_tx,
            state_manager: engine.state_manager(),
            shutdown: shutdown.clone(),
        };

        let thread_shutdown = shutdown.clone();
        let thread_handle = thread::Builder::new()
            .name("chordpad-runtime".to_string())
            .spawn(move || {
                let mut rt = RuntimeThread {
                    engine,
                    message_rx,
                };
                rt.run(thread_shutdown);
            })?;

        log::info!("Runtime started");
        Ok(Self {
            handle,
            thread_handle: Some(thread_handle),
        })
    }

    /// Get a handle to interact with the runtime.
    pub fn handle(&self) -> &RuntimeHandle {
        &self.handle
    }

    /// Shut down the runtime gracefully.
    pub fn shutdown(mut self) {
        self.stop_thread();
    }

    fn stop_thread(&mut self) {
        self.handle.shutdown();
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("Runtime thread panicked");
            }
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.stop_thread();
    }
}

/// The runtime thread that processes messages and drives the engine.
struct RuntimeThread<T: NoteTrigger> {
    engine: Engine<T>,
    message_rx: Receiver<EngineMessage>,
}

impl<T: NoteTrigger> RuntimeThread<T> {
    fn run(&mut self, shutdown: Arc<AtomicBool>) {
        while !shutdown.load(Ordering::Relaxed) {
            self.drain_messages();
            self.engine.tick(Instant::now());
            thread::sleep(TICK_INTERVAL);
        }
        self.engine.shutdown();
        log::info!("Runtime stopped");
    }

    fn drain_messages(&mut self) {
        while let Ok(msg) = self.message_rx.try_recv() {
            if let Err(e) = self.engine.handle_message(msg, Instant::now()) {
                log::warn!("Command failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::ScaleDegree;
    use crate::trigger::RecordingTrigger;

    const TIMEOUT: Option<Duration> = Some(Duration::from_secs(5));

    #[test]
    fn test_commands_apply_in_order() {
        let _ = env_logger::builder().is_test(true).try_init();
        let recorder = RecordingTrigger::new();
        let runtime = Runtime::start(recorder.clone(), &Config::default()).unwrap();
        let handle = runtime.handle().clone();

        handle.send(EngineMessage::ArmRecording { index: 0 }).unwrap();
        handle
            .send(EngineMessage::PlayDegree {
                degree: ScaleDegree::new(4),
            })
            .unwrap();
        handle.send(EngineMessage::AddRow).unwrap();

        assert!(handle.wait_until(|s| s.row_count() == 2, TIMEOUT));
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.slots[0].label, "G Major");
        assert_eq!(recorder.calls()[0].pitches, ["G4", "B4", "D4"]);
        runtime.shutdown();
    }

    #[test]
    fn test_transport_runs_to_the_end_and_stops() {
        let recorder = RecordingTrigger::new();
        let mut config = Config::default();
        config.sequencer.bpm = crate::timing::Bpm::new(240);
        let runtime = Runtime::start(recorder.clone(), &config).unwrap();
        let handle = runtime.handle();

        for index in 0..2 {
            handle.send(EngineMessage::ArmRecording { index }).unwrap();
            handle
                .send(EngineMessage::CaptureChord {
                    degree: ScaleDegree::new(index as i32),
                })
                .unwrap();
        }
        handle.send(EngineMessage::StartTransport).unwrap();

        assert!(handle.wait_until(|s| s.transport_running, TIMEOUT));
        assert!(handle.wait_until(|s| !s.transport_running, TIMEOUT));
        assert_eq!(recorder.len(), 2);
        drop(runtime);
    }

    #[test]
    fn test_send_after_shutdown_fails() {
        let runtime = Runtime::start(RecordingTrigger::new(), &Config::default()).unwrap();
        let handle = runtime.handle().clone();
        runtime.shutdown();
        assert!(handle.is_shutdown_requested());
        assert!(handle.send(EngineMessage::AddRow).is_err());
        assert!(!handle.wait_until(|s| s.row_count() == 5, None));
    }
}
