//! Shared control flags and bounded joins for worker threads

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;

use crate::domain::session::StatusEvent;

/// How often a paused or finishing worker re-checks its flags
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Status events flow to the collaborator through this channel; sending
/// never blocks.
pub type EventSender = UnboundedSender<StatusEvent>;

/// Send an event, ignoring a receiver that has gone away
pub fn emit(events: &EventSender, event: StatusEvent) {
    let _ = events.send(event);
}

/// Cancellation token plus pause flag shared with one worker loop
#[derive(Debug, Default)]
pub struct LoopControl {
    stop: AtomicBool,
    paused: AtomicBool,
    frames: AtomicU64,
    elapsed_ms: AtomicU64,
}

impl LoopControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Frames written so far (updated by the capture loop)
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }

    pub(crate) fn set_frames(&self, frames: u64) {
        self.frames.store(frames, Ordering::SeqCst);
    }

    /// Recording time so far, pauses excluded
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }

    pub(crate) fn set_elapsed(&self, elapsed: Duration) {
        self.elapsed_ms
            .store(elapsed.as_millis() as u64, Ordering::SeqCst);
    }
}

/// Join `handle` if it finishes within `timeout`. On timeout the handle is
/// returned so the caller can decide to detach it.
pub fn join_bounded<T>(handle: JoinHandle<T>, timeout: Duration) -> Result<thread::Result<T>, JoinHandle<T>> {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return Err(handle);
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    Ok(handle.join())
}
