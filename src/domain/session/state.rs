//! Recorder lifecycle state machine

use std::fmt;
use thiserror::Error;

/// Recorder states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
    Paused,
    Stopping,
}

impl RecorderState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopping => "stopping",
        }
    }

    /// A session exists (recording, paused, or being finalized)
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: RecorderState,
    pub action: String,
}

/// Lifecycle of a single recorder.
///
/// State machine:
///   IDLE -> RECORDING (begin)
///   RECORDING -> PAUSED (pause)
///   PAUSED -> RECORDING (resume)
///   RECORDING | PAUSED -> STOPPING (begin_stop)
///   STOPPING -> IDLE (finish)
///   RECORDING -> IDLE (abort, start sequence unwound)
#[derive(Debug, Default)]
pub struct RecorderLifecycle {
    state: RecorderState,
}

impl RecorderLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    fn transition(
        &mut self,
        allowed: &[RecorderState],
        to: RecorderState,
        action: &str,
    ) -> Result<(), InvalidStateTransition> {
        if !allowed.contains(&self.state) {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: action.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }

    pub fn begin(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(&[RecorderState::Idle], RecorderState::Recording, "start recording")
    }

    pub fn pause(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(&[RecorderState::Recording], RecorderState::Paused, "pause")
    }

    pub fn resume(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(&[RecorderState::Paused], RecorderState::Recording, "resume")
    }

    /// Returns `false` when a stop is already underway or nothing is
    /// recording, so repeated stops are harmless no-ops.
    pub fn begin_stop(&mut self) -> bool {
        match self.state {
            RecorderState::Recording | RecorderState::Paused => {
                self.state = RecorderState::Stopping;
                true
            }
            RecorderState::Idle | RecorderState::Stopping => false,
        }
    }

    pub fn finish(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(&[RecorderState::Stopping], RecorderState::Idle, "finish stopping")
    }

    /// Roll back a `begin` whose start sequence failed
    pub fn abort(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(&[RecorderState::Recording], RecorderState::Idle, "abort start")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lifecycle_is_idle() {
        let lifecycle = RecorderLifecycle::new();
        assert_eq!(lifecycle.state(), RecorderState::Idle);
        assert!(!lifecycle.state().is_active());
    }

    #[test]
    fn begin_twice_fails() {
        let mut lifecycle = RecorderLifecycle::new();
        lifecycle.begin().unwrap();

        let err = lifecycle.begin().unwrap_err();
        assert_eq!(err.current_state, RecorderState::Recording);
        assert!(err.action.contains("start recording"));
    }

    #[test]
    fn pause_and_resume() {
        let mut lifecycle = RecorderLifecycle::new();
        lifecycle.begin().unwrap();
        lifecycle.pause().unwrap();
        assert_eq!(lifecycle.state(), RecorderState::Paused);
        assert!(lifecycle.pause().is_err());
        lifecycle.resume().unwrap();
        assert_eq!(lifecycle.state(), RecorderState::Recording);
    }

    #[test]
    fn resume_requires_paused() {
        let mut lifecycle = RecorderLifecycle::new();
        assert!(lifecycle.resume().is_err());
        lifecycle.begin().unwrap();
        assert!(lifecycle.resume().is_err());
    }

    #[test]
    fn stop_from_idle_is_noop() {
        let mut lifecycle = RecorderLifecycle::new();
        assert!(!lifecycle.begin_stop());
        assert_eq!(lifecycle.state(), RecorderState::Idle);
    }

    #[test]
    fn stop_from_paused_then_repeat_is_noop() {
        let mut lifecycle = RecorderLifecycle::new();
        lifecycle.begin().unwrap();
        lifecycle.pause().unwrap();
        assert!(lifecycle.begin_stop());
        assert_eq!(lifecycle.state(), RecorderState::Stopping);
        assert!(!lifecycle.begin_stop());
        lifecycle.finish().unwrap();
        assert_eq!(lifecycle.state(), RecorderState::Idle);
    }

    #[test]
    fn abort_returns_to_idle() {
        let mut lifecycle = RecorderLifecycle::new();
        lifecycle.begin().unwrap();
        lifecycle.abort().unwrap();
        assert_eq!(lifecycle.state(), RecorderState::Idle);
        lifecycle.begin().unwrap();
    }

    #[test]
    fn error_display() {
        let err = InvalidStateTransition {
            current_state: RecorderState::Stopping,
            action: "pause".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("pause"));
        assert!(msg.contains("stopping"));
    }
}
