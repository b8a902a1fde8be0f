//! Recorder lifecycle, session settings and status events

mod events;
mod settings;
mod state;

pub use events::{ErrorKind, StatusEvent, StopReason};
pub use settings::RecordingSettings;
pub use state::{InvalidStateTransition, RecorderLifecycle, RecorderState};
