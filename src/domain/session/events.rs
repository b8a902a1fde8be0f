//! Status events emitted to the external collaborator (CLI, GUI, ...)

use std::path::PathBuf;

/// Error family attached to an [`StatusEvent::Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Capture,
    SinkUnavailable,
    AudioDevice,
    MergeFailed,
    InvalidConfiguration,
    /// A worker loop missed its join deadline or finalization misbehaved
    Finalization,
}

impl ErrorKind {
    /// Fatal errors end (or prevent) the recording session
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Capture | Self::SinkUnavailable | Self::InvalidConfiguration
        )
    }
}

/// Why a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `stop()` was requested
    Requested,
    /// The configured maximum duration was reached
    DurationLimit,
    /// A fatal capture or encode error ended the session
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    Started {
        output_path: PathBuf,
        width: u32,
        height: u32,
        fps: u32,
        audio: bool,
    },
    Progress {
        elapsed_secs: f64,
        frame_count: u64,
        actual_fps: f64,
        bytes_written: u64,
    },
    Paused {
        is_paused: bool,
    },
    Stopped {
        elapsed_secs: f64,
        frame_count: u64,
        average_fps: f64,
        output_path: PathBuf,
        audio_merged: bool,
        reason: StopReason,
    },
    ScreenshotSaved {
        path: PathBuf,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl StatusEvent {
    /// Short machine-friendly name of the event
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Progress { .. } => "progress",
            Self::Paused { .. } => "paused",
            Self::Stopped { .. } => "stopped",
            Self::ScreenshotSaved { .. } => "screenshot",
            Self::Error { .. } => "error",
        }
    }
}
