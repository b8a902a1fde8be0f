//! Transcoder port interface

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Audio/video merge failures. The video-only file always survives these.
#[derive(Debug, Clone, Error)]
pub enum MergeError {
    #[error("Transcoder not found: {0}")]
    TranscoderNotFound(String),

    #[error("Transcoder exited with {}: {stderr}", code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}")))]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("Transcoder did not finish within {0:?} and was stopped")]
    TimedOut(Duration),

    #[error("I/O error during merge: {0}")]
    Io(String),

    #[error("Container .{0} cannot carry an audio track")]
    AudioNotSupported(String),
}

/// One merge invocation: video stream-copied, audio encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
    pub audio_bitrate_kbps: u32,
}

/// Port for the external transcoding process
pub trait Transcoder: Send + Sync {
    /// Run the merge. The exit status is the only success signal.
    fn merge(&self, request: &MergeRequest) -> Result<(), MergeError>;

    fn is_available(&self) -> bool;
}
