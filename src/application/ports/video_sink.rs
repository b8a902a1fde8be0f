//! Video sink port interfaces

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::capture::{Frame, Size};
use crate::domain::output::{Codec, Container};
use crate::domain::recording::{EncodingParams, FrameRate};

/// Errors opening, writing or finalizing an output container
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    #[error("Codec {0} is not supported by this sink")]
    UnsupportedCodec(Codec),

    #[error("Codec {codec} cannot be stored in a .{container} file")]
    IncompatibleContainer { codec: Codec, container: Container },

    #[error("Encoder not found: {0}")]
    EncoderNotFound(String),

    #[error("Failed to start encoder: {0}")]
    SpawnFailed(String),

    #[error("Failed to write frame: {0}")]
    WriteFailed(String),

    #[error("Frame is {actual}, sink was opened for {expected}")]
    DimensionMismatch { expected: Size, actual: Size },

    #[error("Failed to finalize output: {0}")]
    FinalizeFailed(String),
}

/// Everything needed to open an output container
#[derive(Debug, Clone, PartialEq)]
pub struct SinkSpec {
    pub path: PathBuf,
    pub codec: Codec,
    pub container: Container,
    pub fps: FrameRate,
    pub size: Size,
    pub encoding: EncodingParams,
}

/// An open constant-frame-rate output.
///
/// Frames are appended strictly in the order written; the sink never
/// drops or reorders them. Only the capture loop writes to a sink.
pub trait VideoSink: Send {
    fn write(&mut self, frame: &Frame) -> Result<(), SinkError>;

    /// Flush and finalize the container. Calling it again is a no-op.
    fn close(&mut self) -> Result<(), SinkError>;

    fn frames_written(&self) -> u64;

    /// Bytes handed to the container so far (used for progress)
    fn bytes_written(&self) -> u64;
}

/// Port for opening video sinks
pub trait VideoSinkFactory: Send + Sync {
    type Sink: VideoSink + 'static;

    /// Open a sink. Fails before any frame is captured when the codec or
    /// container cannot be initialized.
    fn open(&self, spec: &SinkSpec) -> Result<Self::Sink, SinkError>;

    /// Whether the factory can serve `codec` at all (e.g. encoder present)
    fn supports(&self, codec: Codec) -> bool;
}

/// Reject frames whose size differs from the opened size
pub fn check_frame_size(expected: Size, frame: &Frame) -> Result<(), SinkError> {
    if frame.size() != expected {
        return Err(SinkError::DimensionMismatch {
            expected,
            actual: frame.size(),
        });
    }
    Ok(())
}
