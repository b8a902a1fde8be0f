//! What the host environment can do, checked once at startup

use std::fmt;

use super::ports::{AudioDevice, FrameSource, SinkError, Transcoder};
use crate::domain::output::Codec;

/// Capability flags handed to the controller at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentCapabilities {
    /// A screen can be sampled
    pub display: bool,
    /// An audio input device is present
    pub audio_input: bool,
    /// The external encoder/transcoder can be launched
    pub ffmpeg: bool,
}

impl EnvironmentCapabilities {
    pub fn detect<F, A, T>(source: &mut F, audio: &A, transcoder: &T) -> Self
    where
        F: FrameSource + ?Sized,
        A: AudioDevice + ?Sized,
        T: Transcoder + ?Sized,
    {
        Self {
            display: source.screen_size().is_ok(),
            audio_input: audio.is_available(),
            ffmpeg: transcoder.is_available(),
        }
    }

    /// Everything present
    pub const fn all() -> Self {
        Self {
            display: true,
            audio_input: true,
            ffmpeg: true,
        }
    }

    /// Fail early for codecs that need the external encoder when it is missing
    pub fn check_codec(&self, codec: Codec) -> Result<(), SinkError> {
        match codec.ffmpeg_encoder() {
            Some(encoder) if !self.ffmpeg => Err(SinkError::EncoderNotFound(format!(
                "ffmpeg (needed for {encoder}) is not installed"
            ))),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for EnvironmentCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |b: bool| if b { "yes" } else { "no" };
        write!(
            f,
            "display: {}, audio input: {}, ffmpeg: {}",
            flag(self.display),
            flag(self.audio_input),
            flag(self.ffmpeg)
        )
    }
}
