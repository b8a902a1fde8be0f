//! Audio input port interfaces

use std::time::Duration;

use thiserror::Error;

use crate::domain::audio::AudioSpec;

/// Audio device errors. None of them stop the video recording.
#[derive(Debug, Clone, Error)]
pub enum AudioDeviceError {
    #[error("No audio input device available")]
    NoDevice,

    #[error("Audio input device not found: {0}")]
    DeviceNotFound(String),

    #[error("Audio device does not support the requested format: {0}")]
    UnsupportedConfig(String),

    #[error("Audio stream failed: {0}")]
    StreamFailed(String),
}

/// Result of one bounded read from an input stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioRead {
    /// Interleaved i16 samples in the stream's channel layout
    Samples(Vec<i16>),
    /// Nothing arrived within the timeout
    Timeout,
    /// The device produced data faster than it was consumed and some was
    /// lost. Capture continues.
    Overflow,
}

/// An open input stream. Lives on the thread that opened it.
pub trait AudioStream {
    /// Wait at most `timeout` for the next block of samples
    fn read(&mut self, timeout: Duration) -> Result<AudioRead, AudioDeviceError>;

    fn pause(&mut self) -> Result<(), AudioDeviceError>;

    fn resume(&mut self) -> Result<(), AudioDeviceError>;
}

/// Port for audio input devices
pub trait AudioDevice: Send + Sync {
    /// Open an input stream matching `spec`
    fn open(&self, spec: &AudioSpec) -> Result<Box<dyn AudioStream>, AudioDeviceError>;

    /// Whether any input device is present
    fn is_available(&self) -> bool;

    /// Names of available input devices
    fn input_names(&self) -> Vec<String> {
        Vec::new()
    }
}
