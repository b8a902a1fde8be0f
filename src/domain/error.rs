//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>s, <number>m, or <number>m<number>s (e.g., 30s, 1m, 2m30s)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when a capture region descriptor cannot be parsed
#[derive(Debug, Clone, Error)]
#[error("Invalid region: \"{input}\". Expected 'full', 'X,Y,WxH' (e.g., 0,0,640x480) or 'follow:WxH'")]
pub struct RegionParseError {
    pub input: String,
}

/// Error when an unknown quality preset name is provided
#[derive(Debug, Clone, Error)]
#[error("Invalid quality preset: \"{input}\". Valid presets are: low, medium, high, ultra, bluray")]
pub struct InvalidPresetError {
    pub input: String,
}

/// Error when a frame rate outside the supported set is requested
#[derive(Debug, Clone, Error)]
#[error("Unsupported frame rate: {fps}. Supported rates are: 5, 10, 15, 20, 24, 25, 30, 50, 60")]
pub struct InvalidFrameRateError {
    pub fps: u32,
}

/// Error when an unknown performance mode name is provided
#[derive(Debug, Clone, Error)]
#[error("Invalid performance mode: \"{input}\". Valid modes are: smooth, balanced, eco")]
pub struct InvalidPerformanceModeError {
    pub input: String,
}

/// Error when an unknown codec identifier is provided
#[derive(Debug, Clone, Error)]
#[error("Unsupported codec: \"{input}\". Supported codecs are: avc1, h264, mp4v, mjpg, xvid, vp80, i444")]
pub struct InvalidCodecError {
    pub input: String,
}

/// Error when an annotations file is rejected
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("invalid annotation JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("annotation #{index}: {message}")]
    OutOfRange { index: usize, message: String },
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

/// Error when recording parameters are rejected before anything is opened
#[derive(Debug, Clone, Error)]
pub enum ConfigurationError {
    #[error("A recording is already in progress")]
    AlreadyActive,

    #[error("Invalid capture region: {0}")]
    InvalidRegion(#[from] crate::domain::capture::RegionError),

    #[error(transparent)]
    UnsupportedFrameRate(#[from] InvalidFrameRateError),

    #[error("Invalid output path: {0}")]
    OutputPath(String),
}
