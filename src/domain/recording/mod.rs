//! Recording parameters and frame pacing

mod duration;
mod pacing;
mod preset;

pub use duration::{format_clock, Duration};
pub use pacing::{PacingController, FPS_WINDOW_FRAMES};
pub use preset::{
    EncodingParams, FrameRate, PerformanceMode, QualityPreset, ALL_PRESETS, SUPPORTED_FPS,
};
