//! Application layer - Use cases and port interfaces
//!
//! Contains the capture/encode/mux coordination and the trait
//! definitions for screens, sinks, audio devices and external tools.

pub mod audio_pipeline;
pub mod capabilities;
pub mod capture_loop;
pub mod compositor;
pub mod controller;
pub mod muxer;
pub mod ports;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

// Re-export use cases
pub use audio_pipeline::AudioCapturePipeline;
pub use capabilities::EnvironmentCapabilities;
pub use capture_loop::{CaptureLoop, LoopExit, LoopOutcome};
pub use compositor::{GlyphFont, OverlayCompositor};
pub use controller::{ControllerConfig, RecorderError, RecordingController, RecordingSummary, JOIN_TIMEOUT};
pub use muxer::{AudioTrack, Muxer};
pub use worker::{EventSender, LoopControl};
