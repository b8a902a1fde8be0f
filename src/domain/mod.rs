//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod annotation;
pub mod audio;
pub mod capture;
pub mod config;
pub mod error;
pub mod output;
pub mod recording;
pub mod session;

// Re-export common types
pub use annotation::{AnnotationLayer, AnnotationPrimitive, Color};
pub use audio::{AudioChunk, AudioSpec};
pub use capture::{CaptureRegion, Frame, Point, Rect, Size};
pub use config::AppConfig;
pub use error::*;
pub use output::{Codec, Container, OutputTarget};
pub use recording::{Duration, FrameRate, PacingController, PerformanceMode, QualityPreset};
pub use session::{RecorderState, RecordingSettings, StatusEvent};
