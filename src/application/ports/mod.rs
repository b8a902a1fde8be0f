//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod audio;
pub mod clock;
pub mod config;
pub mod frame_source;
pub mod notifier;
pub mod transcoder;
pub mod video_sink;

// Re-export common types
pub use audio::{AudioDevice, AudioDeviceError, AudioRead, AudioStream};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ConfigStore;
pub use frame_source::{CaptureError, FrameSource};
pub use notifier::{NoOpNotifier, Notice, NoticeKind, NotificationError, Notifier};
pub use transcoder::{MergeError, MergeRequest, Transcoder};
pub use video_sink::{check_frame_size, SinkError, SinkSpec, VideoSink, VideoSinkFactory};
