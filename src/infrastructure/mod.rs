//! Infrastructure layer - Adapter implementations
//!
//! Concrete implementations of the port interfaces: screen capture via
//! xcap, audio via cpal, encoding and muxing via ffmpeg, plus config
//! storage and desktop notifications.

pub mod audio;
pub mod capture;
pub mod config;
pub mod fonts;
pub mod notification;
mod process;
pub mod sink;
pub mod transcoder;

// Re-export adapters
pub use audio::CpalAudioDevice;
pub use capture::{list_monitors, MonitorInfo, PointerTracker, TestPatternSource, XcapSource};
pub use config::XdgConfigStore;
pub use fonts::resolve_font;
pub use notification::{create_notifier, NotifyRustNotifier};
pub use sink::{read_y4m_info, OutputSink, OutputSinkFactory, Y4mInfo};
pub use transcoder::FfmpegTranscoder;
