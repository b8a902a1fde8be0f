//! HiVision - screen recorder library and CLI
//!
//! Samples the screen (or a region of it, optionally following the
//! pointer) at a fixed rate, draws annotations and an elapsed-time label
//! onto each frame, encodes the result, optionally records the
//! microphone and merges both into one file.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Value objects, the recorder state machine, settings, events and errors
//! - **Application**: Port traits plus the capture loop, compositor, audio pipeline,
//!   muxer and the `RecordingController`
//! - **Infrastructure**: Adapters (xcap, cpal, ffmpeg, YUV4MPEG2, TOML config, notify-rust)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
