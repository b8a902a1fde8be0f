//! Audio input infrastructure
//!
//! Microphone capture through cpal, delivering interleaved i16 blocks to
//! the capture pipeline.

mod cpal_device;

pub use cpal_device::CpalAudioDevice;
