//! Port doubles shared by the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hivision::application::ports::{
    AudioDevice, AudioDeviceError, AudioRead, AudioStream, MergeError, MergeRequest, Transcoder,
};
use hivision::domain::audio::AudioSpec;
use hivision::domain::capture::{CaptureRegion, Rect};
use hivision::domain::output::{Codec, Container, OutputTarget};
use hivision::domain::recording::FrameRate;
use hivision::domain::session::{RecordingSettings, StatusEvent};
use tokio::sync::mpsc::UnboundedReceiver;

/// Machine without a microphone
pub struct NoMicrophone;

impl AudioDevice for NoMicrophone {
    fn open(&self, _spec: &AudioSpec) -> Result<Box<dyn AudioStream>, AudioDeviceError> {
        Err(AudioDeviceError::NoDevice)
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Microphone producing a constant tone block every couple of milliseconds
pub struct ToneMicrophone;

struct ToneStream {
    block: usize,
}

impl AudioStream for ToneStream {
    fn read(&mut self, _timeout: Duration) -> Result<AudioRead, AudioDeviceError> {
        std::thread::sleep(Duration::from_millis(2));
        Ok(AudioRead::Samples(vec![1000; self.block]))
    }

    fn pause(&mut self) -> Result<(), AudioDeviceError> {
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AudioDeviceError> {
        Ok(())
    }
}

impl AudioDevice for ToneMicrophone {
    fn open(&self, spec: &AudioSpec) -> Result<Box<dyn AudioStream>, AudioDeviceError> {
        Ok(Box::new(ToneStream {
            block: spec.chunk_samples(),
        }))
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Transcoder that appends a marker instead of running ffmpeg
#[derive(Clone, Default)]
pub struct FakeTranscoder {
    pub fail: bool,
    pub calls: Arc<Mutex<Vec<MergeRequest>>>,
}

impl FakeTranscoder {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Transcoder for FakeTranscoder {
    fn merge(&self, request: &MergeRequest) -> Result<(), MergeError> {
        self.calls.lock().unwrap().push(request.clone());
        if self.fail {
            fs::write(&request.output, b"half-written").map_err(|e| MergeError::Io(e.to_string()))?;
            return Err(MergeError::NonZeroExit {
                code: Some(1),
                stderr: "Invalid data found when processing input".into(),
            });
        }
        let mut merged = fs::read(&request.video).map_err(|e| MergeError::Io(e.to_string()))?;
        merged.extend_from_slice(b"+audio");
        fs::write(&request.output, merged).map_err(|e| MergeError::Io(e.to_string()))
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// 64x48 at 10 fps into `dir` as YUV4MPEG2, no timestamp
pub fn y4m_settings(dir: &Path) -> RecordingSettings {
    let mut settings = RecordingSettings::new(OutputTarget::Directory(dir.to_path_buf()));
    settings.region = CaptureRegion::Fixed(Rect::new(16, 16, 64, 48));
    settings.fps = FrameRate::new(10).unwrap();
    settings.container = Container::Y4m;
    settings.codec = Codec::I444;
    settings.timestamp = false;
    settings
}

/// Block until the session reports `Stopped`, returning everything seen
pub fn collect_until_stopped(rx: &mut UnboundedReceiver<StatusEvent>) -> Vec<StatusEvent> {
    let mut seen = Vec::new();
    while let Some(event) = rx.blocking_recv() {
        let done = matches!(event, StatusEvent::Stopped { .. });
        seen.push(event);
        if done {
            return seen;
        }
    }
    panic!("event channel closed before the session stopped");
}

/// Everything already queued
pub fn drain(rx: &mut UnboundedReceiver<StatusEvent>) -> Vec<StatusEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

/// Frame source for a machine with no display
pub struct NoDisplay;

impl hivision::application::ports::FrameSource for NoDisplay {
    fn screen_size(
        &mut self,
    ) -> Result<hivision::domain::capture::Size, hivision::application::ports::CaptureError> {
        Err(hivision::application::ports::CaptureError::NoDisplay)
    }

    fn grab(
        &mut self,
        _rect: Rect,
    ) -> Result<image::RgbaImage, hivision::application::ports::CaptureError> {
        Err(hivision::application::ports::CaptureError::NoDisplay)
    }

    fn name(&self) -> &'static str {
        "no-display"
    }
}
