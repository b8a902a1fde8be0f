//! Hand-written port doubles shared by application unit tests

use std::collections::VecDeque;
use std::fs;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{Rgba, RgbaImage};

use super::ports::{
    check_frame_size, AudioDevice, AudioDeviceError, AudioRead, AudioStream, CaptureError,
    FrameSource, MergeError, MergeRequest, SinkError, SinkSpec, Transcoder, VideoSink,
    VideoSinkFactory,
};
use crate::domain::audio::AudioSpec;
use crate::domain::capture::{crop_to_region, Frame, Rect, Size};
use crate::domain::output::Codec;

/// Gradient screen that can be told to fail after N grabs
pub struct PatternSource {
    screen: RgbaImage,
    grabs: u64,
    fail_after: Option<u64>,
}

impl PatternSource {
    pub fn new(size: Size) -> Self {
        Self {
            screen: RgbaImage::from_fn(size.width, size.height, |x, y| {
                Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
            }),
            grabs: 0,
            fail_after: None,
        }
    }

    pub fn failing_after(mut self, grabs: u64) -> Self {
        self.fail_after = Some(grabs);
        self
    }
}

impl FrameSource for PatternSource {
    fn screen_size(&mut self) -> Result<Size, CaptureError> {
        Ok(Size::new(self.screen.width(), self.screen.height()))
    }

    fn grab(&mut self, rect: Rect) -> Result<RgbaImage, CaptureError> {
        if self.fail_after.is_some_and(|n| self.grabs >= n) {
            return Err(CaptureError::NoDisplay);
        }
        self.grabs += 1;
        Ok(crop_to_region(&self.screen, rect))
    }

    fn name(&self) -> &'static str {
        "pattern"
    }
}

/// Source with no display at all
pub struct HeadlessSource;

impl FrameSource for HeadlessSource {
    fn screen_size(&mut self) -> Result<Size, CaptureError> {
        Err(CaptureError::NoDisplay)
    }

    fn grab(&mut self, _rect: Rect) -> Result<RgbaImage, CaptureError> {
        Err(CaptureError::NoDisplay)
    }

    fn name(&self) -> &'static str {
        "headless"
    }
}

/// Sink that records frame sequences and writes a marker file on close
pub struct CountingSink {
    size: Size,
    sequences: Arc<Mutex<Vec<u64>>>,
    closed: Arc<AtomicBool>,
    path: Option<std::path::PathBuf>,
}

impl CountingSink {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            sequences: Arc::default(),
            closed: Arc::default(),
            path: None,
        }
    }

    pub fn sequences(&self) -> Vec<u64> {
        self.sequences.lock().unwrap().clone()
    }
}

impl VideoSink for CountingSink {
    fn write(&mut self, frame: &Frame) -> Result<(), SinkError> {
        check_frame_size(self.size, frame)?;
        self.sequences.lock().unwrap().push(frame.sequence());
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            if let Some(path) = &self.path {
                let body = format!("frames={}", self.sequences.lock().unwrap().len());
                fs::write(path, body).map_err(|e| SinkError::FinalizeFailed(e.to_string()))?;
            }
        }
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.sequences.lock().unwrap().len() as u64
    }

    fn bytes_written(&self) -> u64 {
        self.frames_written() * self.size.width as u64 * self.size.height as u64 * 4
    }
}

/// Factory handing out [`CountingSink`]s that share observable state
#[derive(Clone, Default)]
pub struct MockSinkFactory {
    pub fail_with: Option<SinkError>,
    pub opened: Arc<Mutex<Vec<SinkSpec>>>,
    pub sequences: Arc<Mutex<Vec<u64>>>,
    pub closed: Arc<AtomicBool>,
}

impl MockSinkFactory {
    pub fn writes(&self) -> usize {
        self.sequences.lock().unwrap().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl VideoSinkFactory for MockSinkFactory {
    type Sink = CountingSink;

    fn open(&self, spec: &SinkSpec) -> Result<CountingSink, SinkError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.opened.lock().unwrap().push(spec.clone());
        Ok(CountingSink {
            size: spec.size,
            sequences: Arc::clone(&self.sequences),
            closed: Arc::clone(&self.closed),
            path: Some(spec.path.clone()),
        })
    }

    fn supports(&self, _codec: Codec) -> bool {
        true
    }
}

/// Audio device yielding a block of samples every few milliseconds
#[derive(Clone)]
pub struct MockAudioDevice {
    pub available: bool,
    pub fail_open: bool,
    /// Reads served before the stream reports a read failure
    pub reads_before_failure: Option<usize>,
    pub opened: Arc<AtomicUsize>,
    pub overflow_every: Option<usize>,
}

impl Default for MockAudioDevice {
    fn default() -> Self {
        Self {
            available: true,
            fail_open: false,
            reads_before_failure: None,
            opened: Arc::default(),
            overflow_every: None,
        }
    }
}

struct MockStream {
    block: usize,
    reads: usize,
    reads_before_failure: Option<usize>,
    overflow_every: Option<usize>,
    pending: VecDeque<AudioRead>,
}

impl AudioStream for MockStream {
    fn read(&mut self, _timeout: Duration) -> Result<AudioRead, AudioDeviceError> {
        if let Some(read) = self.pending.pop_front() {
            return Ok(read);
        }
        if self.reads_before_failure.is_some_and(|n| self.reads >= n) {
            return Err(AudioDeviceError::StreamFailed("unplugged".into()));
        }
        self.reads += 1;
        std::thread::sleep(Duration::from_millis(2));
        if self.overflow_every.is_some_and(|n| self.reads % n == 0) {
            return Ok(AudioRead::Overflow);
        }
        Ok(AudioRead::Samples(vec![self.reads as i16; self.block]))
    }

    fn pause(&mut self) -> Result<(), AudioDeviceError> {
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AudioDeviceError> {
        Ok(())
    }
}

impl AudioDevice for MockAudioDevice {
    fn open(&self, spec: &AudioSpec) -> Result<Box<dyn AudioStream>, AudioDeviceError> {
        if !self.available {
            return Err(AudioDeviceError::NoDevice);
        }
        if self.fail_open {
            return Err(AudioDeviceError::UnsupportedConfig("mock".into()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockStream {
            block: spec.channels as usize * 256,
            reads: 0,
            reads_before_failure: self.reads_before_failure,
            overflow_every: self.overflow_every,
            pending: VecDeque::new(),
        }))
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

/// Transcoder that copies the video to the output or fails with an exit code
#[derive(Clone, Default)]
pub struct FakeTranscoder {
    pub fail: bool,
    pub missing: bool,
    pub calls: Arc<Mutex<Vec<MergeRequest>>>,
}

impl FakeTranscoder {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Transcoder for FakeTranscoder {
    fn merge(&self, request: &MergeRequest) -> Result<(), MergeError> {
        self.calls.lock().unwrap().push(request.clone());
        assert!(request.audio.exists(), "audio file must exist during merge");
        if self.fail {
            fs::write(&request.output, b"partial").map_err(|e| MergeError::Io(e.to_string()))?;
            return Err(MergeError::NonZeroExit {
                code: Some(1),
                stderr: "simulated failure".into(),
            });
        }
        let mut merged = fs::read(&request.video).map_err(|e| MergeError::Io(e.to_string()))?;
        merged.extend_from_slice(b"+audio");
        fs::write(&request.output, merged).map_err(|e| MergeError::Io(e.to_string()))
    }

    fn is_available(&self) -> bool {
        !self.missing
    }
}
