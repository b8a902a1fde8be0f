//! Frame source port interface

use std::time::Duration;

use image::RgbaImage;
use thiserror::Error;

use crate::domain::capture::{CaptureRegion, Frame, Point, Rect, RegionError, Size};

/// Screen capture errors. All of them end the current recording.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("No display available for capture")]
    NoDisplay,

    #[error("Monitor not found: {0}")]
    MonitorNotFound(String),

    #[error("Screen capture failed: {0}")]
    Backend(String),

    #[error("Capture region does not fit the screen: {0}")]
    RegionOutOfBounds(#[from] RegionError),

    #[error("Captured image is {actual}, expected {expected}")]
    SizeMismatch { expected: Size, actual: Size },
}

/// Port for sampling the screen
pub trait FrameSource: Send {
    /// Size of the surface being captured
    fn screen_size(&mut self) -> Result<Size, CaptureError>;

    /// Current pointer position, if the backend can tell
    fn pointer(&mut self) -> Option<Point> {
        None
    }

    /// Grab the pixels of `rect`, which lies within the screen
    fn grab(&mut self, rect: Rect) -> Result<RgbaImage, CaptureError>;

    /// Capture `region` as a frame. Follow-cursor regions are resolved
    /// against the pointer position at call time.
    fn capture(
        &mut self,
        region: &CaptureRegion,
        sequence: u64,
        timestamp: Duration,
    ) -> Result<Frame, CaptureError> {
        let screen = self.screen_size()?;
        let pointer = if region.follows_cursor() {
            self.pointer()
        } else {
            None
        };
        let rect = region.resolve(screen, pointer)?;
        let image = self.grab(rect)?;
        let actual = Size::new(image.width(), image.height());
        if actual != rect.size() {
            return Err(CaptureError::SizeMismatch {
                expected: rect.size(),
                actual,
            });
        }
        Ok(Frame::new(image, sequence, timestamp))
    }

    /// Backend name for logs and `devices` output
    fn name(&self) -> &'static str;
}

/// Blanket implementation for boxed frame sources
impl FrameSource for Box<dyn FrameSource> {
    fn screen_size(&mut self) -> Result<Size, CaptureError> {
        self.as_mut().screen_size()
    }

    fn pointer(&mut self) -> Option<Point> {
        self.as_mut().pointer()
    }

    fn grab(&mut self, rect: Rect) -> Result<RgbaImage, CaptureError> {
        self.as_mut().grab(rect)
    }

    fn name(&self) -> &'static str {
        self.as_ref().name()
    }
}
