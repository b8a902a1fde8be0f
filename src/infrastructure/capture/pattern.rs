//! Synthetic screen for headless recording

use image::{Rgba, RgbaImage};

use crate::application::ports::{CaptureError, FrameSource};
use crate::domain::capture::{Point, Rect, Size};

/// Default synthetic screen size
pub const DEFAULT_PATTERN_SIZE: Size = Size::new(1280, 720);

/// A diagonal gradient that shifts by a few pixels on every grab, with a
/// pointer that sweeps across the screen.
pub struct TestPatternSource {
    size: Size,
    tick: u32,
}

impl TestPatternSource {
    pub fn new(size: Size) -> Self {
        Self { size, tick: 0 }
    }
}

impl Default for TestPatternSource {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN_SIZE)
    }
}

impl FrameSource for TestPatternSource {
    fn screen_size(&mut self) -> Result<Size, CaptureError> {
        Ok(self.size)
    }

    fn pointer(&mut self) -> Option<Point> {
        let w = self.size.width.max(1);
        let h = self.size.height.max(1);
        Some(Point::new(
            (self.tick.wrapping_mul(7) % w) as i32,
            (self.tick.wrapping_mul(3) % h) as i32,
        ))
    }

    fn grab(&mut self, rect: Rect) -> Result<RgbaImage, CaptureError> {
        let shift = self.tick.wrapping_mul(4);
        self.tick = self.tick.wrapping_add(1);
        Ok(RgbaImage::from_fn(rect.width, rect.height, |x, y| {
            let (sx, sy) = (rect.x + x, rect.y + y);
            Rgba([
                (sx.wrapping_add(shift) % 256) as u8,
                (sy % 256) as u8,
                ((sx + sy) / 8 % 256) as u8,
                255,
            ])
        }))
    }

    fn name(&self) -> &'static str {
        "test-pattern"
    }
}
