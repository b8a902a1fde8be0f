//! Captured frame value object

use std::time::Duration;

use image::{imageops, RgbaImage};

use super::region::{Rect, Size};

/// Immutable RGBA8 pixel buffer tagged with its place in the recording.
///
/// `timestamp` is recording time (pauses excluded) when the frame was
/// sampled. Screenshots taken outside a recording carry `Duration::ZERO`.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    image: RgbaImage,
    sequence: u64,
    timestamp: Duration,
}

impl Frame {
    pub fn new(image: RgbaImage, sequence: u64, timestamp: Duration) -> Self {
        Self {
            image,
            sequence,
            timestamp,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Raw RGBA bytes, row-major, 4 bytes per pixel
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// New frame with the same sequence and timestamp but different pixels
    pub fn with_image(&self, image: RgbaImage) -> Self {
        Self {
            image,
            sequence: self.sequence,
            timestamp: self.timestamp,
        }
    }
}

/// Copy `rect` out of a full-screen image. `rect` must lie within `screen`.
pub fn crop_to_region(screen: &RgbaImage, rect: Rect) -> RgbaImage {
    if rect.x == 0 && rect.y == 0 && rect.width == screen.width() && rect.height == screen.height() {
        return screen.clone();
    }
    imageops::crop_imm(screen, rect.x, rect.y, rect.width, rect.height).to_image()
}
