//! Screen geometry and capture region descriptors

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::error::RegionParseError;

/// Pointer or pixel position in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Rectangle in screen pixels, always non-negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// The rectangle lies fully inside a screen of `screen` size
    pub fn fits_within(&self, screen: Size) -> bool {
        self.x as u64 + self.width as u64 <= screen.width as u64
            && self.y as u64 + self.height as u64 <= screen.height as u64
    }
}

/// Error when a region cannot be resolved against the screen
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionError {
    #[error("Capture region has zero width or height")]
    Empty,

    #[error("Capture region {region} is larger than the screen ({screen})")]
    ExceedsScreen { region: Size, screen: Size },
}

/// What part of the screen each capture samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureRegion {
    #[default]
    FullScreen,
    Fixed(Rect),
    /// Fixed-size rectangle centred on the pointer at every capture
    FollowCursor(Size),
}

impl CaptureRegion {
    /// Output dimensions for a screen of `screen` size. Constant for the
    /// whole session regardless of where the pointer moves.
    pub fn frame_size(&self, screen: Size) -> Result<Size, RegionError> {
        let size = match self {
            Self::FullScreen => screen,
            Self::Fixed(rect) => rect.size(),
            Self::FollowCursor(size) => *size,
        };
        if size.is_empty() {
            return Err(RegionError::Empty);
        }
        if size.width > screen.width || size.height > screen.height {
            return Err(RegionError::ExceedsScreen {
                region: size,
                screen,
            });
        }
        Ok(size)
    }

    /// Resolve to a concrete rectangle inside the screen. Out-of-bounds
    /// rectangles keep their size and have their offset pulled back in.
    pub fn resolve(&self, screen: Size, pointer: Option<Point>) -> Result<Rect, RegionError> {
        let size = self.frame_size(screen)?;
        let rect = match self {
            Self::FullScreen => Rect::new(0, 0, screen.width, screen.height),
            Self::Fixed(rect) => Rect::new(
                clamp_offset(rect.x as i64, size.width, screen.width),
                clamp_offset(rect.y as i64, size.height, screen.height),
                size.width,
                size.height,
            ),
            Self::FollowCursor(_) => {
                let center = pointer.unwrap_or(Point::new(
                    (screen.width / 2) as i32,
                    (screen.height / 2) as i32,
                ));
                Rect::new(
                    clamp_offset(center.x as i64 - (size.width / 2) as i64, size.width, screen.width),
                    clamp_offset(center.y as i64 - (size.height / 2) as i64, size.height, screen.height),
                    size.width,
                    size.height,
                )
            }
        };
        Ok(rect)
    }

    pub const fn follows_cursor(&self) -> bool {
        matches!(self, Self::FollowCursor(_))
    }
}

fn clamp_offset(offset: i64, extent: u32, limit: u32) -> u32 {
    let max = limit.saturating_sub(extent) as i64;
    offset.clamp(0, max) as u32
}

fn parse_size(s: &str) -> Option<Size> {
    let (w, h) = s.split_once(['x', 'X'])?;
    Some(Size::new(w.trim().parse().ok()?, h.trim().parse().ok()?))
}

impl FromStr for CaptureRegion {
    type Err = RegionParseError;

    /// Parse `full`, `X,Y,WxH` or `follow:WxH`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || RegionParseError {
            input: s.to_string(),
        };
        let input = s.trim().to_lowercase();

        if input == "full" || input == "fullscreen" {
            return Ok(Self::FullScreen);
        }

        if let Some(size) = input.strip_prefix("follow:") {
            let size = parse_size(size).ok_or_else(err)?;
            if size.is_empty() {
                return Err(err());
            }
            return Ok(Self::FollowCursor(size));
        }

        let parts: Vec<&str> = input.split(',').collect();
        let [x, y, size] = parts.as_slice() else {
            return Err(err());
        };
        let x: u32 = x.trim().parse().map_err(|_| err())?;
        let y: u32 = y.trim().parse().map_err(|_| err())?;
        let size = parse_size(size).ok_or_else(err)?;
        if size.is_empty() {
            return Err(err());
        }
        Ok(Self::Fixed(Rect::new(x, y, size.width, size.height)))
    }
}

impl fmt::Display for CaptureRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullScreen => write!(f, "full"),
            Self::Fixed(r) => write!(f, "{},{},{}x{}", r.x, r.y, r.width, r.height),
            Self::FollowCursor(size) => write!(f, "follow:{}", size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Size = Size::new(1920, 1080);

    #[test]
    fn full_screen_resolves_to_screen() {
        let rect = CaptureRegion::FullScreen.resolve(SCREEN, None).unwrap();
        assert_eq!(rect, Rect::new(0, 0, 1920, 1080));
    }

    #[test]
    fn fixed_region_inside_screen_is_unchanged() {
        let region = CaptureRegion::Fixed(Rect::new(100, 50, 640, 480));
        assert_eq!(region.resolve(SCREEN, None).unwrap(), Rect::new(100, 50, 640, 480));
    }

    #[test]
    fn fixed_region_overflow_shrinks_offset_not_size() {
        let region = CaptureRegion::Fixed(Rect::new(1800, 1000, 640, 480));
        let rect = region.resolve(SCREEN, None).unwrap();
        assert_eq!(rect, Rect::new(1280, 600, 640, 480));
        assert!(rect.fits_within(SCREEN));
    }

    #[test]
    fn follow_cursor_centres_on_pointer() {
        let region = CaptureRegion::FollowCursor(Size::new(200, 100));
        let rect = region.resolve(SCREEN, Some(Point::new(500, 500))).unwrap();
        assert_eq!(rect, Rect::new(400, 450, 200, 100));
    }

    #[test]
    fn follow_cursor_is_clamped_at_edges() {
        let region = CaptureRegion::FollowCursor(Size::new(200, 100));
        let top_left = region.resolve(SCREEN, Some(Point::new(-50, 10))).unwrap();
        assert_eq!(top_left, Rect::new(0, 0, 200, 100));
        let bottom_right = region.resolve(SCREEN, Some(Point::new(5000, 5000))).unwrap();
        assert_eq!(bottom_right, Rect::new(1720, 980, 200, 100));
    }

    #[test]
    fn follow_cursor_without_pointer_uses_centre() {
        let region = CaptureRegion::FollowCursor(Size::new(200, 100));
        let rect = region.resolve(SCREEN, None).unwrap();
        assert_eq!(rect, Rect::new(860, 490, 200, 100));
    }

    #[test]
    fn oversized_or_empty_regions_are_rejected() {
        let big = CaptureRegion::Fixed(Rect::new(0, 0, 4000, 100));
        assert!(matches!(
            big.resolve(SCREEN, None),
            Err(RegionError::ExceedsScreen { .. })
        ));
        let empty = CaptureRegion::FollowCursor(Size::new(0, 100));
        assert_eq!(empty.frame_size(SCREEN), Err(RegionError::Empty));
    }

    #[test]
    fn parse_descriptors() {
        assert_eq!("full".parse::<CaptureRegion>().unwrap(), CaptureRegion::FullScreen);
        assert_eq!(
            "0,0,640x480".parse::<CaptureRegion>().unwrap(),
            CaptureRegion::Fixed(Rect::new(0, 0, 640, 480))
        );
        assert_eq!(
            "follow:320X240".parse::<CaptureRegion>().unwrap(),
            CaptureRegion::FollowCursor(Size::new(320, 240))
        );
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!("0,0".parse::<CaptureRegion>().is_err());
        assert!("0,0,640".parse::<CaptureRegion>().is_err());
        assert!("-1,0,640x480".parse::<CaptureRegion>().is_err());
        assert!("0,0,0x480".parse::<CaptureRegion>().is_err());
        assert!("follow:abc".parse::<CaptureRegion>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for text in ["full", "10,20,640x480", "follow:320x240"] {
            let region: CaptureRegion = text.parse().unwrap();
            assert_eq!(region.to_string(), text);
        }
    }
}
