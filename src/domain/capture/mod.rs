//! Capture geometry and frames

mod frame;
mod region;

pub use frame::{crop_to_region, Frame};
pub use region::{CaptureRegion, Point, Rect, RegionError, Size};
