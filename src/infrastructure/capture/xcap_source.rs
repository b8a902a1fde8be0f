//! Monitor capture through xcap

use image::RgbaImage;
use tracing::debug;
use xcap::Monitor;

use super::pointer::PointerTracker;
use crate::application::ports::{CaptureError, FrameSource};
use crate::domain::capture::{crop_to_region, Point, Rect, Size};

/// Geometry of one attached monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorInfo {
    pub id: u32,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub size: Size,
    pub primary: bool,
}

fn backend(e: xcap::XCapError) -> CaptureError {
    CaptureError::Backend(e.to_string())
}

fn describe(monitor: &Monitor) -> Result<MonitorInfo, CaptureError> {
    Ok(MonitorInfo {
        id: monitor.id().map_err(backend)?,
        name: monitor.name().map_err(backend)?,
        x: monitor.x().map_err(backend)?,
        y: monitor.y().map_err(backend)?,
        size: Size::new(
            monitor.width().map_err(backend)?,
            monitor.height().map_err(backend)?,
        ),
        primary: monitor.is_primary().unwrap_or(false),
    })
}

/// All attached monitors
pub fn list_monitors() -> Result<Vec<MonitorInfo>, CaptureError> {
    let monitors = Monitor::all().map_err(|_| CaptureError::NoDisplay)?;
    monitors.iter().map(describe).collect()
}

/// Captures one monitor. Monitor handles are looked up per grab by id so
/// the source itself holds only plain data and can move between threads.
pub struct XcapSource {
    monitor: MonitorInfo,
    pointer: Option<PointerTracker>,
}

impl XcapSource {
    /// The named monitor, or the primary one (falling back to the first)
    pub fn open(name: Option<&str>) -> Result<Self, CaptureError> {
        let monitors = list_monitors()?;
        let monitor = match name {
            Some(wanted) => monitors
                .into_iter()
                .find(|m| m.name == wanted)
                .ok_or_else(|| CaptureError::MonitorNotFound(wanted.to_string()))?,
            None => {
                let primary = monitors.iter().position(|m| m.primary).unwrap_or(0);
                monitors.into_iter().nth(primary).ok_or(CaptureError::NoDisplay)?
            }
        };
        debug!(monitor = %monitor.name, size = %monitor.size, "Selected monitor");
        Ok(Self {
            monitor,
            pointer: None,
        })
    }

    pub fn monitor(&self) -> &MonitorInfo {
        &self.monitor
    }

    fn handle(&self) -> Result<Monitor, CaptureError> {
        Monitor::all()
            .map_err(|_| CaptureError::NoDisplay)?
            .into_iter()
            .find(|m| m.id().ok() == Some(self.monitor.id))
            .ok_or_else(|| CaptureError::MonitorNotFound(self.monitor.name.clone()))
    }
}

impl FrameSource for XcapSource {
    fn screen_size(&mut self) -> Result<Size, CaptureError> {
        Ok(self.monitor.size)
    }

    /// Pointer position relative to this monitor's origin
    fn pointer(&mut self) -> Option<Point> {
        let tracker = self.pointer.get_or_insert_with(PointerTracker::spawn);
        tracker
            .position()
            .map(|p| Point::new(p.x - self.monitor.x, p.y - self.monitor.y))
    }

    fn grab(&mut self, rect: Rect) -> Result<RgbaImage, CaptureError> {
        let screen = self.handle()?.capture_image().map_err(backend)?;
        Ok(crop_to_region(&screen, rect))
    }

    fn name(&self) -> &'static str {
        "xcap"
    }
}
