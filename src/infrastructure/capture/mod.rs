//! Screen sources
//!
//! - [`XcapSource`]: a physical monitor through xcap, with the pointer
//!   position read through enigo for follow-cursor regions
//! - [`TestPatternSource`]: a generated moving gradient for headless runs

mod pattern;
mod pointer;
mod xcap_source;

pub use pattern::TestPatternSource;
pub use pointer::PointerTracker;
pub use xcap_source::{list_monitors, MonitorInfo, XcapSource};
