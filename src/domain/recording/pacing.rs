//! Frame pacing and throughput estimation for the capture loop

use std::time::Duration;

use super::preset::{FrameRate, PerformanceMode};

/// Processed frames per actual-FPS sampling window
pub const FPS_WINDOW_FRAMES: u32 = 30;

/// Decides how long the capture loop sleeps between iterations, which
/// iterations are skipped, and keeps a rolling actual-FPS estimate.
///
/// Time is passed in explicitly (as an offset from an arbitrary origin) so
/// the controller stays independent of any particular clock.
#[derive(Debug, Clone)]
pub struct PacingController {
    interval: Duration,
    throttle: f64,
    skip: u32,
    iteration: u64,
    window_start: Option<Duration>,
    window_frames: u32,
    actual_fps: f64,
}

impl PacingController {
    /// Create a controller for `fps` with an explicit throttle factor and
    /// frame-skip count. The throttle factor is clamped to `0.0..=1.0`.
    pub fn new(fps: FrameRate, throttle_factor: f64, frame_skip: u32) -> Self {
        let throttle = if throttle_factor.is_finite() {
            throttle_factor.clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self {
            interval: fps.interval(),
            throttle,
            skip: frame_skip,
            iteration: 0,
            window_start: None,
            window_frames: 0,
            actual_fps: 0.0,
        }
    }

    /// Create a controller using a named performance mode
    pub fn for_mode(fps: FrameRate, mode: PerformanceMode) -> Self {
        Self::new(fps, mode.throttle_factor(), mode.frame_skip())
    }

    /// Ideal time between two iterations
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// `max(0, interval - processing) * throttle`
    pub fn sleep_duration(&self, processing: Duration) -> Duration {
        let remaining = self.interval.saturating_sub(processing);
        if self.throttle >= 1.0 {
            remaining
        } else {
            remaining.mul_f64(self.throttle)
        }
    }

    /// Advance to the next iteration and report whether it should capture
    /// and encode. With skip N, one iteration in every N + 1 is processed.
    pub fn next_iteration(&mut self) -> bool {
        let process = self.iteration % (self.skip as u64 + 1) == 0;
        self.iteration += 1;
        process
    }

    /// Mark the start of a measuring window (recording start or resume).
    pub fn restart_window(&mut self, now: Duration) {
        self.window_start = Some(now);
        self.window_frames = 0;
    }

    /// Record one processed frame finished at `now`. Returns the fresh
    /// estimate whenever a sampling window closes.
    pub fn record_frame(&mut self, now: Duration) -> Option<f64> {
        let start = *self.window_start.get_or_insert(now);
        self.window_frames += 1;

        if self.window_frames < FPS_WINDOW_FRAMES {
            return None;
        }

        let span = now.saturating_sub(start).as_secs_f64();
        if span > 0.0 {
            self.actual_fps = self.window_frames as f64 / span;
        }
        self.window_start = Some(now);
        self.window_frames = 0;
        Some(self.actual_fps)
    }

    /// Latest actual-FPS estimate. Before the first window closes this is
    /// the rate observed so far in the open window.
    pub fn actual_fps(&self, now: Duration) -> f64 {
        if self.actual_fps > 0.0 {
            return self.actual_fps;
        }
        match self.window_start {
            Some(start) if now > start => self.window_frames as f64 / (now - start).as_secs_f64(),
            _ => 0.0,
        }
    }
}
