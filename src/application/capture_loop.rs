//! Video capture loop: capture, composite, encode at a paced rate

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, error, info};

use super::compositor::OverlayCompositor;
use super::ports::{Clock, FrameSource, VideoSink};
use super::worker::{emit, EventSender, LoopControl, POLL_INTERVAL};
use crate::domain::annotation::AnnotationLayer;
use crate::domain::capture::CaptureRegion;
use crate::domain::recording::PacingController;
use crate::domain::session::{ErrorKind, StatusEvent};

/// Minimum recording time between two progress events
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Why the loop returned
#[derive(Debug, Clone, PartialEq)]
pub enum LoopExit {
    Stopped,
    DurationLimit,
    Failed { kind: ErrorKind, message: String },
}

/// What the loop hands back to the controller when it ends
pub struct LoopOutcome<K> {
    pub sink: K,
    pub frames: u64,
    /// Recording time, pauses excluded
    pub elapsed: Duration,
    pub exit: LoopExit,
}

/// One session's video loop. The sink is owned here and mutated by no
/// other thread until the outcome is returned.
pub struct CaptureLoop<F, K> {
    pub source: Arc<Mutex<F>>,
    pub sink: K,
    pub region: CaptureRegion,
    pub pacing: PacingController,
    pub compositor: Arc<OverlayCompositor>,
    pub annotations: AnnotationLayer,
    pub timestamp: bool,
    pub max_duration: Option<Duration>,
    pub clock: Arc<dyn Clock>,
    pub control: Arc<LoopControl>,
    pub events: EventSender,
    /// Told about the exit before the outcome is returned
    pub exit_notice: Option<Sender<LoopExit>>,
}

impl<F: FrameSource, K: VideoSink> CaptureLoop<F, K> {
    pub fn run(mut self) -> LoopOutcome<K> {
        let origin = self.clock.now();
        let mut paused_total = Duration::ZERO;
        let mut paused_since: Option<Duration> = None;
        let mut frames = 0u64;
        let mut last_progress = Duration::ZERO;
        self.pacing.restart_window(Duration::ZERO);

        let exit = loop {
            if self.control.stop_requested() {
                break LoopExit::Stopped;
            }

            if self.control.is_paused() {
                if paused_since.is_none() {
                    paused_since = Some(self.clock.now());
                }
                self.clock.sleep(POLL_INTERVAL);
                continue;
            }

            let iteration_start = self.clock.now();
            let recording_time =
                |now: Duration, paused: Duration| now.saturating_sub(origin).saturating_sub(paused);

            if let Some(since) = paused_since.take() {
                paused_total += iteration_start.saturating_sub(since);
                self.pacing
                    .restart_window(recording_time(iteration_start, paused_total));
            }

            let elapsed = recording_time(iteration_start, paused_total);
            self.control.set_elapsed(elapsed);

            if let Some(limit) = self.max_duration {
                if elapsed >= limit {
                    info!(limit_secs = limit.as_secs_f64(), "Recording reached its duration limit");
                    break LoopExit::DurationLimit;
                }
            }

            if self.pacing.next_iteration() {
                if let Err(exit) = self.process(frames, elapsed) {
                    break exit;
                }
                frames += 1;
                self.control.set_frames(frames);
                if let Some(fps) = self
                    .pacing
                    .record_frame(recording_time(self.clock.now(), paused_total))
                {
                    debug!(actual_fps = fps, frames, "Capture throughput");
                }
            }

            if elapsed.saturating_sub(last_progress) >= PROGRESS_INTERVAL {
                last_progress = elapsed;
                emit(
                    &self.events,
                    StatusEvent::Progress {
                        elapsed_secs: elapsed.as_secs_f64(),
                        frame_count: frames,
                        actual_fps: self.pacing.actual_fps(elapsed),
                        bytes_written: self.sink.bytes_written(),
                    },
                );
            }

            let processing = self.clock.now().saturating_sub(iteration_start);
            self.clock.sleep(self.pacing.sleep_duration(processing));
        };

        let end = self.clock.now();
        if let Some(since) = paused_since {
            paused_total += end.saturating_sub(since);
        }
        let elapsed = end.saturating_sub(origin).saturating_sub(paused_total);
        self.control.set_elapsed(elapsed);
        self.control.set_frames(frames);
        debug!(frames, elapsed_secs = elapsed.as_secs_f64(), exit = ?exit, "Capture loop finished");

        if let Some(notice) = &self.exit_notice {
            let _ = notice.send(exit.clone());
        }

        LoopOutcome {
            sink: self.sink,
            frames,
            elapsed,
            exit,
        }
    }

    fn process(&mut self, sequence: u64, elapsed: Duration) -> Result<(), LoopExit> {
        let frame = {
            let mut source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
            source.capture(&self.region, sequence, elapsed)
        }
        .map_err(|e| self.fail(ErrorKind::Capture, e.to_string()))?;

        let annotations = self.annotations.snapshot();
        let composed = self
            .compositor
            .composite(&frame, &annotations, self.timestamp.then_some(elapsed));

        self.sink
            .write(&composed)
            .map_err(|e| self.fail(ErrorKind::SinkUnavailable, e.to_string()))
    }

    fn fail(&self, kind: ErrorKind, message: String) -> LoopExit {
        error!(?kind, %message, "Capture loop failed");
        emit(
            &self.events,
            StatusEvent::Error {
                kind,
                message: message.clone(),
            },
        );
        LoopExit::Failed { kind, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ManualClock;
    use crate::application::testing::{CountingSink, PatternSource};
    use crate::domain::capture::{Rect, Size};
    use crate::domain::recording::{FrameRate, PerformanceMode};
    use std::sync::mpsc;
    use tokio::sync::mpsc::unbounded_channel;

    fn capture_loop(
        source: PatternSource,
        mode: PerformanceMode,
        limit: Duration,
        clock: Arc<ManualClock>,
        events: EventSender,
    ) -> CaptureLoop<PatternSource, CountingSink> {
        CaptureLoop {
            source: Arc::new(Mutex::new(source)),
            sink: CountingSink::new(Size::new(640, 480)),
            region: CaptureRegion::Fixed(Rect::new(0, 0, 640, 480)),
            pacing: PacingController::for_mode(FrameRate::new(10).unwrap(), mode),
            compositor: Arc::new(OverlayCompositor::with_bitmap_font()),
            annotations: AnnotationLayer::new(),
            timestamp: false,
            max_duration: Some(limit),
            clock,
            control: Arc::new(LoopControl::new()),
            events,
            exit_notice: None,
        }
    }

    #[test]
    fn ten_fps_for_two_simulated_seconds_writes_twenty_frames() {
        let (tx, mut rx) = unbounded_channel();
        let clock = Arc::new(ManualClock::new());
        let outcome = capture_loop(
            PatternSource::new(Size::new(1280, 720)),
            PerformanceMode::Smooth,
            Duration::from_secs(2),
            clock,
            tx,
        )
        .run();

        assert_eq!(outcome.exit, LoopExit::DurationLimit);
        assert_eq!(outcome.frames, 20);
        assert_eq!(outcome.sink.sequences(), (0..20).collect::<Vec<_>>());
        assert_eq!(outcome.elapsed, Duration::from_secs(2));

        let mut progress = 0;
        while let Ok(event) = rx.try_recv() {
            if let StatusEvent::Progress { frame_count, .. } = event {
                assert_eq!(frame_count, 11);
                progress += 1;
            }
        }
        assert_eq!(progress, 1);
    }

    #[test]
    fn frame_skip_halves_written_frames() {
        let (tx, _rx) = unbounded_channel();
        let outcome = capture_loop(
            PatternSource::new(Size::new(640, 480)),
            PerformanceMode::Eco,
            Duration::from_secs(2),
            Arc::new(ManualClock::new()),
            tx,
        )
        .run();
        assert_eq!(outcome.frames, 10);
    }

    #[test]
    fn capture_failure_ends_loop_with_error_event() {
        let (tx, mut rx) = unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::channel();
        let mut cl = capture_loop(
            PatternSource::new(Size::new(640, 480)).failing_after(3),
            PerformanceMode::Smooth,
            Duration::from_secs(10),
            Arc::new(ManualClock::new()),
            tx,
        );
        cl.exit_notice = Some(notice_tx);
        let outcome = cl.run();

        assert_eq!(outcome.frames, 3);
        assert!(matches!(outcome.exit, LoopExit::Failed { kind: ErrorKind::Capture, .. }));
        assert_eq!(notice_rx.try_recv().unwrap(), outcome.exit);
        let errors: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|e| matches!(e, StatusEvent::Error { kind: ErrorKind::Capture, .. }))
            .collect();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn stop_request_is_observed_before_capturing() {
        let (tx, _rx) = unbounded_channel();
        let cl = capture_loop(
            PatternSource::new(Size::new(640, 480)),
            PerformanceMode::Smooth,
            Duration::from_secs(10),
            Arc::new(ManualClock::new()),
            tx,
        );
        cl.control.request_stop();
        let outcome = cl.run();
        assert_eq!(outcome.exit, LoopExit::Stopped);
        assert_eq!(outcome.frames, 0);
    }

    #[test]
    fn paused_time_is_not_recorded() {
        let (tx, _rx) = unbounded_channel();
        let clock = Arc::new(ManualClock::new());
        let cl = capture_loop(
            PatternSource::new(Size::new(640, 480)),
            PerformanceMode::Smooth,
            Duration::from_secs(1),
            Arc::clone(&clock),
            tx,
        );
        let control = Arc::clone(&cl.control);
        control.set_paused(true);
        let handle = std::thread::spawn(move || cl.run());

        while clock.now() < Duration::from_secs(30) {
            std::thread::yield_now();
        }
        control.set_paused(false);
        let outcome = handle.join().unwrap();

        assert_eq!(outcome.exit, LoopExit::DurationLimit);
        assert_eq!(outcome.frames, 10);
        assert_eq!(outcome.elapsed, Duration::from_secs(1));
    }
}
