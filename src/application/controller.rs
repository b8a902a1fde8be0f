//! Recording controller: owns the session lifecycle and its worker threads

use std::fs;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use chrono::Local;
use image::ImageFormat;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::audio_pipeline::AudioCapturePipeline;
use super::capabilities::EnvironmentCapabilities;
use super::capture_loop::{CaptureLoop, LoopExit, LoopOutcome};
use super::compositor::OverlayCompositor;
use super::muxer::{AudioTrack, Muxer};
use super::ports::{
    AudioDevice, CaptureError, Clock, FrameSource, SinkError, SinkSpec, SystemClock, Transcoder,
    VideoSink, VideoSinkFactory,
};
use super::worker::{emit, join_bounded, EventSender, LoopControl};
use crate::domain::annotation::AnnotationLayer;
use crate::domain::audio::AudioSpec;
use crate::domain::capture::{CaptureRegion, Frame};
use crate::domain::error::ConfigurationError;
use crate::domain::output::{screenshot_basename, unique_path};
use crate::domain::recording::PacingController;
use crate::domain::session::{
    ErrorKind, InvalidStateTransition, RecorderLifecycle, RecorderState, RecordingSettings,
    StatusEvent, StopReason,
};

/// Bounded wait for each worker thread during stop
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors returned by controller operations
#[derive(Debug, Clone, Error)]
pub enum RecorderError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Video sink unavailable: {0}")]
    Sink(#[from] SinkError),

    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),

    #[error("Failed to save screenshot: {0}")]
    Screenshot(String),
}

impl RecorderError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) | Self::InvalidState(_) => ErrorKind::InvalidConfiguration,
            Self::Capture(_) | Self::Screenshot(_) => ErrorKind::Capture,
            Self::Sink(_) => ErrorKind::SinkUnavailable,
        }
    }

    /// Whether the error prevents or ends a recording session
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Capture(_) | Self::Sink(_))
    }
}

/// Tunables for a controller
pub struct ControllerConfig {
    pub clock: Arc<dyn Clock>,
    pub compositor: OverlayCompositor,
    /// Bounded wait for each worker during stop
    pub join_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock::new()),
            compositor: OverlayCompositor::with_bitmap_font(),
            join_timeout: JOIN_TIMEOUT,
        }
    }
}

/// Result of a finished session
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSummary {
    pub output_path: PathBuf,
    pub frames: u64,
    pub elapsed: Duration,
    pub average_fps: f64,
    pub audio_merged: bool,
    pub reason: StopReason,
}

struct ActiveSession<K> {
    id: u64,
    settings: RecordingSettings,
    output_path: PathBuf,
    control: Arc<LoopControl>,
    video: thread::JoinHandle<LoopOutcome<K>>,
    audio: AudioCapturePipeline,
}

struct SessionSlot<K> {
    lifecycle: RecorderLifecycle,
    session: Option<ActiveSession<K>>,
    next_id: u64,
}

struct Inner<F, S: VideoSinkFactory, A, T> {
    source: Arc<Mutex<F>>,
    sinks: S,
    audio: Arc<A>,
    muxer: Muxer<T>,
    clock: Arc<dyn Clock>,
    compositor: Arc<OverlayCompositor>,
    annotations: AnnotationLayer,
    capabilities: EnvironmentCapabilities,
    events: EventSender,
    join_timeout: Duration,
    slot: Mutex<SessionSlot<S::Sink>>,
}

/// Coordinates one recording session at a time.
///
/// State machine:
///   IDLE -> RECORDING (start)
///   RECORDING <-> PAUSED (pause / resume)
///   RECORDING | PAUSED -> STOPPING -> IDLE (stop, duration limit, fatal error)
///
/// Cloning yields another handle to the same controller.
pub struct RecordingController<F, S: VideoSinkFactory, A, T> {
    inner: Arc<Inner<F, S, A, T>>,
}

impl<F, S: VideoSinkFactory, A, T> Clone for RecordingController<F, S, A, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F, S, A, T> RecordingController<F, S, A, T>
where
    F: FrameSource + 'static,
    S: VideoSinkFactory + 'static,
    A: AudioDevice + 'static,
    T: Transcoder + 'static,
{
    pub fn new(
        source: F,
        sinks: S,
        audio: A,
        transcoder: T,
        capabilities: EnvironmentCapabilities,
        events: EventSender,
        config: ControllerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source: Arc::new(Mutex::new(source)),
                sinks,
                audio: Arc::new(audio),
                muxer: Muxer::new(transcoder),
                clock: config.clock,
                compositor: Arc::new(config.compositor),
                annotations: AnnotationLayer::new(),
                capabilities,
                events,
                join_timeout: config.join_timeout,
                slot: Mutex::new(SessionSlot {
                    lifecycle: RecorderLifecycle::new(),
                    session: None,
                    next_id: 0,
                }),
            }),
        }
    }

    pub fn state(&self) -> RecorderState {
        self.inner.slot().lifecycle.state()
    }

    pub fn capabilities(&self) -> EnvironmentCapabilities {
        self.inner.capabilities
    }

    /// Shared annotation list drawn onto every frame
    pub fn annotations(&self) -> AnnotationLayer {
        self.inner.annotations.clone()
    }

    /// Start a session and return the output path.
    ///
    /// Fails while another session is active, leaving it untouched. Any
    /// failure unwinds what was opened and leaves the controller idle.
    pub fn start(&self, settings: RecordingSettings) -> Result<PathBuf, RecorderError> {
        let result = self.try_start(settings);
        if let Err(e) = &result {
            error!(error = %e, "Failed to start recording");
            self.inner.report(e.kind(), e.to_string());
        }
        result
    }

    fn try_start(&self, settings: RecordingSettings) -> Result<PathBuf, RecorderError> {
        let inner = &self.inner;
        let mut slot = inner.slot();
        if slot.lifecycle.state().is_active() {
            return Err(ConfigurationError::AlreadyActive.into());
        }
        slot.lifecycle.begin()?;

        match self.open_session(&mut slot, settings) {
            Ok(path) => Ok(path),
            Err(e) => {
                slot.lifecycle.abort()?;
                Err(e)
            }
        }
    }

    fn open_session(
        &self,
        slot: &mut SessionSlot<S::Sink>,
        settings: RecordingSettings,
    ) -> Result<PathBuf, RecorderError> {
        let inner = &self.inner;

        // Validation: nothing is opened until all of it passes
        let screen = inner.lock_source().screen_size()?;
        let size = settings
            .region
            .frame_size(screen)
            .map_err(ConfigurationError::from)?;
        if !settings.container.accepts(settings.codec) {
            return Err(SinkError::IncompatibleContainer {
                codec: settings.codec,
                container: settings.container,
            }
            .into());
        }
        inner.capabilities.check_codec(settings.codec)?;
        if !inner.sinks.supports(settings.codec) {
            return Err(SinkError::UnsupportedCodec(settings.codec).into());
        }
        let output_path = settings.resolve_output_path(Local::now())?;

        let spec = SinkSpec {
            path: output_path.clone(),
            codec: settings.codec,
            container: settings.container,
            fps: settings.fps,
            size,
            encoding: settings.encoding(),
        };
        let mut sink = inner.sinks.open(&spec)?;
        debug!(path = %output_path.display(), %size, codec = %settings.codec, "Opened video sink");

        // The display must answer before the session counts as started
        if let Err(e) = inner.lock_source().capture(&settings.region, 0, Duration::ZERO) {
            discard_output(&mut sink, &output_path);
            return Err(e.into());
        }

        let audio = match &settings.audio {
            Some(spec) => inner.start_audio(spec),
            None => AudioCapturePipeline::idle(),
        };

        let id = slot.next_id;
        slot.next_id += 1;
        let control = Arc::new(LoopControl::new());
        let (exit_tx, exit_rx) = mpsc::channel();

        emit(
            &inner.events,
            StatusEvent::Started {
                output_path: output_path.clone(),
                width: size.width,
                height: size.height,
                fps: settings.fps.get(),
                audio: audio.is_running(),
            },
        );

        let capture_loop = CaptureLoop {
            source: Arc::clone(&inner.source),
            sink,
            region: settings.region,
            pacing: PacingController::for_mode(settings.fps, settings.performance),
            compositor: Arc::clone(&inner.compositor),
            annotations: inner.annotations.clone(),
            timestamp: settings.timestamp,
            max_duration: settings.max_duration.map(|d| d.as_std()),
            clock: Arc::clone(&inner.clock),
            control: Arc::clone(&control),
            events: inner.events.clone(),
            exit_notice: Some(exit_tx),
        };
        let video = match thread::Builder::new()
            .name("hivision-capture".into())
            .spawn(move || capture_loop.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                let mut audio = audio;
                audio.stop(inner.join_timeout);
                return Err(CaptureError::Backend(format!("cannot spawn capture thread: {e}")).into());
            }
        };

        self.spawn_supervisor(id, exit_rx);

        info!(
            path = %output_path.display(),
            %size,
            fps = settings.fps.get(),
            preset = %settings.preset,
            audio = audio.is_running(),
            "Recording started"
        );

        slot.session = Some(ActiveSession {
            id,
            settings,
            output_path: output_path.clone(),
            control,
            video,
            audio,
        });
        Ok(output_path)
    }

    /// Watches the capture loop and runs the stop sequence when it ends on
    /// its own (duration limit or fatal error).
    fn spawn_supervisor(&self, id: u64, exit_rx: mpsc::Receiver<LoopExit>) {
        let controller = self.clone();
        let spawned = thread::Builder::new()
            .name("hivision-supervisor".into())
            .spawn(move || {
                let reason = match exit_rx.recv() {
                    Ok(LoopExit::DurationLimit) => StopReason::DurationLimit,
                    Ok(LoopExit::Failed { .. }) => StopReason::Failed,
                    Ok(LoopExit::Stopped) | Err(_) => return,
                };
                controller.stop_session(Some(id), reason);
            });
        if let Err(e) = spawned {
            warn!(error = %e, "Cannot watch capture loop; duration limit needs an explicit stop");
        }
    }

    pub fn pause(&self) -> Result<(), RecorderError> {
        let mut slot = self.inner.slot();
        slot.lifecycle.pause()?;
        if let Some(session) = &slot.session {
            session.control.set_paused(true);
            session.audio.pause();
        }
        drop(slot);
        info!("Recording paused");
        emit(&self.inner.events, StatusEvent::Paused { is_paused: true });
        Ok(())
    }

    pub fn resume(&self) -> Result<(), RecorderError> {
        let mut slot = self.inner.slot();
        slot.lifecycle.resume()?;
        if let Some(session) = &slot.session {
            session.audio.resume();
            session.control.set_paused(false);
        }
        drop(slot);
        info!("Recording resumed");
        emit(&self.inner.events, StatusEvent::Paused { is_paused: false });
        Ok(())
    }

    /// Pause when recording, resume when paused
    pub fn toggle_pause(&self) -> Result<bool, RecorderError> {
        match self.state() {
            RecorderState::Paused => self.resume().map(|()| false),
            _ => self.pause().map(|()| true),
        }
    }

    /// Stop the active session and finalize its output.
    ///
    /// Returns `None` without emitting anything when idle or when another
    /// stop is already finalizing.
    pub fn stop(&self) -> Option<RecordingSummary> {
        self.stop_session(None, StopReason::Requested)
    }

    fn stop_session(&self, expected: Option<u64>, reason: StopReason) -> Option<RecordingSummary> {
        let session = {
            let mut slot = self.inner.slot();
            match &slot.session {
                Some(s) if expected.map_or(true, |id| id == s.id) => {}
                _ => return None,
            }
            if !slot.lifecycle.begin_stop() {
                return None;
            }
            slot.session.take()?
        };
        let summary = self.inner.finalize(session, reason);

        if let Err(e) = self.inner.slot().lifecycle.finish() {
            error!(error = %e, "Lifecycle out of sync after stop");
        }
        emit(
            &self.inner.events,
            StatusEvent::Stopped {
                elapsed_secs: summary.elapsed.as_secs_f64(),
                frame_count: summary.frames,
                average_fps: summary.average_fps,
                output_path: summary.output_path.clone(),
                audio_merged: summary.audio_merged,
                reason: summary.reason,
            },
        );
        Some(summary)
    }

    /// Capture the active region with overlays baked in and save it as PNG
    /// under the session's `Screenshots` directory.
    pub fn screenshot(&self) -> Result<PathBuf, RecorderError> {
        let (settings, sequence, elapsed) = {
            let slot = self.inner.slot();
            let Some(session) = &slot.session else {
                return Err(InvalidStateTransition {
                    current_state: slot.lifecycle.state(),
                    action: "take a screenshot".into(),
                }
                .into());
            };
            (
                session.settings.clone(),
                session.control.frames(),
                session.control.elapsed(),
            )
        };
        let stamp = settings.timestamp.then_some(elapsed);
        self.inner.save_still(&settings, sequence, stamp)
    }

    /// Screenshot without a recording session; no timestamp label is drawn
    pub fn take_screenshot(&self, settings: &RecordingSettings) -> Result<PathBuf, RecorderError> {
        self.inner.save_still(settings, 0, None)
    }
}

impl<F, S, A, T> Inner<F, S, A, T>
where
    F: FrameSource,
    S: VideoSinkFactory,
    A: AudioDevice + 'static,
    T: Transcoder,
{
    fn slot(&self) -> MutexGuard<'_, SessionSlot<S::Sink>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_source(&self) -> MutexGuard<'_, F> {
        self.source.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report(&self, kind: ErrorKind, message: String) {
        emit(&self.events, StatusEvent::Error { kind, message });
    }

    /// Audio problems never stop the recording; they downgrade it to
    /// video only.
    fn start_audio(&self, spec: &AudioSpec) -> AudioCapturePipeline {
        if !self.capabilities.audio_input {
            warn!("No audio input device; recording video only");
            self.report(ErrorKind::AudioDevice, "no audio input device available".into());
            return AudioCapturePipeline::idle();
        }
        match AudioCapturePipeline::start(Arc::clone(&self.audio), spec.clone(), self.events.clone()) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                warn!(error = %e, "Audio unavailable; recording video only");
                self.report(ErrorKind::AudioDevice, e.to_string());
                AudioCapturePipeline::idle()
            }
        }
    }

    fn finalize(&self, mut session: ActiveSession<S::Sink>, reason: StopReason) -> RecordingSummary {
        let control = &session.control;
        control.request_stop();
        control.set_paused(false);

        let (sink, frames, elapsed, reason) = match join_bounded(session.video, self.join_timeout) {
            Ok(Ok(outcome)) => {
                let reason = match outcome.exit {
                    LoopExit::Stopped => reason,
                    LoopExit::DurationLimit => StopReason::DurationLimit,
                    LoopExit::Failed { .. } => StopReason::Failed,
                };
                (Some(outcome.sink), outcome.frames, outcome.elapsed, reason)
            }
            Ok(Err(_)) => {
                error!("Capture thread panicked");
                self.report(ErrorKind::Finalization, "capture thread panicked".into());
                (None, control.frames(), control.elapsed(), StopReason::Failed)
            }
            Err(_detached) => {
                warn!(
                    timeout_secs = self.join_timeout.as_secs_f64(),
                    "Capture thread did not stop in time; finalizing anyway"
                );
                self.report(
                    ErrorKind::Finalization,
                    format!(
                        "capture loop did not stop within {:.1}s",
                        self.join_timeout.as_secs_f64()
                    ),
                );
                (None, control.frames(), control.elapsed(), reason)
            }
        };

        let chunks = session.audio.stop(self.join_timeout);

        let mut video_ok = sink.is_some();
        if let Some(mut sink) = sink {
            if let Err(e) = sink.close() {
                error!(error = %e, "Failed to finalize video");
                self.report(ErrorKind::SinkUnavailable, e.to_string());
                video_ok = false;
            }
        }

        let mut audio_merged = false;
        if video_ok && !chunks.is_empty() {
            let audio_spec = session.settings.audio.clone().unwrap_or_default();
            let track = AudioTrack {
                chunks: &chunks,
                sample_rate: audio_spec.sample_rate,
                channels: audio_spec.channels,
                bitrate_kbps: session.settings.encoding().audio_bitrate_kbps,
            };
            match self.muxer.merge(&session.output_path, track) {
                Ok(()) => audio_merged = true,
                Err(e) => {
                    warn!(error = %e, "Audio merge failed; keeping video-only file");
                    self.report(ErrorKind::MergeFailed, e.to_string());
                }
            }
        }

        let average_fps = if elapsed.is_zero() {
            0.0
        } else {
            frames as f64 / elapsed.as_secs_f64()
        };
        info!(
            path = %session.output_path.display(),
            frames,
            elapsed_secs = elapsed.as_secs_f64(),
            audio_merged,
            ?reason,
            "Recording stopped"
        );

        RecordingSummary {
            output_path: std::mem::take(&mut session.output_path),
            frames,
            elapsed,
            average_fps,
            audio_merged,
            reason,
        }
    }

    fn save_still(
        &self,
        settings: &RecordingSettings,
        sequence: u64,
        elapsed: Option<Duration>,
    ) -> Result<PathBuf, RecorderError> {
        let result = self.capture_still(&settings.region, sequence, elapsed).and_then(|frame| {
            let dir = settings.screenshot_dir();
            fs::create_dir_all(&dir).map_err(|e| RecorderError::Screenshot(e.to_string()))?;
            let path = unique_path(&dir, &screenshot_basename(Local::now()), "png");
            frame
                .image()
                .save_with_format(&path, ImageFormat::Png)
                .map_err(|e| RecorderError::Screenshot(e.to_string()))?;
            Ok(path)
        });

        match &result {
            Ok(path) => {
                info!(path = %path.display(), "Screenshot saved");
                emit(&self.events, StatusEvent::ScreenshotSaved { path: path.clone() });
            }
            Err(e) => {
                warn!(error = %e, "Screenshot failed");
                self.report(e.kind(), e.to_string());
            }
        }
        result
    }

    fn capture_still(
        &self,
        region: &CaptureRegion,
        sequence: u64,
        elapsed: Option<Duration>,
    ) -> Result<Frame, RecorderError> {
        let raw = self
            .lock_source()
            .capture(region, sequence, elapsed.unwrap_or_default())?;
        let annotations = self.annotations.snapshot();
        Ok(self.compositor.composite(&raw, &annotations, elapsed))
    }
}

/// Close a sink that never received a frame and remove its file
fn discard_output<K: VideoSink>(sink: &mut K, path: &std::path::Path) {
    if let Err(e) = sink.close() {
        debug!(error = %e, "Closing unused sink failed");
    }
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "Failed to remove unused output");
        }
    }
}
