//! Runners for the record, screenshot and devices commands

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::application::ports::{
    AudioDevice, CaptureError, ConfigStore, FrameSource, Notice, Notifier, Transcoder,
};
use crate::application::{
    ControllerConfig, EnvironmentCapabilities, OverlayCompositor, RecorderError,
    RecordingController,
};
use crate::domain::annotation::{parse_annotations, AnnotationPrimitive};
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::session::{StatusEvent, StopReason};
use crate::infrastructure::{
    create_notifier, list_monitors, resolve_font, CpalAudioDevice, FfmpegTranscoder,
    OutputSinkFactory, TestPatternSource, XcapSource, XdgConfigStore,
};

use super::args::{CaptureArgs, RecordArgs, ScreenshotArgs, SourceArg};
use super::presenter::Presenter;
use super::signals::{ControlSignal, ControlSignals};

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

type CliController =
    RecordingController<Box<dyn FrameSource>, OutputSinkFactory, CpalAudioDevice, FfmpegTranscoder>;

/// Failures that end a command before or instead of a recording
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cannot load annotations from {path}: {message}")]
    Annotations { path: PathBuf, message: String },

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Recorder(#[from] RecorderError),

    #[error("{0}")]
    Runtime(String),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Annotations { .. } => EXIT_USAGE_ERROR,
            Self::Recorder(RecorderError::Configuration(_)) => EXIT_USAGE_ERROR,
            _ => EXIT_ERROR,
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "warn,hivision=debug",
        _ => "debug,hivision=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Load and merge configuration: defaults < file < CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %store.path().display(), error = %e, "Ignoring config file");
            AppConfig::empty()
        }
    };

    AppConfig::defaults().merge(file_config).merge(cli_config)
}

async fn load_annotations(path: &Path) -> Result<Vec<AnnotationPrimitive>, AppError> {
    let failed = |message: String| AppError::Annotations {
        path: path.to_path_buf(),
        message,
    };
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| failed(e.to_string()))?;
    parse_annotations(&text).map_err(|e| failed(e.to_string()))
}

fn open_source(capture: &CaptureArgs) -> Result<Box<dyn FrameSource>, CaptureError> {
    Ok(match capture.source {
        SourceArg::Screen => Box::new(XcapSource::open(capture.monitor.as_deref())?),
        SourceArg::TestPattern => Box::new(TestPatternSource::default()),
    })
}

/// Wire the adapters into a controller
fn build_controller(
    config: &AppConfig,
    capture: &CaptureArgs,
) -> Result<(CliController, UnboundedReceiver<StatusEvent>), AppError> {
    let mut source = open_source(capture)?;
    let ffmpeg_path = config.ffmpeg_path_or_default().to_string();
    let audio = CpalAudioDevice::new();
    let transcoder = FfmpegTranscoder::new(ffmpeg_path.clone());
    let capabilities = EnvironmentCapabilities::detect(&mut source, &audio, &transcoder);
    debug!(source = source.name(), %capabilities, "Environment checked");

    let sinks = OutputSinkFactory::new(ffmpeg_path, capabilities.ffmpeg);
    let compositor = OverlayCompositor::new(resolve_font(config.font_path().as_deref()));
    let (tx, rx) = mpsc::unbounded_channel();
    let controller = RecordingController::new(
        source,
        sinks,
        audio,
        transcoder,
        capabilities,
        tx,
        ControllerConfig {
            compositor,
            ..ControllerConfig::default()
        },
    );
    Ok((controller, rx))
}

/// Run blocking controller work off the async runtime
async fn blocking<R, F>(f: F) -> Result<R, AppError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Runtime(format!("worker task failed: {e}")))
}

fn report(presenter: &mut Presenter, result: Result<u8, AppError>) -> ExitCode {
    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            presenter.clear_status();
            presenter.error(&e.to_string());
            ExitCode::from(e.exit_code())
        }
    }
}

/// Record until Ctrl+C, the duration limit, or a fatal error
pub async fn run_record(args: RecordArgs) -> ExitCode {
    let mut presenter = Presenter::new();
    let result = record(args, &mut presenter).await;
    report(&mut presenter, result)
}

async fn record(args: RecordArgs, presenter: &mut Presenter) -> Result<u8, AppError> {
    let config = load_merged_config(args.to_config()).await;
    let settings = config.recording_settings()?;
    let annotations = match &args.capture.annotations {
        Some(path) => load_annotations(path).await?,
        None => Vec::new(),
    };

    let (mut signals, _tx) = ControlSignals::install()
        .map_err(|e| AppError::Runtime(format!("Failed to setup signal handler: {e}")))?;
    let (controller, mut events) = build_controller(&config, &args.capture)?;
    controller.annotations().extend(annotations);
    let notifier = create_notifier(config.notify_or_default());

    let starter = controller.clone();
    blocking(move || starter.start(settings)).await??;
    presenter.start_status("Recording...");

    let mut stopping = false;
    let stopped = loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event @ StatusEvent::Stopped { .. }) => break Some(event),
                Some(event) => show_event(presenter, &event),
                None => break None,
            },
            Some(signal) = signals.recv() => match signal {
                ControlSignal::Stop if !stopping => {
                    stopping = true;
                    presenter.set_status("Finalizing...");
                    let stopper = controller.clone();
                    tokio::task::spawn_blocking(move || stopper.stop());
                }
                ControlSignal::Stop => debug!("Stop already in progress"),
                ControlSignal::TogglePause => {
                    let toggler = controller.clone();
                    if let Err(e) = blocking(move || toggler.toggle_pause()).await? {
                        presenter.warn(&e.to_string());
                    }
                }
                ControlSignal::Screenshot => {
                    let shooter = controller.clone();
                    if let Err(e) = blocking(move || shooter.screenshot()).await? {
                        debug!(error = %e, "Screenshot not taken");
                    }
                }
            },
        }
    };

    let Some(StatusEvent::Stopped {
        elapsed_secs,
        frame_count,
        average_fps,
        output_path,
        audio_merged,
        reason,
    }) = stopped
    else {
        presenter.finish(false, "Recorder went away");
        return Ok(EXIT_ERROR);
    };

    let summary = format!(
        "{} ({} frames, {:.1}s, {:.1} fps{})",
        output_path.display(),
        frame_count,
        elapsed_secs,
        average_fps,
        if audio_merged { ", with audio" } else { "" }
    );
    let code = match reason {
        StopReason::Failed => {
            presenter.finish(false, &format!("Recording failed: {summary}"));
            EXIT_ERROR
        }
        StopReason::DurationLimit => {
            presenter.finish(true, &format!("Duration limit reached: {summary}"));
            EXIT_SUCCESS
        }
        StopReason::Requested => {
            presenter.finish(true, &format!("Saved {summary}"));
            EXIT_SUCCESS
        }
    };
    presenter.output(&output_path.to_string_lossy());

    let notice = Notice::recording_finished(reason, &output_path, elapsed_secs);
    if let Err(e) = notifier.notify(&notice).await {
        warn!(error = %e, "Notification failed");
    }
    Ok(code)
}

fn show_event(presenter: &Presenter, event: &StatusEvent) {
    match event {
        StatusEvent::Started {
            output_path,
            width,
            height,
            fps,
            audio,
        } => {
            presenter.info(&format!(
                "Recording {}x{} at {} fps{} to {}",
                width,
                height,
                fps,
                if *audio { " with audio" } else { "" },
                output_path.display()
            ));
            #[cfg(unix)]
            presenter.info(&format!(
                "Ctrl+C stops; kill -USR1 {pid} pauses, kill -USR2 {pid} saves a screenshot",
                pid = std::process::id()
            ));
        }
        StatusEvent::Progress {
            elapsed_secs,
            frame_count,
            actual_fps,
            bytes_written,
        } => presenter.update_recording_progress(
            *elapsed_secs,
            *frame_count,
            *actual_fps,
            *bytes_written,
        ),
        StatusEvent::Paused { is_paused: true } => presenter.set_status("Paused"),
        StatusEvent::Paused { is_paused: false } => presenter.set_status("Resuming..."),
        StatusEvent::ScreenshotSaved { path } => {
            presenter.success(&format!("Screenshot saved: {}", path.display()))
        }
        StatusEvent::Error { kind, message } if kind.is_fatal() => presenter.error(message),
        StatusEvent::Error { message, .. } => presenter.warn(message),
        StatusEvent::Stopped { .. } => {}
    }
}

/// Save one PNG of the capture region
pub async fn run_screenshot(args: ScreenshotArgs) -> ExitCode {
    let mut presenter = Presenter::new();
    let result = screenshot(args, &presenter).await;
    report(&mut presenter, result)
}

async fn screenshot(args: ScreenshotArgs, presenter: &Presenter) -> Result<u8, AppError> {
    let config = load_merged_config(args.to_config()).await;
    let settings = config.recording_settings()?;
    let annotations = match &args.capture.annotations {
        Some(path) => load_annotations(path).await?,
        None => Vec::new(),
    };

    let (controller, _events) = build_controller(&config, &args.capture)?;
    controller.annotations().extend(annotations);
    let path = blocking(move || controller.take_screenshot(&settings)).await??;

    presenter.success("Screenshot saved");
    presenter.output(&path.to_string_lossy());
    Ok(EXIT_SUCCESS)
}

/// List monitors, audio inputs and encoder availability
pub async fn run_devices() -> ExitCode {
    let presenter = Presenter::new();
    let config = load_merged_config(AppConfig::empty()).await;

    presenter.heading("Monitors");
    match list_monitors() {
        Ok(monitors) => {
            for m in monitors {
                presenter.key_value(
                    &m.name,
                    &format!(
                        "{} at {},{}{}",
                        m.size,
                        m.x,
                        m.y,
                        if m.primary { " (primary)" } else { "" }
                    ),
                );
            }
        }
        Err(e) => presenter.warn(&e.to_string()),
    }

    presenter.heading("Audio inputs");
    let inputs = CpalAudioDevice::new().input_names();
    if inputs.is_empty() {
        presenter.warn("No audio input devices");
    }
    for name in inputs {
        presenter.output(&format!("  {name}"));
    }

    presenter.heading("Encoder");
    let ffmpeg = FfmpegTranscoder::new(config.ffmpeg_path_or_default());
    presenter.key_value(
        ffmpeg.program(),
        if ffmpeg.is_available() {
            "available"
        } else {
            "not found (only i444/.y4m recordings possible)"
        },
    );

    ExitCode::from(EXIT_SUCCESS)
}
