//! Validated parameters for one recording session

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::domain::audio::AudioSpec;
use crate::domain::capture::CaptureRegion;
use crate::domain::error::ConfigurationError;
use crate::domain::output::{recording_basename, unique_path, Codec, Container, OutputTarget};
use crate::domain::recording::{Duration, EncodingParams, FrameRate, PerformanceMode, QualityPreset};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSettings {
    pub region: CaptureRegion,
    pub preset: QualityPreset,
    /// Target rate; overrides the preset's own fps
    pub fps: FrameRate,
    pub performance: PerformanceMode,
    pub output: OutputTarget,
    pub container: Container,
    pub codec: Codec,
    /// `None` records video only
    pub audio: Option<AudioSpec>,
    pub timestamp: bool,
    pub max_duration: Option<Duration>,
}

impl RecordingSettings {
    /// Defaults for the given output target: full screen, `high`, mp4/avc1
    /// (or the container implied by a file path), no audio.
    pub fn new(output: OutputTarget) -> Self {
        let preset = QualityPreset::default();
        let container = match &output {
            OutputTarget::File(path) => Container::from_path(path).unwrap_or_default(),
            OutputTarget::Directory(_) => Container::default(),
        };
        Self {
            region: CaptureRegion::FullScreen,
            preset,
            fps: preset.frame_rate(),
            performance: PerformanceMode::default(),
            output,
            container,
            codec: Codec::default_for(container),
            audio: None,
            timestamp: true,
            max_duration: None,
        }
    }

    /// Preset parameters with the session's fps applied
    pub fn encoding(&self) -> EncodingParams {
        EncodingParams {
            fps: self.fps.get(),
            ..self.preset.params()
        }
    }

    /// Concrete output file for a session starting at `now`.
    ///
    /// A file target must carry a supported extension and live in an
    /// existing directory. A directory target is created when missing and
    /// gets a timestamped name with a collision suffix.
    pub fn resolve_output_path(&self, now: DateTime<Local>) -> Result<PathBuf, ConfigurationError> {
        match &self.output {
            OutputTarget::File(path) => {
                if path.is_dir() {
                    return Err(ConfigurationError::OutputPath(format!(
                        "{} is a directory",
                        path.display()
                    )));
                }
                if Container::from_path(path).is_none() {
                    return Err(ConfigurationError::OutputPath(format!(
                        "{} has no supported container extension",
                        path.display()
                    )));
                }
                let parent = self.output.directory();
                if !parent.is_dir() {
                    return Err(ConfigurationError::OutputPath(format!(
                        "directory {} does not exist",
                        parent.display()
                    )));
                }
                Ok(path.clone())
            }
            OutputTarget::Directory(dir) => {
                fs::create_dir_all(dir).map_err(|e| {
                    ConfigurationError::OutputPath(format!("cannot create {}: {}", dir.display(), e))
                })?;
                Ok(unique_path(
                    dir,
                    &recording_basename(self.preset, now),
                    self.container.extension(),
                ))
            }
        }
    }

    /// `<output dir>/Screenshots`
    pub fn screenshot_dir(&self) -> PathBuf {
        self.output.directory().join("Screenshots")
    }
}
