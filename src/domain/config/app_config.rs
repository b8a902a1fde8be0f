//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::audio::{AudioSpec, DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE};
use crate::domain::capture::CaptureRegion;
use crate::domain::error::ConfigError;
use crate::domain::output::{Codec, Container, OutputTarget};
use crate::domain::recording::{Duration, FrameRate, PerformanceMode, QualityPreset};
use crate::domain::session::RecordingSettings;

/// Every key accepted in the config file, in display order
pub const CONFIG_KEYS: &[&str] = &[
    "output_dir",
    "quality",
    "fps",
    "region",
    "container",
    "codec",
    "audio",
    "audio_device",
    "sample_rate",
    "channels",
    "timestamp",
    "performance",
    "max_duration",
    "font_path",
    "ffmpeg_path",
    "notify",
];

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Output directory, or an explicit file path when set from the CLI
    pub output_dir: Option<String>,
    pub quality: Option<String>,
    pub fps: Option<u32>,
    pub region: Option<String>,
    pub container: Option<String>,
    pub codec: Option<String>,
    pub audio: Option<bool>,
    pub audio_device: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub timestamp: Option<bool>,
    pub performance: Option<String>,
    pub max_duration: Option<String>,
    pub font_path: Option<String>,
    pub ffmpeg_path: Option<String>,
    pub notify: Option<bool>,
}

fn invalid(key: &str, err: impl ToString) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: err.to_string(),
    }
}

/// Parse a boolean value
pub fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(()),
    }
}

fn parse_bool_key(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).map_err(|_| invalid(key, "Value must be 'true' or 'false'"))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, format!("'{}' is not a valid number", value)))
}

/// Platform video folder, falling back to `~/Videos`
pub fn default_output_dir() -> PathBuf {
    dirs::video_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Videos")))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        let preset = QualityPreset::default();
        Self {
            output_dir: Some(default_output_dir().to_string_lossy().to_string()),
            quality: Some(preset.to_string()),
            fps: None,
            region: Some(CaptureRegion::FullScreen.to_string()),
            container: Some(Container::default().to_string()),
            codec: None,
            audio: Some(false),
            audio_device: None,
            sample_rate: Some(DEFAULT_SAMPLE_RATE),
            channels: Some(DEFAULT_CHANNELS),
            timestamp: Some(true),
            performance: Some(PerformanceMode::default().to_string()),
            max_duration: None,
            font_path: None,
            ffmpeg_path: Some("ffmpeg".to_string()),
            notify: Some(false),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            output_dir: other.output_dir.or(self.output_dir),
            quality: other.quality.or(self.quality),
            fps: other.fps.or(self.fps),
            region: other.region.or(self.region),
            container: other.container.or(self.container),
            codec: other.codec.or(self.codec),
            audio: other.audio.or(self.audio),
            audio_device: other.audio_device.or(self.audio_device),
            sample_rate: other.sample_rate.or(self.sample_rate),
            channels: other.channels.or(self.channels),
            timestamp: other.timestamp.or(self.timestamp),
            performance: other.performance.or(self.performance),
            max_duration: other.max_duration.or(self.max_duration),
            font_path: other.font_path.or(self.font_path),
            ffmpeg_path: other.ffmpeg_path.or(self.ffmpeg_path),
            notify: other.notify.or(self.notify),
        }
    }

    /// Get quality as parsed preset, or default if not set/invalid
    pub fn quality_or_default(&self) -> QualityPreset {
        self.quality
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Get region as parsed descriptor, or full screen if not set/invalid
    pub fn region_or_default(&self) -> CaptureRegion {
        self.region
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn output_dir_or_default(&self) -> PathBuf {
        self.output_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_output_dir)
    }

    pub fn ffmpeg_path_or_default(&self) -> &str {
        self.ffmpeg_path.as_deref().unwrap_or("ffmpeg")
    }

    pub fn font_path(&self) -> Option<PathBuf> {
        self.font_path.as_ref().map(PathBuf::from)
    }

    /// Get audio setting, or false if not set
    pub fn audio_or_default(&self) -> bool {
        self.audio.unwrap_or(false)
    }

    /// Get timestamp overlay setting, or true if not set
    pub fn timestamp_or_default(&self) -> bool {
        self.timestamp.unwrap_or(true)
    }

    /// Get notify setting, or false if not set
    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(false)
    }

    /// Build validated session settings. Unlike the `*_or_default`
    /// accessors, a value that is set but invalid is an error.
    pub fn recording_settings(&self) -> Result<RecordingSettings, ConfigError> {
        let output = OutputTarget::from_path(self.output_dir_or_default());
        let file_target = matches!(output, OutputTarget::File(_));
        let mut settings = RecordingSettings::new(output);

        if let Some(quality) = &self.quality {
            settings.preset = quality.parse().map_err(|e| invalid("quality", e))?;
            settings.fps = settings.preset.frame_rate();
        }
        if let Some(fps) = self.fps {
            settings.fps = FrameRate::new(fps).map_err(|e| invalid("fps", e))?;
        }
        if let Some(region) = &self.region {
            settings.region = region.parse().map_err(|e| invalid("region", e))?;
        }
        if let Some(mode) = &self.performance {
            settings.performance = mode.parse().map_err(|e| invalid("performance", e))?;
        }
        // An explicit file name decides the container on its own
        if !file_target {
            if let Some(container) = &self.container {
                settings.container = container.parse().map_err(|e| invalid("container", e))?;
            }
        }
        settings.codec = match &self.codec {
            Some(codec) => codec.parse::<Codec>().map_err(|e| invalid("codec", e))?,
            None => Codec::default_for(settings.container),
        };
        if let Some(limit) = &self.max_duration {
            settings.max_duration =
                Some(limit.parse::<Duration>().map_err(|e| invalid("max_duration", e))?);
        }
        settings.timestamp = self.timestamp_or_default();

        if self.audio_or_default() {
            let mut spec = AudioSpec {
                device: self.audio_device.clone(),
                ..AudioSpec::default()
            };
            if let Some(rate) = self.sample_rate {
                if rate == 0 {
                    return Err(invalid("sample_rate", "must be greater than zero"));
                }
                spec.sample_rate = rate;
            }
            if let Some(channels) = self.channels {
                if channels == 0 {
                    return Err(invalid("channels", "must be greater than zero"));
                }
                spec.channels = channels;
            }
            settings.audio = Some(spec);
        }

        Ok(settings)
    }

    /// Validate and store `value` under `key`
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let text = || Some(value.trim().to_string());
        match key {
            "output_dir" => self.output_dir = text(),
            "quality" => {
                value
                    .parse::<QualityPreset>()
                    .map_err(|e| invalid(key, e))?;
                self.quality = text();
            }
            "fps" => {
                let fps = parse_number(key, value)?;
                FrameRate::new(fps).map_err(|e| invalid(key, e))?;
                self.fps = Some(fps);
            }
            "region" => {
                value.parse::<CaptureRegion>().map_err(|e| invalid(key, e))?;
                self.region = text();
            }
            "container" => {
                value.parse::<Container>().map_err(|e| invalid(key, e))?;
                self.container = text();
            }
            "codec" => {
                value.parse::<Codec>().map_err(|e| invalid(key, e))?;
                self.codec = text();
            }
            "audio" => self.audio = Some(parse_bool_key(key, value)?),
            "audio_device" => self.audio_device = text(),
            "sample_rate" => self.sample_rate = Some(parse_number(key, value)?),
            "channels" => self.channels = Some(parse_number(key, value)?),
            "timestamp" => self.timestamp = Some(parse_bool_key(key, value)?),
            "performance" => {
                value
                    .parse::<PerformanceMode>()
                    .map_err(|e| invalid(key, e))?;
                self.performance = text();
            }
            "max_duration" => {
                value.parse::<Duration>().map_err(|e| invalid(key, e))?;
                self.max_duration = text();
            }
            "font_path" => self.font_path = text(),
            "ffmpeg_path" => self.ffmpeg_path = text(),
            "notify" => self.notify = Some(parse_bool_key(key, value)?),
            _ => {
                return Err(invalid(
                    key,
                    format!("Unknown key. Valid keys: {}", CONFIG_KEYS.join(", ")),
                ))
            }
        }
        Ok(())
    }

    /// Current value of `key` as text; `Ok(None)` when unset
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let value = match key {
            "output_dir" => self.output_dir.clone(),
            "quality" => self.quality.clone(),
            "fps" => self.fps.map(|v| v.to_string()),
            "region" => self.region.clone(),
            "container" => self.container.clone(),
            "codec" => self.codec.clone(),
            "audio" => self.audio.map(|v| v.to_string()),
            "audio_device" => self.audio_device.clone(),
            "sample_rate" => self.sample_rate.map(|v| v.to_string()),
            "channels" => self.channels.map(|v| v.to_string()),
            "timestamp" => self.timestamp.map(|v| v.to_string()),
            "performance" => self.performance.clone(),
            "max_duration" => self.max_duration.clone(),
            "font_path" => self.font_path.clone(),
            "ffmpeg_path" => self.ffmpeg_path.clone(),
            "notify" => self.notify.map(|v| v.to_string()),
            _ => {
                return Err(invalid(
                    key,
                    format!("Unknown key. Valid keys: {}", CONFIG_KEYS.join(", ")),
                ))
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::capture::{Rect, Size};

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.quality, Some("high".to_string()));
        assert_eq!(config.region, Some("full".to_string()));
        assert_eq!(config.container, Some("mp4".to_string()));
        assert_eq!(config.audio, Some(false));
        assert_eq!(config.timestamp, Some(true));
        assert_eq!(config.performance, Some("smooth".to_string()));
        assert_eq!(config.ffmpeg_path_or_default(), "ffmpeg");
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        for key in CONFIG_KEYS {
            assert_eq!(config.get(key).unwrap(), None, "{key} should be unset");
        }
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            quality: Some("low".to_string()),
            fps: Some(10),
            audio: Some(true),
            ..Default::default()
        };
        let other = AppConfig {
            quality: Some("ultra".to_string()),
            fps: None,
            ..Default::default()
        };

        let merged = base.merge(other);

        assert_eq!(merged.quality, Some("ultra".to_string()));
        assert_eq!(merged.fps, Some(10));
        assert_eq!(merged.audio, Some(true));
    }

    #[test]
    fn lenient_accessors_fall_back() {
        let config = AppConfig {
            quality: Some("nonsense".to_string()),
            region: Some("0,0".to_string()),
            ..Default::default()
        };
        assert_eq!(config.quality_or_default(), QualityPreset::High);
        assert_eq!(config.region_or_default(), CaptureRegion::FullScreen);
        assert!(config.timestamp_or_default());
        assert!(!config.audio_or_default());
        assert!(!config.notify_or_default());
    }

    #[test]
    fn recording_settings_from_values() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig {
            output_dir: Some(tmp.path().to_string_lossy().to_string()),
            quality: Some("bluray".to_string()),
            region: Some("follow:320x240".to_string()),
            container: Some("mkv".to_string()),
            performance: Some("eco".to_string()),
            max_duration: Some("2m".to_string()),
            audio: Some(true),
            channels: Some(1),
            timestamp: Some(false),
            ..Default::default()
        };
        let settings = config.recording_settings().unwrap();
        assert_eq!(settings.preset, QualityPreset::Bluray);
        assert_eq!(settings.fps.get(), 60);
        assert_eq!(settings.region, CaptureRegion::FollowCursor(Size::new(320, 240)));
        assert_eq!(settings.container, Container::Mkv);
        assert_eq!(settings.codec, Codec::Avc1);
        assert_eq!(settings.performance, PerformanceMode::Eco);
        assert_eq!(settings.max_duration, Some(Duration::from_secs(120)));
        assert!(!settings.timestamp);
        let audio = settings.audio.unwrap();
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.sample_rate, DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn explicit_fps_overrides_preset() {
        let config = AppConfig {
            output_dir: Some("out".to_string()),
            quality: Some("low".to_string()),
            fps: Some(30),
            ..Default::default()
        };
        assert_eq!(config.recording_settings().unwrap().fps.get(), 30);
    }

    #[test]
    fn file_output_decides_container() {
        let config = AppConfig {
            output_dir: Some("clip.y4m".to_string()),
            container: Some("mp4".to_string()),
            region: Some("0,0,64x48".to_string()),
            ..Default::default()
        };
        let settings = config.recording_settings().unwrap();
        assert_eq!(settings.container, Container::Y4m);
        assert_eq!(settings.codec, Codec::I444);
        assert_eq!(settings.region, CaptureRegion::Fixed(Rect::new(0, 0, 64, 48)));
    }

    #[test]
    fn invalid_values_are_rejected_with_key() {
        let config = AppConfig {
            fps: Some(29),
            ..Default::default()
        };
        match config.recording_settings() {
            Err(ConfigError::ValidationError { key, .. }) => assert_eq!(key, "fps"),
            other => panic!("expected validation error, got {other:?}"),
        }

        let config = AppConfig {
            codec: Some("hevc".to_string()),
            ..Default::default()
        };
        assert!(config.recording_settings().is_err());
    }

    #[test]
    fn set_validates_and_get_reads_back() {
        let mut config = AppConfig::empty();
        config.set("fps", "24").unwrap();
        config.set("audio", "yes").unwrap();
        config.set("region", "10,10,100x100").unwrap();
        assert_eq!(config.get("fps").unwrap(), Some("24".to_string()));
        assert_eq!(config.get("audio").unwrap(), Some("true".to_string()));
        assert_eq!(config.get("region").unwrap(), Some("10,10,100x100".to_string()));

        assert!(config.set("fps", "23").is_err());
        assert!(config.set("audio", "maybe").is_err());
        assert!(config.set("quality", "4k").is_err());
        assert!(config.set("max_duration", "0s").is_err());
        assert!(config.set("bogus", "1").is_err());
        assert!(config.get("bogus").is_err());
    }

    #[test]
    fn parse_bool_values() {
        assert_eq!(parse_bool("true"), Ok(true));
        assert_eq!(parse_bool("No"), Ok(false));
        assert_eq!(parse_bool("1"), Ok(true));
        assert!(parse_bool("invalid").is_err());
    }
}
