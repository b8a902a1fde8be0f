//! Quality presets, frame rates and performance modes

use std::fmt;
use std::str::FromStr;

use crate::domain::error::{InvalidFrameRateError, InvalidPerformanceModeError, InvalidPresetError};

/// All presets, ordered from lowest to highest quality
pub const ALL_PRESETS: &[QualityPreset] = &[
    QualityPreset::Low,
    QualityPreset::Medium,
    QualityPreset::High,
    QualityPreset::Ultra,
    QualityPreset::Bluray,
];

/// Frame rates a recording may target
pub const SUPPORTED_FPS: &[u32] = &[5, 10, 15, 20, 24, 25, 30, 50, 60];

/// Encoding parameters bundled by a preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingParams {
    pub fps: u32,
    /// x264-style constant rate factor (lower is better)
    pub crf: u8,
    /// Encoder speed preset passed to ffmpeg
    pub speed: &'static str,
    /// Audio bitrate in kbit/s used when muxing
    pub audio_bitrate_kbps: u32,
}

/// Named bundle of frame rate and encoding parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum QualityPreset {
    Low,
    Medium,
    #[default]
    High,
    Ultra,
    Bluray,
}

impl QualityPreset {
    /// Encoding parameters for this preset
    pub const fn params(&self) -> EncodingParams {
        match self {
            Self::Low => EncodingParams {
                fps: 15,
                crf: 32,
                speed: "veryfast",
                audio_bitrate_kbps: 32,
            },
            Self::Medium => EncodingParams {
                fps: 15,
                crf: 30,
                speed: "ultrafast",
                audio_bitrate_kbps: 64,
            },
            Self::High => EncodingParams {
                fps: 25,
                crf: 27,
                speed: "fast",
                audio_bitrate_kbps: 96,
            },
            Self::Ultra => EncodingParams {
                fps: 30,
                crf: 25,
                speed: "fast",
                audio_bitrate_kbps: 128,
            },
            Self::Bluray => EncodingParams {
                fps: 60,
                crf: 18,
                speed: "medium",
                audio_bitrate_kbps: 256,
            },
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Ultra => "ultra",
            Self::Bluray => "bluray",
        }
    }

    /// The preset's own frame rate (always a supported one)
    pub const fn frame_rate(&self) -> FrameRate {
        FrameRate(self.params().fps)
    }

    /// The next preset in order, wrapping from bluray back to low
    pub fn next(&self) -> Self {
        let idx = ALL_PRESETS.iter().position(|p| p == self).unwrap_or(0);
        ALL_PRESETS[(idx + 1) % ALL_PRESETS.len()]
    }
}

impl FromStr for QualityPreset {
    type Err = InvalidPresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "sd" => Ok(Self::Low),
            "medium" | "smooth" => Ok(Self::Medium),
            "high" | "hd" => Ok(Self::High),
            "ultra" | "fhd" => Ok(Self::Ultra),
            "bluray" | "uhd" => Ok(Self::Bluray),
            _ => Err(InvalidPresetError {
                input: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A frame rate drawn from [`SUPPORTED_FPS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRate(u32);

impl FrameRate {
    pub fn new(fps: u32) -> Result<Self, InvalidFrameRateError> {
        if SUPPORTED_FPS.contains(&fps) {
            Ok(Self(fps))
        } else {
            Err(InvalidFrameRateError { fps })
        }
    }

    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Time between two frames at this rate
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_nanos(1_000_000_000 / self.0 as u64)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade-off between CPU load and capture smoothness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PerformanceMode {
    #[default]
    Smooth,
    Balanced,
    Eco,
}

impl PerformanceMode {
    /// Fraction of the ideal sleep actually applied
    pub const fn throttle_factor(&self) -> f64 {
        match self {
            Self::Smooth => 1.0,
            Self::Balanced => 0.9,
            Self::Eco => 1.0,
        }
    }

    /// Iterations skipped out of every `skip + 1`
    pub const fn frame_skip(&self) -> u32 {
        match self {
            Self::Smooth | Self::Balanced => 0,
            Self::Eco => 1,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Smooth => "smooth",
            Self::Balanced => "balanced",
            Self::Eco => "eco",
        }
    }
}

impl FromStr for PerformanceMode {
    type Err = InvalidPerformanceModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "smooth" => Ok(Self::Smooth),
            "balanced" => Ok(Self::Balanced),
            "eco" => Ok(Self::Eco),
            _ => Err(InvalidPerformanceModeError {
                input: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for PerformanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_ordered_low_to_bluray() {
        let fps: Vec<u32> = ALL_PRESETS.iter().map(|p| p.params().fps).collect();
        assert_eq!(fps, vec![15, 15, 25, 30, 60]);
        let crf: Vec<u8> = ALL_PRESETS.iter().map(|p| p.params().crf).collect();
        assert!(crf.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn preset_parses_names_and_legacy_aliases() {
        assert_eq!("bluray".parse::<QualityPreset>().unwrap(), QualityPreset::Bluray);
        assert_eq!("UHD".parse::<QualityPreset>().unwrap(), QualityPreset::Bluray);
        assert_eq!("hd".parse::<QualityPreset>().unwrap(), QualityPreset::High);
        assert!("4k".parse::<QualityPreset>().is_err());
    }

    #[test]
    fn preset_next_wraps() {
        assert_eq!(QualityPreset::Low.next(), QualityPreset::Medium);
        assert_eq!(QualityPreset::Bluray.next(), QualityPreset::Low);
    }

    #[test]
    fn frame_rate_accepts_only_supported_values() {
        assert_eq!(FrameRate::new(30).unwrap().get(), 30);
        assert!(FrameRate::new(0).is_err());
        assert!(FrameRate::new(29).is_err());
    }

    #[test]
    fn preset_rates_are_supported() {
        for preset in ALL_PRESETS {
            assert!(FrameRate::new(preset.frame_rate().get()).is_ok());
        }
    }

    #[test]
    fn frame_rate_interval() {
        let rate = FrameRate::new(10).unwrap();
        assert_eq!(rate.interval(), std::time::Duration::from_millis(100));
    }

    #[test]
    fn performance_modes() {
        assert_eq!(PerformanceMode::default().throttle_factor(), 1.0);
        assert_eq!(PerformanceMode::default().frame_skip(), 0);
        assert_eq!("eco".parse::<PerformanceMode>().unwrap().frame_skip(), 1);
        assert!("turbo".parse::<PerformanceMode>().is_err());
    }
}
