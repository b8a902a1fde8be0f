//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::domain::config::AppConfig;

/// HiVision - screen recorder with overlays and microphone capture
#[derive(Parser, Debug)]
#[command(name = "hivision")]
#[command(version)]
#[command(about = "Screen recorder with annotation overlays, microphone capture and ffmpeg muxing")]
#[command(long_about = None)]
pub struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record the screen until Ctrl+C or the duration limit
    Record(RecordArgs),
    /// Save a single PNG of the capture region
    Screenshot(ScreenshotArgs),
    /// List monitors and audio input devices
    Devices,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Where frames come from
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    /// A physical monitor
    #[default]
    Screen,
    /// Generated moving gradient, no display needed
    TestPattern,
}

/// Options shared by `record` and `screenshot`
#[derive(Args, Debug, Clone, Default)]
pub struct CaptureArgs {
    /// Capture region: full, X,Y,WxH or follow:WxH
    #[arg(short = 'r', long, value_name = "REGION")]
    pub region: Option<String>,

    /// Output file, or a directory for generated names
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// JSON list of annotation primitives drawn onto every frame
    #[arg(short = 'a', long, value_name = "FILE")]
    pub annotations: Option<PathBuf>,

    /// Frame source
    #[arg(long, value_enum, default_value_t = SourceArg::Screen)]
    pub source: SourceArg,

    /// Monitor to capture (default: primary)
    #[arg(short = 'm', long, value_name = "NAME")]
    pub monitor: Option<String>,
}

impl CaptureArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(region) = &self.region {
            config.region = Some(region.clone());
        }
        if let Some(output) = &self.output {
            config.output_dir = Some(output.to_string_lossy().to_string());
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct RecordArgs {
    #[command(flatten)]
    pub capture: CaptureArgs,

    /// Quality preset: low, medium, high, ultra, bluray
    #[arg(short = 'q', long, value_name = "PRESET")]
    pub quality: Option<String>,

    /// Frame rate (overrides the preset)
    #[arg(short = 'f', long, value_name = "FPS")]
    pub fps: Option<u32>,

    /// Performance mode: smooth, balanced, eco
    #[arg(short = 'p', long, value_name = "MODE")]
    pub performance: Option<String>,

    /// Container when writing into a directory: mp4, mkv, avi, webm, y4m
    #[arg(long, value_name = "EXT")]
    pub container: Option<String>,

    /// Video codec: avc1, mp4v, mjpg, xvid, vp80, i444
    #[arg(long, value_name = "FOURCC")]
    pub codec: Option<String>,

    /// Record microphone audio
    #[arg(long, overrides_with = "no_audio")]
    pub audio: bool,

    /// Record video only
    #[arg(long, overrides_with = "audio")]
    pub no_audio: bool,

    /// Audio input device name
    #[arg(long, value_name = "NAME")]
    pub audio_device: Option<String>,

    /// Hide the elapsed-time overlay
    #[arg(long)]
    pub no_timestamp: bool,

    /// Stop by itself after this much recording time (e.g. 30s, 10m)
    #[arg(short = 'd', long, value_name = "TIME")]
    pub max_duration: Option<String>,

    /// Show a desktop notification when the recording ends
    #[arg(short = 'n', long)]
    pub notify: bool,
}

impl RecordArgs {
    /// Flags as a config layer; unset flags stay `None`
    pub fn to_config(&self) -> AppConfig {
        let mut config = AppConfig {
            quality: self.quality.clone(),
            fps: self.fps,
            performance: self.performance.clone(),
            container: self.container.clone(),
            codec: self.codec.clone(),
            audio: if self.audio {
                Some(true)
            } else if self.no_audio {
                Some(false)
            } else {
                None
            },
            audio_device: self.audio_device.clone(),
            timestamp: if self.no_timestamp { Some(false) } else { None },
            max_duration: self.max_duration.clone(),
            notify: if self.notify { Some(true) } else { None },
            ..AppConfig::default()
        };
        self.capture.apply(&mut config);
        config
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ScreenshotArgs {
    #[command(flatten)]
    pub capture: CaptureArgs,
}

impl ScreenshotArgs {
    pub fn to_config(&self) -> AppConfig {
        let mut config = AppConfig {
            audio: Some(false),
            ..AppConfig::default()
        };
        self.capture.apply(&mut config);
        config
    }
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}
