//! Output container, codec and file naming

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local};

use crate::domain::error::InvalidCodecError;
use crate::domain::recording::QualityPreset;

/// Video codec identifier (FourCC style)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    Avc1,
    Mp4v,
    Mjpg,
    Xvid,
    Vp80,
    /// Uncompressed 4:4:4 YUV written natively as YUV4MPEG2
    I444,
}

impl Codec {
    pub const fn fourcc(&self) -> &'static str {
        match self {
            Self::Avc1 => "avc1",
            Self::Mp4v => "mp4v",
            Self::Mjpg => "mjpg",
            Self::Xvid => "xvid",
            Self::Vp80 => "vp80",
            Self::I444 => "i444",
        }
    }

    /// ffmpeg encoder name, `None` for natively written codecs
    pub const fn ffmpeg_encoder(&self) -> Option<&'static str> {
        match self {
            Self::Avc1 => Some("libx264"),
            Self::Mp4v | Self::Xvid => Some("mpeg4"),
            Self::Mjpg => Some("mjpeg"),
            Self::Vp80 => Some("libvpx"),
            Self::I444 => None,
        }
    }

    /// Whether the encoder honours `-crf` and `-preset`
    pub const fn supports_crf(&self) -> bool {
        matches!(self, Self::Avc1)
    }

    /// Codec used when only a container is given
    pub const fn default_for(container: Container) -> Self {
        match container {
            Container::Mp4 | Container::Mkv | Container::Mov => Self::Avc1,
            Container::Avi => Self::Mjpg,
            Container::Webm => Self::Vp80,
            Container::Y4m => Self::I444,
        }
    }
}

impl FromStr for Codec {
    type Err = InvalidCodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "avc1" | "h264" | "x264" => Ok(Self::Avc1),
            "mp4v" => Ok(Self::Mp4v),
            "mjpg" | "mjpeg" => Ok(Self::Mjpg),
            "xvid" => Ok(Self::Xvid),
            "vp80" | "vp8" => Ok(Self::Vp80),
            "i444" => Ok(Self::I444),
            _ => Err(InvalidCodecError {
                input: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fourcc())
    }
}

/// Output container, identified by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Container {
    #[default]
    Mp4,
    Mkv,
    Mov,
    Avi,
    Webm,
    Y4m,
}

impl Container {
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mkv => "mkv",
            Self::Mov => "mov",
            Self::Avi => "avi",
            Self::Webm => "webm",
            Self::Y4m => "y4m",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "mp4" => Some(Self::Mp4),
            "mkv" => Some(Self::Mkv),
            "mov" => Some(Self::Mov),
            "avi" => Some(Self::Avi),
            "webm" => Some(Self::Webm),
            "y4m" => Some(Self::Y4m),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether `codec` can be stored in this container
    pub const fn accepts(&self, codec: Codec) -> bool {
        match (self, codec) {
            (Self::Y4m, Codec::I444) => true,
            (Self::Y4m, _) | (_, Codec::I444) => false,
            (Self::Webm, Codec::Vp80) => true,
            (Self::Webm, _) => false,
            (Self::Mp4 | Self::Mov, Codec::Mjpg | Codec::Xvid | Codec::Vp80) => false,
            _ => true,
        }
    }

    /// Whether an audio track can be merged in by stream-copying the video.
    /// YUV4MPEG2 carries video only.
    pub const fn supports_audio(&self) -> bool {
        !matches!(self, Self::Y4m)
    }
}

impl FromStr for Container {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| {
            format!("Unsupported container \"{s}\". Supported containers are: mp4, mkv, mov, avi, webm, y4m")
        })
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Where the recording should be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Exact file path
    File(PathBuf),
    /// Directory in which a timestamped name is generated
    Directory(PathBuf),
}

impl OutputTarget {
    /// Paths with an extension are files, everything else a directory
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() || path.extension().is_none() {
            Self::Directory(path)
        } else {
            Self::File(path)
        }
    }

    /// Directory that holds the output (and its `Screenshots` folder)
    pub fn directory(&self) -> PathBuf {
        match self {
            Self::Directory(dir) => dir.clone(),
            Self::File(file) => file
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

/// `screen_record_<preset>_<YYYYmmdd_HHMMSS>` (no extension)
pub fn recording_basename(preset: QualityPreset, at: DateTime<Local>) -> String {
    format!("screen_record_{}_{}", preset, at.format("%Y%m%d_%H%M%S"))
}

/// `screenshot_<YYYYmmdd_HHMMSS_mmm>` (no extension)
pub fn screenshot_basename(at: DateTime<Local>) -> String {
    format!("screenshot_{}", at.format("%Y%m%d_%H%M%S_%3f"))
}

/// First of `base.ext`, `base_1.ext`, `base_2.ext`, ... that does not exist
pub fn unique_path(dir: &Path, base: &str, ext: &str) -> PathBuf {
    let candidate = dir.join(format!("{base}.{ext}"));
    if !candidate.exists() {
        return candidate;
    }
    (1u32..)
        .map(|n| dir.join(format!("{base}_{n}.{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn codec_aliases() {
        assert_eq!("h264".parse::<Codec>().unwrap(), Codec::Avc1);
        assert_eq!("MJPEG".parse::<Codec>().unwrap(), Codec::Mjpg);
        assert!("hevc".parse::<Codec>().is_err());
    }

    #[test]
    fn container_codec_compatibility() {
        assert!(Container::Mp4.accepts(Codec::Avc1));
        assert!(Container::Avi.accepts(Codec::Xvid));
        assert!(Container::Webm.accepts(Codec::Vp80));
        assert!(Container::Y4m.accepts(Codec::I444));
        assert!(!Container::Mp4.accepts(Codec::Mjpg));
        assert!(!Container::Webm.accepts(Codec::Avc1));
        assert!(!Container::Mkv.accepts(Codec::I444));
        assert!(!Container::Y4m.accepts(Codec::Avc1));
    }

    #[test]
    fn default_codec_is_accepted_by_its_container() {
        for container in [
            Container::Mp4,
            Container::Mkv,
            Container::Mov,
            Container::Avi,
            Container::Webm,
            Container::Y4m,
        ] {
            assert!(container.accepts(Codec::default_for(container)));
        }
    }

    #[test]
    fn container_from_path() {
        assert_eq!(Container::from_path(Path::new("/tmp/a.MKV")), Some(Container::Mkv));
        assert_eq!(Container::from_path(Path::new("/tmp/a")), None);
    }

    #[test]
    fn basename_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            recording_basename(QualityPreset::High, at),
            "screen_record_high_20240309_140507"
        );
    }

    #[test]
    fn unique_path_adds_collision_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let first = unique_path(dir.path(), "rec", "mp4");
        assert_eq!(first, dir.path().join("rec.mp4"));
        std::fs::write(&first, b"x").unwrap();
        let second = unique_path(dir.path(), "rec", "mp4");
        assert_eq!(second, dir.path().join("rec_1.mp4"));
        std::fs::write(&second, b"x").unwrap();
        assert_eq!(unique_path(dir.path(), "rec", "mp4"), dir.path().join("rec_2.mp4"));
    }

    #[test]
    fn output_target_classification() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            OutputTarget::from_path(dir.path()),
            OutputTarget::Directory(dir.path().to_path_buf())
        );
        let file = dir.path().join("out.mp4");
        assert_eq!(OutputTarget::from_path(&file), OutputTarget::File(file.clone()));
        assert_eq!(OutputTarget::File(file).directory(), dir.path());
        assert_eq!(
            OutputTarget::File(PathBuf::from("clip.mp4")).directory(),
            PathBuf::from(".")
        );
    }
}
