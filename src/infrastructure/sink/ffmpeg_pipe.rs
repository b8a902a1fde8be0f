//! Video sink that pipes raw RGBA frames into an ffmpeg child process

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::Duration;

use tracing::{debug, warn};

use crate::application::ports::{check_frame_size, SinkError, SinkSpec, VideoSink};
use crate::domain::capture::{Frame, Size};
use crate::domain::output::Codec;
use crate::infrastructure::process::{wait_or_kill, StderrTail};

/// How long ffmpeg gets to finish writing after stdin closes
const FINALIZE_TIMEOUT: Duration = Duration::from_secs(10);
/// Grace period after an interrupt before the process is killed
const INTERRUPT_GRACE: Duration = Duration::from_secs(2);

/// Build ffmpeg arguments for encoding `spec` from rgba on stdin
pub(crate) fn build_ffmpeg_args(spec: &SinkSpec) -> Result<Vec<String>, SinkError> {
    let encoder = spec
        .codec
        .ffmpeg_encoder()
        .ok_or(SinkError::UnsupportedCodec(spec.codec))?;
    if !spec.container.accepts(spec.codec) {
        return Err(SinkError::IncompatibleContainer {
            codec: spec.codec,
            container: spec.container,
        });
    }

    let mut args: Vec<String> = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-y",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    args.extend([
        "-s".to_string(),
        spec.size.to_string(),
        "-r".to_string(),
        spec.fps.get().to_string(),
        "-i".to_string(),
        "-".to_string(),
        // yuv420p needs even dimensions
        "-vf".to_string(),
        "pad=ceil(iw/2)*2:ceil(ih/2)*2".to_string(),
        "-c:v".to_string(),
        encoder.to_string(),
    ]);

    let crf = spec.encoding.crf.to_string();
    let pix_fmt = match spec.codec {
        Codec::Avc1 => {
            args.extend(["-crf".into(), crf, "-preset".into(), spec.encoding.speed.into()]);
            "yuv420p"
        }
        Codec::Vp80 => {
            args.extend(["-crf".into(), crf, "-b:v".into(), "2M".into()]);
            "yuv420p"
        }
        Codec::Mjpg => {
            args.extend(["-q:v".into(), "3".into()]);
            "yuvj420p"
        }
        Codec::Xvid => {
            args.extend(["-q:v".into(), "5".into(), "-vtag".into(), "xvid".into()]);
            "yuv420p"
        }
        Codec::Mp4v | Codec::I444 => {
            args.extend(["-q:v".into(), "5".into()]);
            "yuv420p"
        }
    };
    args.extend([
        "-pix_fmt".to_string(),
        pix_fmt.to_string(),
        "-r".to_string(),
        spec.fps.get().to_string(),
        spec.path.to_string_lossy().into_owned(),
    ]);
    Ok(args)
}

/// Constant-frame-rate encoder backed by ffmpeg
pub struct FfmpegPipeSink {
    path: PathBuf,
    size: Size,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr: StderrTail,
    frames: u64,
}

impl FfmpegPipeSink {
    pub fn open(spec: &SinkSpec, ffmpeg_path: &str) -> Result<Self, SinkError> {
        let args = build_ffmpeg_args(spec)?;
        debug!(ffmpeg = ffmpeg_path, ?args, "Spawning encoder");

        let mut child = Command::new(ffmpeg_path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SinkError::EncoderNotFound(ffmpeg_path.to_string())
                } else {
                    SinkError::SpawnFailed(e.to_string())
                }
            })?;

        let stdin = child.stdin.take();
        let stderr = StderrTail::capture(&mut child, "hivision-ffmpeg-stderr");

        Ok(Self {
            path: spec.path.clone(),
            size: spec.size,
            child: Some(child),
            stdin,
            stderr,
            frames: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VideoSink for FfmpegPipeSink {
    fn write(&mut self, frame: &Frame) -> Result<(), SinkError> {
        check_frame_size(self.size, frame)?;
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| SinkError::WriteFailed("encoder input is closed".into()))?;
        if let Err(e) = stdin.write_all(frame.as_raw()) {
            let detail = self.stderr.text();
            return Err(SinkError::WriteFailed(if detail.is_empty() {
                e.to_string()
            } else {
                format!("{e}: {detail}")
            }));
        }
        self.frames += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        // EOF on stdin tells ffmpeg to flush and write the trailer
        drop(self.stdin.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        let Some(status) = wait_or_kill(&mut child, "encoder", FINALIZE_TIMEOUT, INTERRUPT_GRACE)
        else {
            return Err(SinkError::FinalizeFailed(format!(
                "encoder had to be stopped: {}",
                self.stderr.text()
            )));
        };

        if !status.success() {
            return Err(SinkError::FinalizeFailed(format!(
                "ffmpeg exited with {status}: {}",
                self.stderr.join()
            )));
        }
        debug!(path = %self.path.display(), frames = self.frames, "Encoder finished");
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Current size of the output file
    fn bytes_written(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}

impl Drop for FfmpegPipeSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            if let Err(e) = self.close() {
                warn!(error = %e, "Encoder closed with an error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::output::Container;
    use crate::domain::recording::{FrameRate, QualityPreset};

    fn spec(codec: Codec, container: Container) -> SinkSpec {
        SinkSpec {
            path: PathBuf::from(format!("/tmp/out.{}", container.extension())),
            codec,
            container,
            fps: FrameRate::new(30).unwrap(),
            size: Size::new(641, 480),
            encoding: QualityPreset::Ultra.params(),
        }
    }

    #[test]
    fn h264_args_carry_crf_and_preset() {
        let args = build_ffmpeg_args(&spec(Codec::Avc1, Container::Mp4)).unwrap();
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo -pix_fmt rgba -s 641x480 -r 30 -i -"));
        assert!(joined.contains("-c:v libx264 -crf 25 -preset fast"));
        assert!(joined.contains("-pix_fmt yuv420p"));
        assert!(joined.contains("pad=ceil(iw/2)*2:ceil(ih/2)*2"));
        assert_eq!(args.last().unwrap(), "/tmp/out.mp4");
    }

    #[test]
    fn mjpeg_uses_full_range() {
        let args = build_ffmpeg_args(&spec(Codec::Mjpg, Container::Avi)).unwrap();
        assert!(args.join(" ").contains("-c:v mjpeg -q:v 3 -pix_fmt yuvj420p"));
    }

    #[test]
    fn native_codec_is_not_piped() {
        assert!(matches!(
            build_ffmpeg_args(&spec(Codec::I444, Container::Y4m)),
            Err(SinkError::UnsupportedCodec(Codec::I444))
        ));
    }

    #[test]
    fn incompatible_container_is_rejected() {
        assert!(matches!(
            build_ffmpeg_args(&spec(Codec::Mjpg, Container::Mp4)),
            Err(SinkError::IncompatibleContainer { .. })
        ));
    }

    #[test]
    fn missing_binary_reports_encoder_not_found() {
        let err = FfmpegPipeSink::open(
            &spec(Codec::Avc1, Container::Mp4),
            "/nonexistent/hivision-ffmpeg",
        )
        .err()
        .unwrap();
        assert!(matches!(err, SinkError::EncoderNotFound(_)));
    }
}
