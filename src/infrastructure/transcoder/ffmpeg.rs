//! Audio/video merge through the ffmpeg command-line tool

use std::process::{Command, Stdio};
use std::time::Duration;

use tracing::debug;

use crate::application::ports::{MergeError, MergeRequest, Transcoder};
use crate::domain::output::Container;
use crate::infrastructure::process::{wait_or_kill, StderrTail};

/// Upper bound on one merge run
const MERGE_TIMEOUT: Duration = Duration::from_secs(300);
/// Grace period after an interrupt before the process is killed
const INTERRUPT_GRACE: Duration = Duration::from_secs(2);

/// Runs `ffmpeg` to combine a video with a WAV track
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: String,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: MERGE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Video is stream-copied; audio is encoded for the output container
    fn build_merge_args(request: &MergeRequest) -> Vec<String> {
        let audio_codec = match Container::from_path(&request.output) {
            Some(Container::Webm) => "libopus",
            Some(Container::Avi) => "libmp3lame",
            _ => "aac",
        };
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            request.video.to_string_lossy().into_owned(),
            "-i".to_string(),
            request.audio.to_string_lossy().into_owned(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            audio_codec.to_string(),
            "-b:a".to_string(),
            format!("{}k", request.audio_bitrate_kbps),
            "-shortest".to_string(),
            request.output.to_string_lossy().into_owned(),
        ]
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Transcoder for FfmpegTranscoder {
    fn merge(&self, request: &MergeRequest) -> Result<(), MergeError> {
        let args = Self::build_merge_args(request);
        debug!(program = %self.program, ?args, "Running merge");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MergeError::TranscoderNotFound(self.program.clone())
                } else {
                    MergeError::Io(e.to_string())
                }
            })?;
        let mut stderr = StderrTail::capture(&mut child, "hivision-merge-stderr");

        let status = wait_or_kill(&mut child, "transcoder", self.timeout, INTERRUPT_GRACE)
            .ok_or(MergeError::TimedOut(self.timeout))?;
        if !status.success() {
            return Err(MergeError::NonZeroExit {
                code: status.code(),
                stderr: stderr.join(),
            });
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}
