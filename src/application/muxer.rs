//! Merge a captured audio track into an already-written video file

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::ports::{MergeError, MergeRequest, Transcoder};
use crate::domain::audio::{chunks_duration_secs, AudioChunk};
use crate::domain::output::Container;

/// Audio parameters of the captured track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioTrack<'a> {
    pub chunks: &'a [AudioChunk],
    pub sample_rate: u32,
    pub channels: u16,
    pub bitrate_kbps: u32,
}

impl AudioTrack<'_> {
    /// Captured length in seconds
    pub fn duration_secs(&self) -> f64 {
        chunks_duration_secs(self.chunks, self.sample_rate, self.channels)
    }
}

/// Removes the file at `path` when dropped unless disarmed
struct ScratchFile {
    path: PathBuf,
    keep: bool,
}

impl ScratchFile {
    fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if !self.keep && self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "Failed to remove scratch file");
            }
        }
    }
}

/// Write interleaved 16-bit PCM chunks as a WAV file
pub fn write_wav(path: &Path, chunks: &[AudioChunk], sample_rate: u32, channels: u16) -> Result<(), MergeError> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let io = |e: hound::Error| MergeError::Io(e.to_string());
    let mut writer = hound::WavWriter::create(path, spec).map_err(io)?;
    for sample in chunks.iter().flat_map(|c| c.samples.iter()) {
        writer.write_sample(*sample).map_err(io)?;
    }
    writer.finalize().map_err(io)
}

fn sibling(video: &Path, tag: &str, ext: &str) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "recording".into());
    video.with_file_name(format!("{stem}.{tag}.{ext}"))
}

/// Combines video and audio through a [`Transcoder`], replacing the
/// video-only file only after the transcoder succeeded.
pub struct Muxer<T> {
    transcoder: T,
}

impl<T: Transcoder> Muxer<T> {
    pub fn new(transcoder: T) -> Self {
        Self { transcoder }
    }

    pub fn transcoder(&self) -> &T {
        &self.transcoder
    }

    /// On any error the file at `video` is left exactly as it was, and no
    /// scratch files remain.
    pub fn merge(&self, video: &Path, track: AudioTrack<'_>) -> Result<(), MergeError> {
        let container = Container::from_path(video).unwrap_or_default();
        if !container.supports_audio() {
            return Err(MergeError::AudioNotSupported(container.extension().to_string()));
        }
        if !self.transcoder.is_available() {
            return Err(MergeError::TranscoderNotFound(
                "ffmpeg is required to add the audio track".into(),
            ));
        }

        let audio = ScratchFile::new(sibling(video, "audio", "wav"));
        write_wav(&audio.path, track.chunks, track.sample_rate, track.channels)?;
        debug!(
            path = %audio.path.display(),
            chunks = track.chunks.len(),
            seconds = track.duration_secs(),
            "Wrote temporary audio track"
        );

        let mut merged = ScratchFile::new(sibling(video, "muxing", container.extension()));
        let request = MergeRequest {
            video: video.to_path_buf(),
            audio: audio.path.clone(),
            output: merged.path.clone(),
            audio_bitrate_kbps: track.bitrate_kbps,
        };
        self.transcoder.merge(&request)?;

        fs::rename(&merged.path, video).map_err(|e| MergeError::Io(e.to_string()))?;
        merged.keep = true;
        info!(path = %video.display(), "Merged audio into recording");
        Ok(())
    }
}
