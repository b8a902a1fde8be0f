//! Picks the container writer for a codec

use crate::application::ports::{SinkError, SinkSpec, VideoSink, VideoSinkFactory};
use crate::domain::capture::Frame;
use crate::domain::output::Codec;

use super::ffmpeg_pipe::FfmpegPipeSink;
use super::y4m::Y4mSink;

/// Either writer, behind one sink type
pub enum OutputSink {
    Ffmpeg(FfmpegPipeSink),
    Y4m(Y4mSink),
}

impl VideoSink for OutputSink {
    fn write(&mut self, frame: &Frame) -> Result<(), SinkError> {
        match self {
            Self::Ffmpeg(sink) => sink.write(frame),
            Self::Y4m(sink) => sink.write(frame),
        }
    }

    fn close(&mut self) -> Result<(), SinkError> {
        match self {
            Self::Ffmpeg(sink) => sink.close(),
            Self::Y4m(sink) => sink.close(),
        }
    }

    fn frames_written(&self) -> u64 {
        match self {
            Self::Ffmpeg(sink) => sink.frames_written(),
            Self::Y4m(sink) => sink.frames_written(),
        }
    }

    fn bytes_written(&self) -> u64 {
        match self {
            Self::Ffmpeg(sink) => sink.bytes_written(),
            Self::Y4m(sink) => sink.bytes_written(),
        }
    }
}

/// Opens y4m files natively and everything else through ffmpeg
#[derive(Debug, Clone)]
pub struct OutputSinkFactory {
    ffmpeg_path: String,
    ffmpeg_available: bool,
}

impl OutputSinkFactory {
    pub fn new(ffmpeg_path: impl Into<String>, ffmpeg_available: bool) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffmpeg_available,
        }
    }
}

impl VideoSinkFactory for OutputSinkFactory {
    type Sink = OutputSink;

    fn open(&self, spec: &SinkSpec) -> Result<OutputSink, SinkError> {
        match spec.codec {
            Codec::I444 => Y4mSink::open(spec).map(OutputSink::Y4m),
            _ => FfmpegPipeSink::open(spec, &self.ffmpeg_path).map(OutputSink::Ffmpeg),
        }
    }

    fn supports(&self, codec: Codec) -> bool {
        codec.ffmpeg_encoder().is_none() || self.ffmpeg_available
    }
}
