//! External transcoder adapters

mod ffmpeg;

pub use ffmpeg::FfmpegTranscoder;
