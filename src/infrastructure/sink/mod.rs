//! Video sink infrastructure
//!
//! Two container writers behind one factory:
//! - YUV4MPEG2 (`i444` in `.y4m`), written natively
//! - everything else, encoded by an `ffmpeg` child fed raw RGBA on stdin

mod factory;
mod ffmpeg_pipe;
mod y4m;

pub use factory::{OutputSink, OutputSinkFactory};
pub use ffmpeg_pipe::FfmpegPipeSink;
pub use y4m::{read_y4m_info, Y4mInfo, Y4mSink};
