//! Native YUV4MPEG2 writer (4:4:4, BT.601 limited range)

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::application::ports::{check_frame_size, SinkError, SinkSpec, VideoSink};
use crate::domain::capture::{Frame, Size};
use crate::domain::output::Codec;

const FRAME_MARKER: &[u8] = b"FRAME\n";

/// Constant-frame-rate `.y4m` writer
pub struct Y4mSink {
    path: PathBuf,
    size: Size,
    writer: Option<BufWriter<File>>,
    frames: u64,
    bytes: u64,
    planes: Vec<u8>,
}

impl Y4mSink {
    pub fn open(spec: &SinkSpec) -> Result<Self, SinkError> {
        if spec.codec != Codec::I444 {
            return Err(SinkError::UnsupportedCodec(spec.codec));
        }
        if !spec.container.accepts(spec.codec) {
            return Err(SinkError::IncompatibleContainer {
                codec: spec.codec,
                container: spec.container,
            });
        }
        let file = File::create(&spec.path).map_err(|e| SinkError::SpawnFailed(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        let header = format!(
            "YUV4MPEG2 W{} H{} F{}:1 Ip A1:1 C444\n",
            spec.size.width,
            spec.size.height,
            spec.fps.get()
        );
        writer
            .write_all(header.as_bytes())
            .map_err(|e| SinkError::WriteFailed(e.to_string()))?;
        debug!(path = %spec.path.display(), size = %spec.size, "Opened y4m sink");

        Ok(Self {
            path: spec.path.clone(),
            size: spec.size,
            writer: Some(writer),
            frames: 0,
            bytes: header.len() as u64,
            planes: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Planar Y, Cb, Cr from packed RGBA (alpha ignored)
fn rgba_to_yuv444(rgba: &[u8], pixels: usize, out: &mut Vec<u8>) {
    out.clear();
    out.resize(pixels * 3, 0);
    let (y_plane, rest) = out.split_at_mut(pixels);
    let (u_plane, v_plane) = rest.split_at_mut(pixels);
    for (i, px) in rgba.chunks_exact(4).enumerate() {
        let (r, g, b) = (px[0] as i32, px[1] as i32, px[2] as i32);
        y_plane[i] = (((66 * r + 129 * g + 25 * b + 128) >> 8) + 16) as u8;
        u_plane[i] = (((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128) as u8;
        v_plane[i] = (((112 * r - 94 * g - 18 * b + 128) >> 8) + 128) as u8;
    }
}

impl VideoSink for Y4mSink {
    fn write(&mut self, frame: &Frame) -> Result<(), SinkError> {
        check_frame_size(self.size, frame)?;
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| SinkError::WriteFailed("sink is closed".into()))?;

        let pixels = self.size.width as usize * self.size.height as usize;
        rgba_to_yuv444(frame.as_raw(), pixels, &mut self.planes);
        writer
            .write_all(FRAME_MARKER)
            .and_then(|()| writer.write_all(&self.planes))
            .map_err(|e| SinkError::WriteFailed(e.to_string()))?;

        self.frames += 1;
        self.bytes += (FRAME_MARKER.len() + self.planes.len()) as u64;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        writer
            .flush()
            .map_err(|e| SinkError::FinalizeFailed(e.to_string()))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| SinkError::FinalizeFailed(e.to_string()))?;
        debug!(path = %self.path.display(), frames = self.frames, "Closed y4m sink");
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl Drop for Y4mSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Stream parameters and frame count of a `.y4m` file
#[derive(Debug, Clone, PartialEq)]
pub struct Y4mInfo {
    pub size: Size,
    pub fps_num: u32,
    pub fps_den: u32,
    pub frames: u64,
}

impl Y4mInfo {
    pub fn duration_secs(&self) -> f64 {
        if self.fps_num == 0 {
            return 0.0;
        }
        self.frames as f64 * self.fps_den as f64 / self.fps_num as f64
    }
}

/// Parse the header and count frames (4:4:4 layout)
pub fn read_y4m_info(path: &Path) -> Result<Y4mInfo, String> {
    let mut reader = BufReader::new(File::open(path).map_err(|e| e.to_string())?);
    let mut header = String::new();
    reader.read_line(&mut header).map_err(|e| e.to_string())?;

    let mut tokens = header.split_whitespace();
    if tokens.next() != Some("YUV4MPEG2") {
        return Err("missing YUV4MPEG2 signature".into());
    }
    let (mut width, mut height, mut fps) = (0u32, 0u32, (0u32, 1u32));
    for token in tokens {
        let mut chars = token.chars();
        let tag = chars.next();
        let value = chars.as_str();
        match tag {
            Some('W') => width = value.parse().map_err(|_| "bad width")?,
            Some('H') => height = value.parse().map_err(|_| "bad height")?,
            Some('F') => {
                let (n, d) = value.split_once(':').ok_or("bad frame rate")?;
                fps = (
                    n.parse().map_err(|_| "bad frame rate")?,
                    d.parse().map_err(|_| "bad frame rate")?,
                );
            }
            _ => {}
        }
    }

    let file_len = std::fs::metadata(path).map_err(|e| e.to_string())?.len();
    let frame_len = (FRAME_MARKER.len() + width as usize * height as usize * 3) as u64;
    let payload = file_len.saturating_sub(header.len() as u64);
    if frame_len == 0 || payload % frame_len != 0 {
        return Err(format!("{payload} payload bytes is not a whole number of frames"));
    }

    Ok(Y4mInfo {
        size: Size::new(width, height),
        fps_num: fps.0,
        fps_den: fps.1,
        frames: payload / frame_len,
    })
}
