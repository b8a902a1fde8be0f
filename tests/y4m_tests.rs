//! Container-level properties of the native YUV4MPEG2 writer

use std::fs;
use std::time::Duration;

use hivision::application::ports::{SinkError, SinkSpec, VideoSink, VideoSinkFactory};
use hivision::domain::capture::{Frame, Size};
use hivision::domain::output::{Codec, Container};
use hivision::domain::recording::{FrameRate, QualityPreset};
use hivision::infrastructure::{read_y4m_info, OutputSink, OutputSinkFactory};
use image::{Rgba, RgbaImage};

fn spec(dir: &tempfile::TempDir, size: Size, fps: u32) -> SinkSpec {
    SinkSpec {
        path: dir.path().join("clip.y4m"),
        codec: Codec::I444,
        container: Container::Y4m,
        fps: FrameRate::new(fps).unwrap(),
        size,
        encoding: QualityPreset::default().params(),
    }
}

fn frame(size: Size, sequence: u64, color: [u8; 4]) -> Frame {
    Frame::new(
        RgbaImage::from_pixel(size.width, size.height, Rgba(color)),
        sequence,
        Duration::from_millis(sequence * 40),
    )
}

fn open(spec: &SinkSpec) -> OutputSink {
    // no ffmpeg needed for y4m
    OutputSinkFactory::new("/nonexistent/ffmpeg", false)
        .open(spec)
        .unwrap()
}

#[test]
fn duration_is_frame_count_over_rate() {
    let dir = tempfile::tempdir().unwrap();
    let size = Size::new(33, 17);
    let spec = spec(&dir, size, 25);
    let mut sink = open(&spec);

    for i in 0..50 {
        sink.write(&frame(size, i, [i as u8, 0, 255, 255])).unwrap();
    }
    assert_eq!(sink.frames_written(), 50);
    sink.close().unwrap();
    sink.close().unwrap();

    let info = read_y4m_info(&spec.path).unwrap();
    assert_eq!(info.size, size);
    assert_eq!(info.frames, 50);
    assert!((info.duration_secs() - 2.0).abs() < 1e-9);

    let header = b"YUV4MPEG2 W33 H17 F25:1 Ip A1:1 C444\n";
    let bytes = fs::read(&spec.path).unwrap();
    assert!(bytes.starts_with(header));
    assert_eq!(bytes.len(), header.len() + 50 * (6 + 33 * 17 * 3));
    assert_eq!(sink.bytes_written(), bytes.len() as u64);
}

#[test]
fn frames_are_stored_in_write_order() {
    let dir = tempfile::tempdir().unwrap();
    let size = Size::new(2, 2);
    let spec = spec(&dir, size, 10);
    let mut sink = open(&spec);
    sink.write(&frame(size, 0, [0, 0, 0, 255])).unwrap();
    sink.write(&frame(size, 1, [255, 255, 255, 255])).unwrap();
    sink.close().unwrap();

    let bytes = fs::read(&spec.path).unwrap();
    let header_len = bytes.iter().position(|&b| b == b'\n').unwrap() + 1;
    let frame_len = 6 + 4 * 3;
    let luma = |n: usize| bytes[header_len + n * frame_len + 6];
    // BT.601 limited range: black is 16, white is 235
    assert_eq!(luma(0), 16);
    assert_eq!(luma(1), 235);
}

#[test]
fn mismatched_frame_is_rejected_and_file_stays_valid() {
    let dir = tempfile::tempdir().unwrap();
    let size = Size::new(8, 8);
    let spec = spec(&dir, size, 10);
    let mut sink = open(&spec);
    sink.write(&frame(size, 0, [1, 2, 3, 255])).unwrap();

    let err = sink
        .write(&frame(Size::new(9, 8), 1, [1, 2, 3, 255]))
        .unwrap_err();
    assert!(matches!(err, SinkError::DimensionMismatch { .. }));
    sink.close().unwrap();

    assert_eq!(read_y4m_info(&spec.path).unwrap().frames, 1);
}

#[test]
fn empty_recording_is_still_a_valid_container() {
    let dir = tempfile::tempdir().unwrap();
    let spec = spec(&dir, Size::new(4, 4), 30);
    let mut sink = open(&spec);
    sink.close().unwrap();

    let info = read_y4m_info(&spec.path).unwrap();
    assert_eq!(info.frames, 0);
    assert_eq!(info.duration_secs(), 0.0);
}

#[test]
fn truncated_file_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let size = Size::new(4, 4);
    let spec = spec(&dir, size, 30);
    let mut sink = open(&spec);
    sink.write(&frame(size, 0, [9, 9, 9, 255])).unwrap();
    sink.close().unwrap();

    let mut bytes = fs::read(&spec.path).unwrap();
    bytes.truncate(bytes.len() - 5);
    fs::write(&spec.path, bytes).unwrap();
    assert!(read_y4m_info(&spec.path).is_err());
}
