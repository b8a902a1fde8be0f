//! Captured audio value objects

/// Default sample rate for microphone capture
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
/// Default channel count for microphone capture
pub const DEFAULT_CHANNELS: u16 = 2;
/// Default frames (samples per channel) per chunk
pub const DEFAULT_CHUNK_FRAMES: usize = 1024;

/// Requested input stream parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSpec {
    /// Device name, or the host default when `None`
    pub device: Option<String>,
    pub sample_rate: u32,
    pub channels: u16,
    /// Frames per emitted chunk
    pub chunk_frames: usize,
}

impl Default for AudioSpec {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            chunk_frames: DEFAULT_CHUNK_FRAMES,
        }
    }
}

impl AudioSpec {
    /// Interleaved samples in one full chunk
    pub fn chunk_samples(&self) -> usize {
        self.chunk_frames * self.channels.max(1) as usize
    }
}

/// Interleaved 16-bit PCM samples with their position in the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    /// Monotonic index across the whole session
    pub sequence: u64,
    /// Capture segment; increments after every resume
    pub segment: u32,
    pub samples: Vec<i16>,
}

impl AudioChunk {
    pub fn frames(&self, channels: u16) -> usize {
        self.samples.len() / channels.max(1) as usize
    }
}

/// Total duration in seconds of a chunk sequence
pub fn chunks_duration_secs(chunks: &[AudioChunk], sample_rate: u32, channels: u16) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    let frames: usize = chunks.iter().map(|c| c.frames(channels)).sum();
    frames as f64 / sample_rate as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_samples_accounts_for_channels() {
        let spec = AudioSpec {
            chunk_frames: 512,
            channels: 2,
            ..AudioSpec::default()
        };
        assert_eq!(spec.chunk_samples(), 1024);
    }

    #[test]
    fn duration_of_chunks() {
        let chunks = vec![
            AudioChunk {
                sequence: 0,
                segment: 0,
                samples: vec![0; 8000],
            },
            AudioChunk {
                sequence: 1,
                segment: 1,
                samples: vec![0; 8000],
            },
        ];
        assert!((chunks_duration_secs(&chunks, 8000, 2) - 1.0).abs() < 1e-9);
        assert_eq!(chunks_duration_secs(&chunks, 0, 2), 0.0);
    }
}
