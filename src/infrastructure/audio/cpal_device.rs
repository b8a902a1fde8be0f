//! Cross-platform audio input using cpal
//!
//! The cpal stream is not `Send`, so it is built and kept on the audio
//! capture thread; the callback hands blocks over a bounded channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use tracing::{debug, warn};

use crate::application::ports::{AudioDevice, AudioDeviceError, AudioRead, AudioStream};
use crate::domain::audio::AudioSpec;

/// Blocks buffered between the device callback and the capture thread
const CHANNEL_BLOCKS: usize = 64;

/// Microphone input through the host's default audio API
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalAudioDevice;

impl CpalAudioDevice {
    pub fn new() -> Self {
        Self
    }

    /// Named device, or the host default
    fn input_device(name: Option<&str>) -> Result<cpal::Device, AudioDeviceError> {
        let host = cpal::default_host();
        match name {
            None => host.default_input_device().ok_or(AudioDeviceError::NoDevice),
            Some(wanted) => host
                .input_devices()
                .map_err(|e| AudioDeviceError::StreamFailed(e.to_string()))?
                .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
                .ok_or_else(|| AudioDeviceError::DeviceNotFound(wanted.to_string())),
        }
    }

    /// Pick an i16/f32 config at the requested rate, preferring the
    /// requested channel count
    fn input_config(
        device: &cpal::Device,
        spec: &AudioSpec,
    ) -> Result<(StreamConfig, SampleFormat), AudioDeviceError> {
        let supported = device
            .supported_input_configs()
            .map_err(|e| AudioDeviceError::UnsupportedConfig(e.to_string()))?;

        let mut best: Option<cpal::SupportedStreamConfigRange> = None;
        for config in supported {
            if !matches!(config.sample_format(), SampleFormat::I16 | SampleFormat::F32) {
                continue;
            }
            if config.min_sample_rate().0 > spec.sample_rate
                || config.max_sample_rate().0 < spec.sample_rate
            {
                continue;
            }
            let is_better = match &best {
                None => true,
                Some(current) => {
                    config.channels() == spec.channels && current.channels() != spec.channels
                }
            };
            if is_better {
                best = Some(config);
            }
        }

        let range = best.ok_or_else(|| {
            AudioDeviceError::UnsupportedConfig(format!("no input format at {} Hz", spec.sample_rate))
        })?;
        let config = StreamConfig {
            channels: range.channels(),
            sample_rate: SampleRate(spec.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };
        Ok((config, range.sample_format()))
    }
}

/// Convert interleaved samples between channel layouts. Extra input
/// channels are averaged away; missing ones repeat the mono mix.
pub(crate) fn remix(samples: &[i16], from: u16, to: u16) -> Vec<i16> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }
    let mut out = Vec::with_capacity(samples.len() / from as usize * to as usize);
    for frame in samples.chunks(from as usize) {
        let sum: i32 = frame.iter().map(|&s| s as i32).sum();
        let mono = (sum / frame.len() as i32) as i16;
        out.extend(std::iter::repeat(mono).take(to as usize));
    }
    out
}

fn f32_to_i16(data: &[f32]) -> Vec<i16> {
    data.iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
        .collect()
}

struct BlockSender {
    tx: SyncSender<Vec<i16>>,
    overflow: Arc<AtomicBool>,
    from: u16,
    to: u16,
}

impl BlockSender {
    fn send(&self, samples: &[i16]) {
        let block = remix(samples, self.from, self.to);
        if let Err(TrySendError::Full(_)) = self.tx.try_send(block) {
            self.overflow.store(true, Ordering::SeqCst);
        }
    }
}

/// Where a stream error callback leaves its verdict for `read`.
///
/// Only a lost device ends capture; backend errors such as ALSA xruns
/// leave the stream running and surface as an overflow.
#[derive(Clone, Default)]
struct StreamFaults {
    overflow: Arc<AtomicBool>,
    failure: Arc<Mutex<Option<String>>>,
}

impl StreamFaults {
    fn record(&self, err: &cpal::StreamError) {
        match err {
            cpal::StreamError::DeviceNotAvailable => {
                warn!(error = %err, "Audio input device lost");
                *self.failure.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(err.to_string());
            }
            cpal::StreamError::BackendSpecific { .. } => {
                warn!(error = %err, "Audio stream glitch");
                self.overflow.store(true, Ordering::SeqCst);
            }
        }
    }

    fn take_failure(&self) -> Option<String> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn take_overflow(&self) -> bool {
        self.overflow.swap(false, Ordering::SeqCst)
    }
}

struct CpalStream {
    stream: cpal::Stream,
    rx: Receiver<Vec<i16>>,
    faults: StreamFaults,
}

impl AudioStream for CpalStream {
    fn read(&mut self, timeout: Duration) -> Result<AudioRead, AudioDeviceError> {
        if let Some(message) = self.faults.take_failure() {
            return Err(AudioDeviceError::StreamFailed(message));
        }
        if self.faults.take_overflow() {
            return Ok(AudioRead::Overflow);
        }
        match self.rx.recv_timeout(timeout) {
            Ok(block) => Ok(AudioRead::Samples(block)),
            Err(RecvTimeoutError::Timeout) => Ok(AudioRead::Timeout),
            Err(RecvTimeoutError::Disconnected) => {
                Err(AudioDeviceError::StreamFailed("input stream closed".into()))
            }
        }
    }

    fn pause(&mut self) -> Result<(), AudioDeviceError> {
        self.stream
            .pause()
            .map_err(|e| AudioDeviceError::StreamFailed(e.to_string()))
    }

    fn resume(&mut self) -> Result<(), AudioDeviceError> {
        self.stream
            .play()
            .map_err(|e| AudioDeviceError::StreamFailed(e.to_string()))
    }
}

impl AudioDevice for CpalAudioDevice {
    fn open(&self, spec: &AudioSpec) -> Result<Box<dyn AudioStream>, AudioDeviceError> {
        let device = Self::input_device(spec.device.as_deref())?;
        let (config, sample_format) = Self::input_config(&device, spec)?;
        debug!(
            device = device.name().unwrap_or_default(),
            rate = config.sample_rate.0,
            channels = config.channels,
            format = ?sample_format,
            "Opening audio input"
        );

        let (tx, rx) = mpsc::sync_channel(CHANNEL_BLOCKS);
        let faults = StreamFaults::default();
        let sender = BlockSender {
            tx,
            overflow: Arc::clone(&faults.overflow),
            from: config.channels,
            to: spec.channels,
        };
        let callback_faults = faults.clone();
        let on_error = move |err: cpal::StreamError| callback_faults.record(&err);

        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| sender.send(data),
                on_error,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| sender.send(&f32_to_i16(data)),
                on_error,
                None,
            ),
            other => {
                return Err(AudioDeviceError::UnsupportedConfig(format!(
                    "sample format {other:?}"
                )))
            }
        }
        .map_err(|e| AudioDeviceError::UnsupportedConfig(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioDeviceError::StreamFailed(e.to_string()))?;

        Ok(Box::new(CpalStream {
            stream,
            rx,
            faults,
        }))
    }

    fn is_available(&self) -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    fn input_names(&self) -> Vec<String> {
        cpal::default_host()
            .input_devices()
            .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
            .unwrap_or_default()
    }
}
