//! Audio capture on a dedicated thread, independent of the video loop

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, warn};

use super::ports::{AudioDevice, AudioDeviceError, AudioRead, AudioStream};
use super::worker::{emit, join_bounded, EventSender, LoopControl, POLL_INTERVAL};
use crate::domain::audio::{AudioChunk, AudioSpec};
use crate::domain::session::{ErrorKind, StatusEvent};

/// Longest a single device read may block
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// How long `start` waits for the device to open
pub const OPEN_TIMEOUT: Duration = Duration::from_secs(3);

struct Running {
    control: Arc<LoopControl>,
    handle: JoinHandle<Vec<AudioChunk>>,
}

/// Handle to the audio capture thread.
///
/// Chunks are owned by the capture thread until it is joined in
/// [`stop`](Self::stop). A pipeline that never started is a valid value
/// whose `stop` returns nothing.
#[derive(Default)]
pub struct AudioCapturePipeline {
    running: Option<Running>,
    events: Option<EventSender>,
}

impl AudioCapturePipeline {
    /// A pipeline with no thread behind it
    pub fn idle() -> Self {
        Self::default()
    }

    /// Open the device on a new thread and begin accumulating chunks.
    ///
    /// The stream is opened inside the capture thread; this call returns
    /// once it reports ready or failed.
    pub fn start<D>(device: Arc<D>, spec: AudioSpec, events: EventSender) -> Result<Self, AudioDeviceError>
    where
        D: AudioDevice + ?Sized + 'static,
    {
        let control = Arc::new(LoopControl::new());
        let (ready_tx, ready_rx) = mpsc::channel();
        let worker_control = Arc::clone(&control);
        let worker_events = events.clone();

        let handle = thread::Builder::new()
            .name("hivision-audio".into())
            .spawn(move || {
                let stream = match device.open(&spec) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return Vec::new();
                    }
                };
                capture(stream, &spec, &worker_control, &worker_events)
            })
            .map_err(|e| AudioDeviceError::StreamFailed(e.to_string()))?;

        match ready_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok(())) => Ok(Self {
                running: Some(Running { control, handle }),
                events: Some(events),
            }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                control.request_stop();
                Err(AudioDeviceError::StreamFailed(
                    "timed out opening the input device".into(),
                ))
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn pause(&self) {
        if let Some(running) = &self.running {
            running.control.set_paused(true);
        }
    }

    pub fn resume(&self) {
        if let Some(running) = &self.running {
            running.control.set_paused(false);
        }
    }

    /// Cancellation handle observed by the capture thread
    pub fn control(&self) -> Option<Arc<LoopControl>> {
        self.running.as_ref().map(|r| Arc::clone(&r.control))
    }

    /// Stop capture and hand back every chunk recorded so far.
    ///
    /// Waits at most `timeout`. A thread that misses the deadline is
    /// detached and its audio is dropped. Calling again returns nothing.
    pub fn stop(&mut self, timeout: Duration) -> Vec<AudioChunk> {
        let Some(Running { control, handle }) = self.running.take() else {
            return Vec::new();
        };
        control.request_stop();

        match join_bounded(handle, timeout) {
            Ok(Ok(chunks)) => chunks,
            Ok(Err(_)) => {
                error!("Audio capture thread panicked");
                self.report(ErrorKind::AudioDevice, "audio capture thread panicked".into());
                Vec::new()
            }
            Err(_detached) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "Audio thread did not stop in time");
                self.report(
                    ErrorKind::Finalization,
                    format!("audio capture did not stop within {:.1}s", timeout.as_secs_f64()),
                );
                Vec::new()
            }
        }
    }

    fn report(&self, kind: ErrorKind, message: String) {
        if let Some(events) = &self.events {
            emit(events, StatusEvent::Error { kind, message });
        }
    }
}

impl Drop for AudioCapturePipeline {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.control.request_stop();
        }
    }
}

fn capture(
    mut stream: Box<dyn AudioStream>,
    spec: &AudioSpec,
    control: &LoopControl,
    events: &EventSender,
) -> Vec<AudioChunk> {
    let chunk_samples = spec.chunk_samples().max(1);
    let mut chunks = Vec::new();
    let mut pending: Vec<i16> = Vec::with_capacity(chunk_samples);
    let mut segment = 0u32;
    let mut paused = false;

    let push = |chunks: &mut Vec<AudioChunk>, samples: Vec<i16>, segment: u32| {
        let sequence = chunks.len() as u64;
        chunks.push(AudioChunk {
            sequence,
            segment,
            samples,
        });
    };

    loop {
        if control.stop_requested() {
            break;
        }

        if control.is_paused() {
            if !paused {
                paused = true;
                if !pending.is_empty() {
                    push(&mut chunks, std::mem::take(&mut pending), segment);
                }
                if let Err(e) = stream.pause() {
                    warn!(error = %e, "Failed to pause audio stream");
                }
                debug!(segment, "Audio segment paused");
            }
            thread::sleep(POLL_INTERVAL);
            continue;
        }

        if paused {
            paused = false;
            segment += 1;
            if let Err(e) = stream.resume() {
                warn!(error = %e, "Failed to resume audio stream");
            }
            debug!(segment, "Audio segment started");
        }

        match stream.read(READ_TIMEOUT) {
            Ok(AudioRead::Samples(samples)) => {
                pending.extend_from_slice(&samples);
                while pending.len() >= chunk_samples {
                    let rest = pending.split_off(chunk_samples);
                    push(&mut chunks, std::mem::replace(&mut pending, rest), segment);
                }
            }
            Ok(AudioRead::Timeout) => {}
            Ok(AudioRead::Overflow) => {
                warn!(chunks = chunks.len(), "Audio input overflowed; continuing capture");
            }
            Err(e) => {
                error!(error = %e, "Audio capture ended; recording continues without further audio");
                emit(
                    events,
                    StatusEvent::Error {
                        kind: ErrorKind::AudioDevice,
                        message: e.to_string(),
                    },
                );
                break;
            }
        }
    }

    if !pending.is_empty() {
        push(&mut chunks, pending, segment);
    }
    debug!(chunks = chunks.len(), segments = segment + 1, "Audio capture finished");
    chunks
}
