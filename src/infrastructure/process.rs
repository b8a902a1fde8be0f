//! Child-process handling shared by the ffmpeg adapters

use std::io::Read;
use std::process::{Child, ExitStatus};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;
use tracing::{debug, warn};

/// Tail of a child's stderr kept for error messages
const STDERR_TAIL: usize = 4096;
const POLL: Duration = Duration::from_millis(20);

/// Last few KB of a child's stderr, read on a helper thread
pub(crate) struct StderrTail {
    text: Arc<Mutex<String>>,
    reader: Option<JoinHandle<()>>,
}

impl StderrTail {
    /// Start draining the child's piped stderr, if it has one
    pub(crate) fn capture(child: &mut Child, thread_name: &str) -> Self {
        let text = Arc::new(Mutex::new(String::new()));
        let reader = child.stderr.take().and_then(|mut pipe| {
            let tail = Arc::clone(&text);
            thread::Builder::new()
                .name(thread_name.to_string())
                .spawn(move || {
                    let mut buf = [0u8; 1024];
                    while let Ok(n) = pipe.read(&mut buf) {
                        if n == 0 {
                            break;
                        }
                        let mut text = tail.lock().unwrap_or_else(PoisonError::into_inner);
                        text.push_str(&String::from_utf8_lossy(&buf[..n]));
                        if text.len() > STDERR_TAIL {
                            let mut cut = text.len() - STDERR_TAIL;
                            while !text.is_char_boundary(cut) {
                                cut += 1;
                            }
                            text.drain(..cut);
                        }
                    }
                })
                .ok()
        });
        Self { text, reader }
    }

    /// What has been read so far
    pub(crate) fn text(&self) -> String {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .trim()
            .to_string()
    }

    /// Everything the child wrote. Only call once the child has exited.
    pub(crate) fn join(&mut self) -> String {
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        self.text()
    }
}

/// Poll until the child exits or `deadline` passes
pub(crate) fn wait_until(child: &mut Child, deadline: Instant) -> Option<ExitStatus> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) if Instant::now() < deadline => thread::sleep(POLL),
            _ => return None,
        }
    }
}

#[cfg(unix)]
fn interrupt(child: &Child) {
    if let Err(e) = signal::kill(Pid::from_raw(child.id() as i32), Signal::SIGINT) {
        debug!(error = %e, "Failed to interrupt child process");
    }
}

#[cfg(not(unix))]
fn interrupt(_child: &Child) {}

/// Wait up to `timeout`, then interrupt and wait `grace`, then kill.
/// `None` means the child missed the deadline and was stopped.
pub(crate) fn wait_or_kill(
    child: &mut Child,
    what: &str,
    timeout: Duration,
    grace: Duration,
) -> Option<ExitStatus> {
    if let Some(status) = wait_until(child, Instant::now() + timeout) {
        return Some(status);
    }
    warn!(process = what, ?timeout, "Did not finish in time; interrupting");
    interrupt(child);
    if let Some(status) = wait_until(child, Instant::now() + grace) {
        debug!(process = what, %status, "Exited after interrupt");
        return None;
    }
    warn!(process = what, "Still running after interrupt; killing");
    let _ = child.kill();
    let _ = child.wait();
    None
}
