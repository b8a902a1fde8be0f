//! Pointer position sampled on a background thread
//!
//! enigo connections are tied to the thread that created them, so the
//! tracker owns one on its own thread and publishes the latest position.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use enigo::{Enigo, Mouse, Settings};
use tracing::{debug, warn};

use crate::domain::capture::Point;

const SAMPLE_INTERVAL: Duration = Duration::from_millis(15);

/// Latest global pointer position, refreshed while the tracker lives
pub struct PointerTracker {
    latest: Arc<Mutex<Option<Point>>>,
    running: Arc<AtomicBool>,
}

impl PointerTracker {
    pub fn spawn() -> Self {
        let latest = Arc::new(Mutex::new(None));
        let running = Arc::new(AtomicBool::new(true));
        let (slot, alive) = (Arc::clone(&latest), Arc::clone(&running));

        let spawned = thread::Builder::new()
            .name("hivision-pointer".into())
            .spawn(move || {
                let enigo = match Enigo::new(&Settings::default()) {
                    Ok(enigo) => enigo,
                    Err(e) => {
                        warn!(error = %e, "Pointer position unavailable; follow-cursor stays centred");
                        return;
                    }
                };
                while alive.load(Ordering::SeqCst) {
                    if let Ok((x, y)) = enigo.location() {
                        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Point::new(x, y));
                    }
                    thread::sleep(SAMPLE_INTERVAL);
                }
                debug!("Pointer tracker stopped");
            });
        if let Err(e) = spawned {
            warn!(error = %e, "Cannot start pointer tracker");
        }

        Self { latest, running }
    }

    pub fn position(&self) -> Option<Point> {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PointerTracker {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
