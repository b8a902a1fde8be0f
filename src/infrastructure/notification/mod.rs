//! Desktop notifications through notify-rust

mod notify_rust;

pub use notify_rust::NotifyRustNotifier;

use crate::application::ports::{NoOpNotifier, Notifier};

/// Notifier for the `notify` setting
pub fn create_notifier(enabled: bool) -> Box<dyn Notifier> {
    if enabled {
        Box::new(NotifyRustNotifier::new())
    } else {
        Box::new(NoOpNotifier)
    }
}
