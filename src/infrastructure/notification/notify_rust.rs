//! Desktop notices through notify-rust

use async_trait::async_trait;

use crate::application::ports::{Notice, NotificationError, Notifier};

const APP_NAME: &str = "HiVision";
const SHOW_MS: u32 = 6000;

/// Shows notices on the desktop notification daemon
#[derive(Debug, Default)]
pub struct NotifyRustNotifier;

impl NotifyRustNotifier {
    fn build(notice: &Notice) -> notify_rust::Notification {
        let mut notification = notify_rust::Notification::new();
        notification
            .appname(APP_NAME)
            .summary(&notice.title)
            .body(&notice.body)
            .icon(notice.kind.icon_name())
            .timeout(notify_rust::Timeout::Milliseconds(SHOW_MS));
        #[cfg(all(unix, not(target_os = "macos")))]
        if notice.kind.is_failure() {
            notification.urgency(notify_rust::Urgency::Critical);
        }
        notification
    }
}

#[async_trait]
impl Notifier for NotifyRustNotifier {
    async fn notify(&self, notice: &Notice) -> Result<(), NotificationError> {
        let notification = Self::build(notice);
        // D-Bus round trip blocks
        tokio::task::spawn_blocking(move || {
            notification
                .show()
                .map(drop)
                .map_err(|e| NotificationError::SendFailed(e.to_string()))
        })
        .await
        .map_err(|e| NotificationError::SendFailed(format!("Task join error: {e}")))?
    }
}
