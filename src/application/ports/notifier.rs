//! Notification port interface

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::session::StopReason;

/// Notification errors
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Failed to show notification: {0}")]
    SendFailed(String),
}

/// What a notice reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Saved,
    LimitReached,
    Failed,
}

impl NoticeKind {
    /// Freedesktop icon name
    pub const fn icon_name(&self) -> &'static str {
        match self {
            Self::Saved | Self::LimitReached => "video-x-generic",
            Self::Failed => "dialog-error",
        }
    }

    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// A desktop notice about a finished recording
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub body: String,
}

impl Notice {
    /// Notice for a session that ended for `reason` after writing to `path`
    pub fn recording_finished(reason: StopReason, path: &Path, elapsed_secs: f64) -> Self {
        let (kind, title) = match reason {
            StopReason::Requested => (NoticeKind::Saved, "Recording saved"),
            StopReason::DurationLimit => (NoticeKind::LimitReached, "Recording limit reached"),
            StopReason::Failed => (NoticeKind::Failed, "Recording failed"),
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            kind,
            title: title.to_string(),
            body: format!("{name} ({elapsed_secs:.1}s)"),
        }
    }
}

/// Port for desktop notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &Notice) -> Result<(), NotificationError>;
}

/// Notifier used when notifications are turned off
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn notify(&self, _: &Notice) -> Result<(), NotificationError> {
        Ok(())
    }
}
