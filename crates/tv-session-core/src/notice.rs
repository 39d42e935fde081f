//! Transient user-visible notices.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::traits::Notifier;

/// Notice severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Error,
    Info,
}

/// A transient message for the user, shown and dismissed by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Unique id so the UI can de-duplicate and dismiss.
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    /// Create an error notice.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    /// Create an informational notice.
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }
}

/// Broadcast-backed notifier.
///
/// Notices sent with no subscriber attached are dropped.
#[derive(Debug, Clone)]
pub struct NoticeChannel {
    sender: broadcast::Sender<Notice>,
}

impl Default for NoticeChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeChannel {
    /// Create a new notice channel.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(32);
        Self { sender }
    }

    /// Get a receiver for notices.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }
}

impl Notifier for NoticeChannel {
    fn notify(&self, notice: Notice) {
        let _ = self.sender.send(notice);
    }
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Error => tracing::warn!(id = %notice.id, "{}", notice.text),
            NoticeKind::Info => tracing::info!(id = %notice.id, "{}", notice.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_wire_shape() {
        let notice = Notice::error("check the server");
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["text"], "check the server");
    }

    #[tokio::test]
    async fn test_channel_delivers_to_subscribers() {
        let channel = NoticeChannel::new();
        let mut rx = channel.subscribe();

        channel.notify(Notice::info("hello"));

        let got = rx.recv().await.unwrap();
        assert_eq!(got.kind, NoticeKind::Info);
        assert_eq!(got.text, "hello");
    }

    #[test]
    fn test_channel_without_subscribers_does_not_fail() {
        NoticeChannel::new().notify(Notice::error("nobody listening"));
    }
}
