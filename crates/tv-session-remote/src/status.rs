//! Status of the locally hosted remote-control server.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tv_session_core::Store;

use crate::protocol::LifecycleReport;

/// Last reported server status.
///
/// Either running with no error, or stopped with an optional error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteControlStatus {
    pub is_server_running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Writer side of the status store, owned by the server lifecycle manager.
#[derive(Default)]
pub struct RemoteControlStore {
    state: Arc<Store<RemoteControlStatus>>,
}

impl RemoteControlStore {
    /// Create a store in the stopped state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only handle for UI consumers.
    #[must_use]
    pub fn reader(&self) -> StatusReader {
        StatusReader {
            state: Arc::clone(&self.state),
        }
    }

    /// Server came up at `url`. Clears any previous error.
    pub fn mark_running(&self, url: impl Into<String>) {
        let url = url.into();
        tracing::info!(%url, "Remote-control server running");
        self.state.replace(RemoteControlStatus {
            is_server_running: true,
            server_url: Some(url),
            error: None,
        });
    }

    /// Server stopped on request.
    pub fn mark_stopped(&self) {
        tracing::info!("Remote-control server stopped");
        self.state.replace(RemoteControlStatus::default());
    }

    /// Server failed; it is considered stopped.
    pub fn mark_failed(&self, error: impl Into<String>) {
        let error = error.into();
        tracing::warn!(%error, "Remote-control server failed");
        self.state.replace(RemoteControlStatus {
            is_server_running: false,
            server_url: None,
            error: Some(error),
        });
    }

    /// Apply a lifecycle report.
    pub fn apply(&self, report: LifecycleReport) {
        match report {
            LifecycleReport::Started { url } => self.mark_running(url),
            LifecycleReport::Stopped => self.mark_stopped(),
            LifecycleReport::Failed { error } => self.mark_failed(error),
        }
    }
}

/// Read-only view of the server status.
#[derive(Clone)]
pub struct StatusReader {
    state: Arc<Store<RemoteControlStatus>>,
}

impl StatusReader {
    #[must_use]
    pub fn snapshot(&self) -> RemoteControlStatus {
        self.state.snapshot()
    }

    #[must_use]
    pub fn is_server_running(&self) -> bool {
        self.state.read(|s| s.is_server_running)
    }

    #[must_use]
    pub fn server_url(&self) -> Option<String> {
        self.state.read(|s| s.server_url.clone())
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.read(|s| s.error.clone())
    }

    /// Receiver for status changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RemoteControlStatus> {
        self.state.subscribe()
    }

    /// The underlying reactive store, for stream consumers.
    #[must_use]
    pub fn store(&self) -> &Store<RemoteControlStatus> {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_stopped() {
        let reader = RemoteControlStore::new().reader();
        assert!(!reader.is_server_running());
        assert!(reader.server_url().is_none());
        assert!(reader.error().is_none());
    }

    #[test]
    fn test_running_clears_error() {
        let store = RemoteControlStore::new();
        let reader = store.reader();

        store.mark_failed("bind failed");
        assert_eq!(reader.error().as_deref(), Some("bind failed"));

        store.mark_running("http://10.0.0.5:12346");
        assert!(reader.is_server_running());
        assert_eq!(reader.server_url().as_deref(), Some("http://10.0.0.5:12346"));
        assert!(reader.error().is_none());
    }

    #[test]
    fn test_failure_stops_server() {
        let store = RemoteControlStore::new();
        store.apply(LifecycleReport::Started {
            url: "http://10.0.0.5:12346".into(),
        });
        store.apply(LifecycleReport::Failed {
            error: "crashed".into(),
        });

        let status = store.reader().snapshot();
        assert!(!status.is_server_running);
        assert!(status.server_url.is_none());
        assert_eq!(status.error.as_deref(), Some("crashed"));
    }

    #[tokio::test]
    async fn test_readers_are_notified() {
        let store = RemoteControlStore::new();
        let mut rx = store.reader().subscribe();

        store.apply(LifecycleReport::Started {
            url: "http://tv:1".into(),
        });
        store.apply(LifecycleReport::Stopped);

        assert!(rx.recv().await.unwrap().is_server_running);
        assert_eq!(rx.recv().await.unwrap(), RemoteControlStatus::default());
    }

    #[test]
    fn test_status_wire_shape() {
        let json = serde_json::to_value(RemoteControlStatus {
            is_server_running: true,
            server_url: Some("http://tv:1".into()),
            error: None,
        })
        .unwrap();
        assert_eq!(json["isServerRunning"], true);
        assert_eq!(json["serverUrl"], "http://tv:1");
        assert!(json.get("error").is_none());
    }
}
