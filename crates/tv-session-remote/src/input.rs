//! Persisted switch gating remote input events.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};
use tv_session_core::{KeyValueStore, Store};

use crate::status::RemoteControlStatus;

/// Default settings key for the remote input switch.
pub const DEFAULT_REMOTE_INPUT_KEY: &str = "remote_input_enabled";

/// Where and how the switch is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemoteInputConfig {
    pub key: String,
    /// Value used when nothing valid is persisted.
    pub default_enabled: bool,
}

impl Default for RemoteInputConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_REMOTE_INPUT_KEY.to_string(),
            default_enabled: false,
        }
    }
}

/// Key pressed on the TV remote that a settings section reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemoteKey {
    Select,
    Up,
    Down,
    Left,
    Right,
}

impl RemoteKey {
    /// Map a platform event type name such as `"select"`.
    #[must_use]
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::from(event_type)).ok()
    }
}

/// One row of the status panel shown under the switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    /// Whether the server is running.
    Service { running: bool },
    /// Address a companion device connects to.
    Address(String),
    Error(String),
}

/// Persisted remote input switch.
///
/// Independent of the server status; it only decides whether remote
/// input events are processed.
pub struct RemoteInputSetting<S> {
    store: S,
    config: RemoteInputConfig,
    enabled: Store<bool>,
}

impl<S: KeyValueStore> RemoteInputSetting<S> {
    /// Load the persisted value, falling back to the configured default.
    pub async fn load(store: S, config: RemoteInputConfig) -> Self {
        let enabled = match store.get(&config.key).await {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|_| {
                info!(key = %config.key, value = %raw, "Ignoring unparsable remote input setting");
                config.default_enabled
            }),
            Ok(None) => config.default_enabled,
            Err(e) => {
                info!(error = %e, "Failed to read remote input setting");
                config.default_enabled
            }
        };

        Self {
            store,
            config,
            enabled: Store::new(enabled),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.snapshot()
    }

    /// Receiver for switch changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.enabled.subscribe()
    }

    /// Set the switch, write it through to storage, then call `on_changed`.
    ///
    /// A storage failure is logged; the in-memory value and the callback
    /// are not affected by it.
    pub async fn set_enabled<F>(&self, enabled: bool, on_changed: F)
    where
        F: FnOnce(),
    {
        self.enabled.replace(enabled);
        if let Err(e) = self
            .store
            .set(&self.config.key, if enabled { "true" } else { "false" })
            .await
        {
            info!(error = %e, "Failed to persist remote input setting");
        }
        on_changed();
    }

    /// Flip the switch.
    pub async fn toggle<F>(&self, on_changed: F)
    where
        F: FnOnce(),
    {
        self.set_enabled(!self.is_enabled(), on_changed).await;
    }

    /// React to a remote key press while the switch row may hold focus.
    ///
    /// Returns true if the event toggled the switch.
    pub async fn handle_remote_event<F>(&self, key: RemoteKey, focused: bool, on_changed: F) -> bool
    where
        F: FnOnce(),
    {
        if !focused || key != RemoteKey::Select {
            return false;
        }
        debug!("Remote select toggles remote input");
        self.toggle(on_changed).await;
        true
    }

    /// Status rows to show under the switch. Empty while disabled.
    #[must_use]
    pub fn status_lines(&self, status: &RemoteControlStatus) -> Vec<StatusLine> {
        if !self.is_enabled() {
            return Vec::new();
        }

        let mut lines = vec![StatusLine::Service {
            running: status.is_server_running,
        }];
        if let Some(url) = &status.server_url {
            lines.push(StatusLine::Address(url.clone()));
        }
        if let Some(error) = &status.error {
            lines.push(StatusLine::Error(error.clone()));
        }
        lines
    }
}
