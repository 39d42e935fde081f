//! Core traits for storage, login and notification.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CapabilityDescriptor, Notice};

/// Storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend refused access; the stored session is no longer trusted.
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Storage error: {0}")]
    Internal(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Trait for persisted key-value storage backends.
///
/// Removing an absent key is not an error.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key).await
    }
}

/// Result of a login handshake that did not reject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Whether the backend accepted the login.
    pub ok: bool,
    /// Session token issued by the backend, if it issues one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl LoginResponse {
    /// Accepted login without a backend-issued token.
    #[must_use]
    pub const fn accepted() -> Self {
        Self {
            ok: true,
            token: None,
        }
    }

    /// Declined login.
    #[must_use]
    pub const fn declined() -> Self {
        Self {
            ok: false,
            token: None,
        }
    }
}

/// Login error.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Login rejected: {0}")]
    Rejected(String),
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Backend login client.
#[async_trait]
pub trait LoginClient: Send + Sync {
    /// Perform the login handshake against the configured backend.
    async fn login(&self) -> Result<LoginResponse, LoginError>;
}

#[async_trait]
impl<T: LoginClient + ?Sized> LoginClient for Arc<T> {
    async fn login(&self) -> Result<LoginResponse, LoginError> {
        (**self).login().await
    }
}

/// Provider of pre-fetched capability descriptors.
///
/// The descriptor is fetched elsewhere (settings subsystem); this is only
/// the read side.
pub trait CapabilitySource: Send + Sync {
    /// Descriptor for the backend at `api_base_url`, if one has been fetched.
    fn descriptor(&self, api_base_url: &str) -> Option<CapabilityDescriptor>;
}

impl<T: CapabilitySource + ?Sized> CapabilitySource for Arc<T> {
    fn descriptor(&self, api_base_url: &str) -> Option<CapabilityDescriptor> {
        (**self).descriptor(api_base_url)
    }
}

/// Fire-and-forget channel for transient user-visible messages.
pub trait Notifier: Send + Sync {
    /// Show a notice. Must not block.
    fn notify(&self, notice: Notice);
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_token_is_optional() {
        let parsed: LoginResponse = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert_eq!(parsed, LoginResponse::accepted());

        let parsed: LoginResponse =
            serde_json::from_str(r#"{"ok":true,"token":"abc"}"#).unwrap();
        assert_eq!(parsed.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(StorageError::Unauthorized.to_string(), "Unauthorized");
        assert_eq!(
            LoginError::Transport("timeout".into()).to_string(),
            "Transport error: timeout"
        );
    }
}
