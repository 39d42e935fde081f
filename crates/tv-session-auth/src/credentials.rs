//! Session token adapter over key-value storage.

use std::fmt;

use tv_session_core::{
    config::DEFAULT_TOKEN_KEY,
    traits::{KeyValueStore, StorageError},
};

/// Opaque persisted session token.
///
/// Presence means a session was previously established.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialToken(String);

impl CredentialToken {
    /// Wrap a raw token value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CredentialToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialToken(<redacted>)")
    }
}

/// Reads and writes the single session token under a fixed key.
#[derive(Debug)]
pub struct CredentialStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> CredentialStore<S> {
    /// Adapter using the default `auth_token` key.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_TOKEN_KEY)
    }

    /// Adapter using a custom key.
    #[must_use]
    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Storage key in use.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Underlying key-value store.
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.store
    }

    /// Load the stored token. An empty value counts as no token.
    ///
    /// # Errors
    /// Returns error if the backing store fails.
    pub async fn load(&self) -> Result<Option<CredentialToken>, StorageError> {
        Ok(self
            .store
            .get(&self.key)
            .await?
            .filter(|value| !value.is_empty())
            .map(CredentialToken))
    }

    /// Persist `token`.
    ///
    /// # Errors
    /// Returns error if the backing store fails.
    pub async fn save(&self, token: &CredentialToken) -> Result<(), StorageError> {
        self.store.set(&self.key, token.as_str()).await
    }

    /// Remove the token. Succeeds when no token is stored.
    ///
    /// # Errors
    /// Returns error if the backing store fails.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(&self.key).await
    }

    /// Overwrite the token with an empty value, which `load` reports as
    /// no token. Fallback for stores whose removal fails.
    ///
    /// # Errors
    /// Returns error if the backing store fails.
    pub async fn blank(&self) -> Result<(), StorageError> {
        self.store.set(&self.key, "").await
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_roundtrip_under_fixed_key() {
        let creds = CredentialStore::new(MemoryStore::new());
        assert_eq!(creds.key(), "auth_token");
        assert!(creds.load().await.unwrap().is_none());

        creds.save(&CredentialToken::new("abc")).await.unwrap();
        assert!(creds.inner().contains("auth_token").unwrap());
        assert_eq!(creds.load().await.unwrap().unwrap().as_str(), "abc");

        creds.clear().await.unwrap();
        creds.clear().await.unwrap();
        assert!(creds.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_value_is_no_token() {
        let creds = CredentialStore::new(MemoryStore::with_entries([("auth_token", "")]));
        assert!(creds.load().await.unwrap().is_none());
    }

    #[test]
    fn test_debug_redacts_value() {
        let token = CredentialToken::new("secret");
        assert!(!format!("{token:?}").contains("secret"));
    }
}
