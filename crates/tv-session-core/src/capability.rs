//! Server capability descriptors.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::traits::CapabilitySource;

/// Storage mode value meaning the client maintains its own session token.
pub const LOCAL_STORAGE: &str = "localstorage";

/// Server-reported configuration for a backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Session storage strategy the backend expects.
    #[serde(rename = "StorageType", default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,

    /// Remaining server fields, kept verbatim.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Parsed storage strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageMode {
    /// Client obtains and keeps its own token via an implicit login.
    LocalStorage,
    /// Sessions are managed by the server.
    Other(String),
}

impl CapabilityDescriptor {
    /// Descriptor with only a storage type.
    #[must_use]
    pub fn with_storage_type(storage_type: impl Into<String>) -> Self {
        Self {
            storage_type: Some(storage_type.into()),
            extra: HashMap::new(),
        }
    }

    /// Usable storage mode, or `None` when the field is absent or empty.
    #[must_use]
    pub fn storage_mode(&self) -> Option<StorageMode> {
        match self.storage_type.as_deref() {
            None | Some("") => None,
            Some(LOCAL_STORAGE) => Some(StorageMode::LocalStorage),
            Some(other) => Some(StorageMode::Other(other.to_string())),
        }
    }
}

/// In-memory capability source.
///
/// Descriptors registered for a specific base URL win over the shared one.
#[derive(Debug, Default)]
pub struct StaticCapabilities {
    by_url: RwLock<HashMap<String, CapabilityDescriptor>>,
    shared: RwLock<Option<CapabilityDescriptor>>,
}

impl StaticCapabilities {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Source answering every base URL with `descriptor`.
    #[must_use]
    pub fn shared(descriptor: CapabilityDescriptor) -> Self {
        Self {
            by_url: RwLock::default(),
            shared: RwLock::new(Some(descriptor)),
        }
    }

    /// Register a descriptor for one base URL.
    pub fn insert(&self, api_base_url: impl Into<String>, descriptor: CapabilityDescriptor) {
        self.by_url
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(api_base_url.into(), descriptor);
    }

    /// Forget the descriptor for one base URL.
    pub fn remove(&self, api_base_url: &str) {
        self.by_url
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(api_base_url);
    }

    /// Replace the shared fallback descriptor.
    pub fn set_shared(&self, descriptor: Option<CapabilityDescriptor>) {
        *self.shared.write().unwrap_or_else(PoisonError::into_inner) = descriptor;
    }
}

impl CapabilitySource for StaticCapabilities {
    fn descriptor(&self, api_base_url: &str) -> Option<CapabilityDescriptor> {
        if let Some(found) = self
            .by_url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(api_base_url)
        {
            return Some(found.clone());
        }
        self.shared
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
