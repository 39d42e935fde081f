//! Core abstractions for TV client session coordination.
//!
//! This crate provides the fundamental building blocks:
//! - `Store` - Reactive state container with broadcast subscriptions
//! - `CapabilityDescriptor` - Server-reported storage strategy
//! - `Notice` - Transient user-visible messages
//! - `SessionConfig` - Tunables for the session state machine
//! - Storage, login and notification traits

pub mod capability;
pub mod config;
pub mod notice;
pub mod store;
pub mod traits;

pub use capability::{CapabilityDescriptor, StaticCapabilities, StorageMode};
pub use config::{ConfigError, SessionConfig};
pub use notice::{Notice, NoticeChannel, NoticeKind, TracingNotifier};
pub use store::Store;
pub use traits::{
    CapabilitySource, KeyValueStore, LoginClient, LoginError, LoginResponse, Notifier,
    StorageError,
};
