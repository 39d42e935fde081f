//! Session state machine and credential storage for TV clients.
//!
//! Provides:
//! - `SessionManager` - Decide and expose the login state against a backend
//! - `CredentialStore` - Session token adapter over key-value storage
//! - Storage implementations (memory, JSON file)

pub mod credentials;
pub mod manager;
pub mod storage;

pub use credentials::{CredentialStore, CredentialToken};
pub use manager::{CheckOutcome, SessionManager, SessionPhase, SessionState};
