//! Remote-control server status and the remote-driven settings sections.
//!
//! Provides:
//! - `RemoteControlStore` - Status of the locally hosted remote-control server
//! - `RemoteInputSetting` - Persisted switch gating remote input events
//! - `VideoSourceSetting` - Per-source enable switches in a focusable grid
//! - Lifecycle report wire type (JSON)

pub mod input;
pub mod protocol;
pub mod sources;
pub mod status;

pub use input::{RemoteInputConfig, RemoteInputSetting, RemoteKey, StatusLine};
pub use protocol::LifecycleReport;
pub use sources::{
    SourceTile, VideoSource, VideoSourceConfig, VideoSourceSelection, VideoSourceSetting,
};
pub use status::{RemoteControlStatus, RemoteControlStore, StatusReader};
