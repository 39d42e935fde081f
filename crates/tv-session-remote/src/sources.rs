//! Per-source enable switches for video sources, laid out as a grid.

use std::{
    collections::BTreeMap,
    sync::{Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};
use tv_session_core::{KeyValueStore, Store};

use crate::input::RemoteKey;

/// Default settings key for the source selection.
pub const DEFAULT_VIDEO_SOURCE_KEY: &str = "video_source";

/// Tiles per grid row.
pub const GRID_COLUMNS: usize = 3;

/// A video source offered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSource {
    /// Stable key.
    pub source: String,
    /// Display name.
    pub source_name: String,
}

impl VideoSource {
    #[must_use]
    pub fn new(source: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            source_name: source_name.into(),
        }
    }
}

/// Which sources the user has enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoSourceSelection {
    /// Every source is enabled, whatever `sources` says.
    pub enabled_all: bool,
    pub sources: BTreeMap<String, bool>,
}

impl VideoSourceSelection {
    /// Selection with every source enabled.
    #[must_use]
    pub fn all() -> Self {
        Self {
            enabled_all: true,
            sources: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn is_enabled(&self, source: &str) -> bool {
        self.enabled_all || self.sources.get(source).copied().unwrap_or(false)
    }

    /// Flip the effective state of `source`.
    ///
    /// Leaving "all enabled" keeps every `known` source enabled except the
    /// one being switched off.
    pub fn toggle<'a>(&mut self, source: &str, known: impl IntoIterator<Item = &'a str>) {
        let was_enabled = self.is_enabled(source);
        if self.enabled_all {
            self.enabled_all = false;
            for key in known {
                self.sources.insert(key.to_string(), true);
            }
        }
        self.sources.insert(source.to_string(), !was_enabled);
    }
}

/// Where the selection is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoSourceConfig {
    pub key: String,
    /// Used when nothing valid is persisted.
    pub default_enabled_all: bool,
}

impl Default for VideoSourceConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_VIDEO_SOURCE_KEY.to_string(),
            default_enabled_all: true,
        }
    }
}

/// One grid cell as the UI renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTile {
    pub source: String,
    pub name: String,
    pub enabled: bool,
    pub focused: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Focus {
    section: bool,
    index: Option<usize>,
}

/// Persisted video source switches plus remote-control focus in the grid.
pub struct VideoSourceSetting<S> {
    store: S,
    config: VideoSourceConfig,
    resources: Vec<VideoSource>,
    selection: Store<VideoSourceSelection>,
    focus: Mutex<Focus>,
}

impl<S: KeyValueStore> VideoSourceSetting<S> {
    /// Load the persisted selection for `resources`.
    pub async fn load(store: S, config: VideoSourceConfig, resources: Vec<VideoSource>) -> Self {
        let fallback = || {
            if config.default_enabled_all {
                VideoSourceSelection::all()
            } else {
                VideoSourceSelection::default()
            }
        };
        let selection = match store.get(&config.key).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                info!(key = %config.key, error = %e, "Ignoring unparsable video source selection");
                fallback()
            }),
            Ok(None) => fallback(),
            Err(e) => {
                info!(error = %e, "Failed to read video source selection");
                fallback()
            }
        };

        Self {
            store,
            config,
            resources,
            selection: Store::new(selection),
            focus: Mutex::default(),
        }
    }

    #[must_use]
    pub fn resources(&self) -> &[VideoSource] {
        &self.resources
    }

    #[must_use]
    pub fn selection(&self) -> VideoSourceSelection {
        self.selection.snapshot()
    }

    #[must_use]
    pub fn is_enabled(&self, source: &str) -> bool {
        self.selection.read(|s| s.is_enabled(source))
    }

    /// Receiver for selection changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<VideoSourceSelection> {
        self.selection.subscribe()
    }

    /// Flip one source, write the selection through, then call `on_changed`.
    ///
    /// A storage failure is logged and does not stop the callback.
    pub async fn toggle<F>(&self, source: &str, on_changed: F)
    where
        F: FnOnce(),
    {
        let known = self.resources.iter().map(|r| r.source.as_str());
        self.selection.update(|s| s.toggle(source, known));
        self.persist().await;
        on_changed();
    }

    async fn persist(&self) {
        let json = match serde_json::to_string(&self.selection.snapshot()) {
            Ok(json) => json,
            Err(e) => {
                info!(error = %e, "Failed to encode video source selection");
                return;
            }
        };
        if let Err(e) = self.store.set(&self.config.key, &json).await {
            info!(error = %e, "Failed to persist video source selection");
        }
    }

    /// The section gained focus.
    pub fn focus_section(&self) {
        self.with_focus(|f| f.section = true);
    }

    /// The section lost focus; drops the focused tile too.
    pub fn blur_section(&self) {
        self.with_focus(|f| *f = Focus::default());
    }

    /// A tile gained focus directly, e.g. by pointer.
    pub fn focus_tile(&self, index: usize) {
        self.with_focus(|f| f.index = Some(index));
    }

    pub fn blur_tile(&self) {
        self.with_focus(|f| f.index = None);
    }

    #[must_use]
    pub fn focused_index(&self) -> Option<usize> {
        self.with_focus(|f| f.index)
    }

    fn with_focus<R>(&self, f: impl FnOnce(&mut Focus) -> R) -> R {
        f(&mut self.focus.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// React to a remote key press.
    ///
    /// Select toggles the focused tile, or enters the grid at its first tile
    /// when only the section is focused. Arrow keys move between tiles.
    /// Returns true if the event was handled.
    pub async fn handle_remote_event<F>(&self, key: RemoteKey, on_changed: F) -> bool
    where
        F: FnOnce(),
    {
        let focus = self.with_focus(|f| *f);
        match (key, focus.index) {
            (RemoteKey::Select, Some(index)) => {
                let Some(resource) = self.resources.get(index) else {
                    return false;
                };
                debug!(source = %resource.source, "Remote select toggles video source");
                self.toggle(&resource.source, on_changed).await;
                true
            }
            (RemoteKey::Select, None) if focus.section && !self.resources.is_empty() => {
                self.focus_tile(0);
                true
            }
            (RemoteKey::Select, None) => false,
            (arrow, Some(index)) => match self.step(index, arrow) {
                Some(next) => {
                    self.focus_tile(next);
                    true
                }
                None => false,
            },
            (_, None) => false,
        }
    }

    fn step(&self, index: usize, key: RemoteKey) -> Option<usize> {
        let next = match key {
            RemoteKey::Left if index % GRID_COLUMNS > 0 => index - 1,
            RemoteKey::Right if index % GRID_COLUMNS + 1 < GRID_COLUMNS => index + 1,
            RemoteKey::Up => index.checked_sub(GRID_COLUMNS)?,
            RemoteKey::Down => index + GRID_COLUMNS,
            _ => return None,
        };
        (next < self.resources.len()).then_some(next)
    }

    /// Tiles in display order; chunk by [`GRID_COLUMNS`] for rows.
    #[must_use]
    pub fn tiles(&self) -> Vec<SourceTile> {
        let focused = self.focused_index();
        self.selection.read(|selection| {
            self.resources
                .iter()
                .enumerate()
                .map(|(i, r)| SourceTile {
                    source: r.source.clone(),
                    name: r.source_name.clone(),
                    enabled: selection.is_enabled(&r.source),
                    focused: focused == Some(i),
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tv_session_auth::storage::MemoryStore;

    use super::*;

    fn resources() -> Vec<VideoSource> {
        ["dbzy", "hnzy", "lzzy", "wolong"]
            .into_iter()
            .map(|key| VideoSource::new(key, key.to_uppercase()))
            .collect()
    }

    async fn setting(store: MemoryStore) -> VideoSourceSetting<MemoryStore> {
        VideoSourceSetting::load(store, VideoSourceConfig::default(), resources()).await
    }

    #[test]
    fn test_enabled_all_overrides_map() {
        let mut selection = VideoSourceSelection::all();
        selection.sources.insert("dbzy".into(), false);
        assert!(selection.is_enabled("dbzy"));

        selection.enabled_all = false;
        assert!(!selection.is_enabled("dbzy"));
        assert!(!selection.is_enabled("unknown"));
    }

    #[test]
    fn test_toggle_out_of_all_keeps_others() {
        let mut selection = VideoSourceSelection::all();
        selection.toggle("hnzy", ["dbzy", "hnzy", "lzzy"]);

        assert!(!selection.enabled_all);
        assert!(!selection.is_enabled("hnzy"));
        assert!(selection.is_enabled("dbzy"));
        assert!(selection.is_enabled("lzzy"));
    }

    #[tokio::test]
    async fn test_toggle_writes_through_and_notifies() {
        let s = setting(MemoryStore::new()).await;
        let calls = AtomicUsize::new(0);

        s.toggle("lzzy", || {
            calls.fetch_add(1, Ordering::SeqCst);
        })
        .await;

        assert!(!s.is_enabled("lzzy"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let raw = s.store.get(DEFAULT_VIDEO_SOURCE_KEY).await.unwrap().unwrap();
        let persisted: VideoSourceSelection = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, s.selection());
    }

    #[tokio::test]
    async fn test_load_reads_persisted_selection() {
        let store = MemoryStore::with_entries([(
            DEFAULT_VIDEO_SOURCE_KEY,
            r#"{"enabledAll":false,"sources":{"wolong":true}}"#,
        )]);
        let s = setting(store).await;
        assert!(s.is_enabled("wolong"));
        assert!(!s.is_enabled("dbzy"));

        let garbage = MemoryStore::with_entries([(DEFAULT_VIDEO_SOURCE_KEY, "{")]);
        assert!(setting(garbage).await.selection().enabled_all);
    }

    #[tokio::test]
    async fn test_select_enters_grid_then_toggles() {
        let s = setting(MemoryStore::new()).await;

        assert!(!s.handle_remote_event(RemoteKey::Select, || {}).await);

        s.focus_section();
        assert!(s.handle_remote_event(RemoteKey::Select, || {}).await);
        assert_eq!(s.focused_index(), Some(0));
        assert!(s.is_enabled("dbzy"));

        let mut changed = false;
        assert!(s.handle_remote_event(RemoteKey::Select, || changed = true).await);
        assert!(changed);
        assert!(!s.is_enabled("dbzy"));
    }

    #[tokio::test]
    async fn test_arrows_move_within_grid() {
        let s = setting(MemoryStore::new()).await;
        s.focus_section();
        s.focus_tile(0);

        assert!(!s.handle_remote_event(RemoteKey::Left, || {}).await);
        assert!(!s.handle_remote_event(RemoteKey::Up, || {}).await);
        assert!(s.handle_remote_event(RemoteKey::Down, || {}).await);
        assert_eq!(s.focused_index(), Some(3));
        assert!(!s.handle_remote_event(RemoteKey::Right, || {}).await);

        s.focus_tile(2);
        assert!(!s.handle_remote_event(RemoteKey::Right, || {}).await);
        assert!(s.handle_remote_event(RemoteKey::Left, || {}).await);
        assert_eq!(s.focused_index(), Some(1));
    }

    #[tokio::test]
    async fn test_blur_drops_tile_focus() {
        let s = setting(MemoryStore::new()).await;
        s.focus_section();
        s.focus_tile(1);
        s.blur_section();

        assert_eq!(s.focused_index(), None);
        assert!(!s.handle_remote_event(RemoteKey::Select, || {}).await);
    }

    #[tokio::test]
    async fn test_tiles_reflect_selection_and_focus() {
        let s = setting(MemoryStore::new()).await;
        s.focus_tile(1);
        s.toggle("hnzy", || {}).await;

        let tiles = s.tiles();
        assert_eq!(tiles.len(), 4);
        assert_eq!(tiles.chunks(GRID_COLUMNS).count(), 2);
        assert_eq!(tiles[1].name, "HNZY");
        assert!(!tiles[1].enabled);
        assert!(tiles[1].focused);
        assert!(tiles[0].enabled && !tiles[0].focused);
    }
}
