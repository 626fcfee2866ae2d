//! Snapshot persistence: the whole application state serialized as one JSON
//! blob under a fixed key in an external key-value store. Last writer wins;
//! a failed save is the caller's problem to log and swallow, never a crash.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::history::HistoryEntry;
use crate::record::VenueRecord;
use crate::view::{SortDirection, DEFAULT_PAGE_SIZE};

/// The single storage key every snapshot lives under.
pub const STATE_KEY: &str = "venuetrack.state";

/// Fallback map center when no snapshot exists (continental US).
pub const DEFAULT_MAP_CENTER: [f64; 2] = [39.8283, -98.5795];
pub const DEFAULT_MAP_ZOOM: u8 = 7;
pub const DEFAULT_MIN_VENUE_COUNT: usize = 1;
pub const DEFAULT_HISTORY_PAGE_SIZE: usize = 25;

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Serde(serde_json::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "storage read/write failed: {err}"),
            Self::Serde(err) => write!(f, "snapshot serialization failed: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// The key-value blob store the core persists into. Implementations are
/// external collaborators (browser local storage in the original setting);
/// the core only needs get/set by key.
pub trait SnapshotStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.blobs.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SnapshotStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(StorageError::Io)?;
        fs::write(self.path_for(key), value).map_err(StorageError::Io)
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_map_center() -> [f64; 2] {
    DEFAULT_MAP_CENTER
}

fn default_map_zoom() -> u8 {
    DEFAULT_MAP_ZOOM
}

fn default_min_venue_count() -> usize {
    DEFAULT_MIN_VENUE_COUNT
}

fn default_history_page_size() -> usize {
    DEFAULT_HISTORY_PAGE_SIZE
}

/// Full application state as persisted. Every field defaults so snapshots
/// written by older versions (or hand-edited ones) still load.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Snapshot {
    #[serde(default)]
    pub venues: Vec<VenueRecord>,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub hidden_columns: HashSet<String>,
    #[serde(default)]
    pub sort_column: Option<String>,
    #[serde(default)]
    pub sort_direction: SortDirection,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub status_filters: HashSet<String>,
    #[serde(default)]
    pub region_filters: HashSet<String>,
    #[serde(default)]
    pub type_filters: HashSet<String>,
    #[serde(default = "default_min_venue_count")]
    pub min_venue_count: usize,
    #[serde(default = "default_map_center")]
    pub map_center: [f64; 2],
    #[serde(default = "default_map_zoom")]
    pub map_zoom: u8,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default = "default_history_page_size")]
    pub history_page_size: usize,
    #[serde(default)]
    pub history_search_filter: String,
}

impl Snapshot {
    /// Empty initial state with all the documented defaults filled in.
    pub fn initial() -> Self {
        Snapshot {
            page_size: default_page_size(),
            min_venue_count: default_min_venue_count(),
            map_center: default_map_center(),
            map_zoom: default_map_zoom(),
            history_page_size: default_history_page_size(),
            ..Default::default()
        }
    }
}

/// Serialize and write the snapshot under [STATE_KEY], overwriting whatever
/// was there.
pub fn save(store: &mut dyn SnapshotStore, snapshot: &Snapshot) -> Result<(), StorageError> {
    let raw = serde_json::to_string(snapshot).map_err(StorageError::Serde)?;
    store.set(STATE_KEY, &raw)
}

/// Read the snapshot back. Absent or malformed blobs fall back to the empty
/// initial state; only a hard storage read error propagates.
pub fn load(store: &dyn SnapshotStore) -> Result<Snapshot, StorageError> {
    let Some(raw) = store.get(STATE_KEY)? else {
        return Ok(Snapshot::initial());
    };
    match serde_json::from_str(&raw) {
        Ok(snapshot) => Ok(snapshot),
        Err(err) => {
            warn!(%err, "malformed snapshot, starting from empty state");
            Ok(Snapshot::initial())
        }
    }
}
