use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SyncError;

/// Complete application state as exchanged with the drive.
///
/// Only `lastActiveTime` is interpreted; everything else round-trips untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSnapshot {
    #[serde(rename = "lastActiveTime")]
    pub last_active_time: DateTime<Utc>,

    #[serde(flatten)]
    pub state: Map<String, Value>,
}

impl LocalSnapshot {
    pub fn new(last_active_time: DateTime<Utc>, state: Map<String, Value>) -> Self {
        LocalSnapshot {
            last_active_time,
            state,
        }
    }

    /// A snapshot with no application data that has never been active.
    pub fn empty() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH, Map::new())
    }

    /// Parse snapshot bytes, rejecting anything without a valid `lastActiveTime`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SyncError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(SyncError::InvalidSnapshot("file is empty".to_string()));
        }

        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| SyncError::InvalidSnapshot(format!("not valid JSON: {e}")))?;

        if !value.is_object() {
            return Err(SyncError::InvalidSnapshot(
                "expected a JSON object".to_string(),
            ));
        }

        serde_json::from_value(value)
            .map_err(|e| SyncError::InvalidSnapshot(format!("missing or invalid lastActiveTime: {e}")))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SyncError> {
        serde_json::to_vec(self).map_err(|e| SyncError::InvalidSnapshot(e.to_string()))
    }
}

/// Source and sink of the local application state.
///
/// `overwrite` must either fully replace local state or fail.
pub trait LocalSnapshotStore: Send + Sync {
    /// Capture the complete current local state.
    fn capture(&self) -> Result<LocalSnapshot>;

    /// Replace local state with the given snapshot.
    fn overwrite(&self, snapshot: &LocalSnapshot) -> Result<()>;

    /// When local application data was last active.
    fn local_last_active(&self) -> Result<DateTime<Utc>>;
}

/// Snapshot store over a single JSON file.
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSnapshotStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalSnapshotStore for FileSnapshotStore {
    fn capture(&self) -> Result<LocalSnapshot> {
        if !self.path.exists() {
            return Ok(LocalSnapshot::empty());
        }

        let bytes = fs::read(&self.path)
            .with_context(|| format!("Failed to read local data: {}", self.path.display()))?;

        LocalSnapshot::from_bytes(&bytes)
            .with_context(|| format!("Failed to parse local data: {}", self.path.display()))
    }

    fn overwrite(&self, snapshot: &LocalSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory: {}", parent.display())
            })?;
        }

        let content =
            serde_json::to_vec_pretty(snapshot).context("Failed to serialize local data")?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(())
    }

    fn local_last_active(&self) -> Result<DateTime<Utc>> {
        Ok(self.capture()?.last_active_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_unknown_fields_pass_through() {
        let raw = json!({
            "lastActiveTime": "2024-03-01T10:00:00Z",
            "tasks": [{"id": 1, "title": "write report"}],
            "settings": {"theme": "dark"}
        });

        let snapshot = LocalSnapshot::from_bytes(raw.to_string().as_bytes()).unwrap();
        assert_eq!(
            snapshot.last_active_time,
            "2024-03-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(snapshot.state["settings"]["theme"], "dark");

        let back: Value = serde_json::from_slice(&snapshot.to_bytes().unwrap()).unwrap();
        assert_eq!(back["tasks"], raw["tasks"]);
    }

    #[test]
    fn test_invalid_snapshots_rejected() {
        for bad in ["", "  ", "[]", "{\"tasks\": []}", "{\"lastActiveTime\": \"yesterday\"}"] {
            assert!(
                matches!(
                    LocalSnapshot::from_bytes(bad.as_bytes()),
                    Err(SyncError::InvalidSnapshot(_))
                ),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(temp.path().join("data.json"));

        let snapshot = store.capture().unwrap();
        assert_eq!(snapshot, LocalSnapshot::empty());
        assert_eq!(
            store.local_last_active().unwrap(),
            DateTime::<Utc>::UNIX_EPOCH
        );
    }

    #[test]
    fn test_file_store_overwrite_replaces_everything() {
        let temp = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(temp.path().join("nested").join("data.json"));

        let mut state = Map::new();
        state.insert("notes".to_string(), json!(["a", "b"]));
        let snapshot = LocalSnapshot::new(Utc::now(), state);

        store.overwrite(&snapshot).unwrap();
        assert_eq!(store.capture().unwrap(), snapshot);

        store.overwrite(&LocalSnapshot::empty()).unwrap();
        assert!(store.capture().unwrap().state.is_empty());
    }
}
