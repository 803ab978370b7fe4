use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{RemoteError, RemoteFileGateway, RemoteFileMetadata};

const INDEX_FILE: &str = "index.json";
const BLOB_EXTENSION: &str = "blob";

#[derive(Debug, Default, Serialize, Deserialize)]
struct DriveIndex {
    #[serde(default)]
    files: BTreeMap<String, IndexEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    name: String,
    modified_at: DateTime<Utc>,
}

/// A drive backed by a local (or mounted) directory.
///
/// Layout:
/// - `index.json`: id -> `{ name, modified_at }`
/// - `<id>.blob`: file content
///
/// Several files may share a name, as on real cloud drives.
pub struct DirectoryGateway {
    root: PathBuf,
    // serializes index read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl DirectoryGateway {
    /// Use an existing directory as the drive root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryGateway {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create the drive root if needed.
    pub fn create(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            anyhow::anyhow!("Failed to create drive directory {}: {}", root.display(), e)
        })?;
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    /// Content path for `id`. Ids that could escape the drive root never exist.
    fn blob_path(&self, id: &str) -> Result<PathBuf, RemoteError> {
        let is_plain = !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(['/', '\\'])
            && Path::new(id).components().count() == 1;
        if !is_plain {
            log::warn!("Rejecting drive file id {:?}", id);
            return Err(RemoteError::NotFound(id.to_string()));
        }
        Ok(self.root.join(format!("{id}.{BLOB_EXTENSION}")))
    }

    async fn ensure_root(&self) -> Result<(), RemoteError> {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(RemoteError::Unavailable(format!(
                "drive root {} is not a directory",
                self.root.display()
            ))),
            Err(e) => Err(unavailable(&self.root, e)),
        }
    }

    async fn load_index(&self) -> Result<DriveIndex, RemoteError> {
        self.ensure_root().await?;
        let path = self.index_path();

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(DriveIndex::default()),
            Err(e) => return Err(unavailable(&path, e)),
        };

        serde_json::from_str(&content).map_err(|e| {
            RemoteError::Unavailable(format!("corrupt drive index {}: {}", path.display(), e))
        })
    }

    async fn save_index(&self, index: &DriveIndex) -> Result<(), RemoteError> {
        let content = serde_json::to_vec_pretty(index)
            .map_err(|e| RemoteError::Unavailable(format!("failed to encode drive index: {e}")))?;
        write_atomically(&self.index_path(), &content).await
    }
}

#[async_trait]
impl RemoteFileGateway for DirectoryGateway {
    async fn find_by_name(&self, name: &str) -> Result<Vec<RemoteFileMetadata>, RemoteError> {
        let index = self.load_index().await?;
        Ok(index
            .files
            .iter()
            .filter(|(_, entry)| entry.name == name)
            .map(|(id, entry)| to_metadata(id, entry))
            .collect())
    }

    async fn get_metadata(&self, id: &str) -> Result<RemoteFileMetadata, RemoteError> {
        let index = self.load_index().await?;
        index
            .files
            .get(id)
            .map(|entry| to_metadata(id, entry))
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }

    async fn read_content(&self, id: &str) -> Result<Vec<u8>, RemoteError> {
        let path = self.blob_path(id)?;
        let index = self.load_index().await?;
        if !index.files.contains_key(id) {
            return Err(RemoteError::NotFound(id.to_string()));
        }

        match tokio::fs::read(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RemoteError::NotFound(id.to_string()))
            }
            Err(e) => Err(unavailable(&path, e)),
        }
    }

    async fn write_content(
        &self,
        id: Option<&str>,
        name: &str,
        content: &[u8],
    ) -> Result<RemoteFileMetadata, RemoteError> {
        if let Some(id) = id {
            self.blob_path(id)?;
        }

        let _guard = self.write_lock.lock().await;
        let mut index = self.load_index().await?;

        let (id, previous) = match id {
            Some(id) => {
                let entry = index
                    .files
                    .get(id)
                    .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
                (id.to_string(), Some(entry.modified_at))
            }
            None => (uuid::Uuid::new_v4().to_string(), None),
        };

        write_atomically(&self.blob_path(&id)?, content).await?;

        let entry = IndexEntry {
            name: name.to_string(),
            modified_at: next_modified_at(previous),
        };
        let metadata = to_metadata(&id, &entry);
        index.files.insert(id, entry);
        self.save_index(&index).await?;

        log::debug!(
            "Wrote {} bytes to drive file {} ({})",
            content.len(),
            metadata.id,
            metadata.name
        );
        Ok(metadata)
    }
}

/// Millisecond-precision write time that never goes backwards for one file.
fn next_modified_at(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now().trunc_subsecs(3);
    match previous {
        Some(prev) if prev >= now => prev + Duration::milliseconds(1),
        _ => now,
    }
}

fn to_metadata(id: &str, entry: &IndexEntry) -> RemoteFileMetadata {
    RemoteFileMetadata {
        id: id.to_string(),
        name: entry.name.clone(),
        modified_at: entry.modified_at,
    }
}

fn unavailable(path: &Path, err: std::io::Error) -> RemoteError {
    RemoteError::Unavailable(format!("{}: {}", path.display(), err))
}

async fn write_atomically(path: &Path, content: &[u8]) -> Result<(), RemoteError> {
    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, content)
        .await
        .map_err(|e| unavailable(&tmp_path, e))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| unavailable(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_then_overwrite() {
        let temp = TempDir::new().unwrap();
        let drive = DirectoryGateway::new(temp.path());

        let created = drive
            .write_content(None, "sync.json", b"{\"v\":1}")
            .await
            .unwrap();
        assert_eq!(created.name, "sync.json");

        let updated = drive
            .write_content(Some(&created.id), "sync.json", b"{\"v\":2}")
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert!(updated.modified_at > created.modified_at);

        let content = drive.read_content(&created.id).await.unwrap();
        assert_eq!(content, b"{\"v\":2}");

        let meta = drive.get_metadata(&created.id).await.unwrap();
        assert_eq!(meta, updated);
    }

    #[tokio::test]
    async fn test_find_by_name_returns_all_matches() {
        let temp = TempDir::new().unwrap();
        let drive = DirectoryGateway::new(temp.path());

        assert!(drive.find_by_name("sync.json").await.unwrap().is_empty());

        drive.write_content(None, "sync.json", b"a").await.unwrap();
        drive.write_content(None, "other.json", b"b").await.unwrap();
        assert_eq!(drive.find_by_name("sync.json").await.unwrap().len(), 1);

        drive.write_content(None, "sync.json", b"c").await.unwrap();
        assert_eq!(drive.find_by_name("sync.json").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let temp = TempDir::new().unwrap();
        let drive = DirectoryGateway::new(temp.path());

        assert!(matches!(
            drive.get_metadata("missing").await,
            Err(RemoteError::NotFound(_))
        ));
        assert!(matches!(
            drive.read_content("missing").await,
            Err(RemoteError::NotFound(_))
        ));
        assert!(matches!(
            drive.write_content(Some("missing"), "sync.json", b"x").await,
            Err(RemoteError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ids_cannot_leave_the_drive_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("drive");
        let drive = DirectoryGateway::create(&root).unwrap();
        std::fs::write(temp.path().join("secret.blob"), b"outside").unwrap();

        // hand-edited index pointing outside the root
        std::fs::write(
            root.join(INDEX_FILE),
            r#"{"files":{"../secret":{"name":"sync.json","modified_at":"2024-01-01T00:00:00Z"}}}"#,
        )
        .unwrap();

        assert!(matches!(
            drive.read_content("../secret").await,
            Err(RemoteError::NotFound(_))
        ));
        assert!(matches!(
            drive.write_content(Some("../secret"), "sync.json", b"x").await,
            Err(RemoteError::NotFound(_))
        ));
        assert!(matches!(
            drive.write_content(Some("a/b"), "sync.json", b"x").await,
            Err(RemoteError::NotFound(_))
        ));
        assert_eq!(
            std::fs::read(temp.path().join("secret.blob")).unwrap(),
            b"outside"
        );
    }

    #[tokio::test]
    async fn test_missing_root_is_unavailable() {
        let temp = TempDir::new().unwrap();
        let drive = DirectoryGateway::new(temp.path().join("not-mounted"));

        assert!(matches!(
            drive.find_by_name("sync.json").await,
            Err(RemoteError::Unavailable(_))
        ));
    }

    #[test]
    fn test_modified_at_never_goes_backwards() {
        let future = Utc::now() + Duration::seconds(60);
        let next = next_modified_at(Some(future));
        assert_eq!(next, future + Duration::milliseconds(1));
    }
}
