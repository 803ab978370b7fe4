//! Remote drive abstraction.
//!
//! The engine only needs four file operations from a drive. Authentication,
//! HTTP transport and timeouts belong to the implementation.

mod directory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use directory::DirectoryGateway;

/// Metadata for a remote file, available without reading its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileMetadata {
    pub id: String,
    pub name: String,
    pub modified_at: DateTime<Utc>,
}

/// Errors reported by a [`RemoteFileGateway`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    /// Network, authentication or IO error
    #[error("{0}")]
    Unavailable(String),

    /// The id no longer resolves to a file
    #[error("file '{0}' not found")]
    NotFound(String),
}

/// Trait for cloud-drive file operations.
#[async_trait]
pub trait RemoteFileGateway: Send + Sync {
    /// List every file with the given name (zero, one or many).
    async fn find_by_name(&self, name: &str) -> Result<Vec<RemoteFileMetadata>, RemoteError>;

    /// Get metadata for a file.
    async fn get_metadata(&self, id: &str) -> Result<RemoteFileMetadata, RemoteError>;

    /// Read the full content of a file.
    async fn read_content(&self, id: &str) -> Result<Vec<u8>, RemoteError>;

    /// Create a file (`id == None`) or overwrite an existing one.
    ///
    /// The returned `modified_at` is the drive's own timestamp for this write.
    async fn write_content(
        &self,
        id: Option<&str>,
        name: &str,
        content: &[u8],
    ) -> Result<RemoteFileMetadata, RemoteError>;
}
