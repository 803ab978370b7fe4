//! Error taxonomy for sync operations.

use crate::remote::RemoteError;

/// Errors surfaced by [`crate::sync::SyncEngine`] operations.
///
/// A user declining a prompt is not an error: it shows up as a `Cancelled`
/// or `Skipped` outcome. [`SyncError::UserCancelled`] only exists so prompt
/// implementations can report an interrupted dialog (Esc, Ctrl-C), which the
/// engine folds back into a cancel.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Network, authentication or IO failure talking to the drive.
    #[error("Remote drive unavailable: {0}")]
    RemoteUnavailable(String),

    /// The configured remote file id no longer resolves.
    #[error("Remote sync file '{id}' no longer exists. Choose the sync file again in settings.")]
    RemoteNotFound { id: String },

    /// More than one remote file carries the sync file name.
    #[error(
        "Multiple files with the name \"{name}\" found ({count}). Please delete all but one or choose a different name."
    )]
    AmbiguousRemoteFile { name: String, count: usize },

    /// A pull was requested while another sync operation holds the guard.
    #[error("Another sync operation is in progress. Please retry in a moment.")]
    SyncBusy,

    #[error("Cancelled by user")]
    UserCancelled,

    /// Snapshot data that cannot be uploaded or imported.
    #[error("Invalid snapshot data: {0}")]
    InvalidSnapshot(String),

    #[error("Local data store error: {0:#}")]
    LocalStore(anyhow::Error),

    #[error("Sync config store error: {0:#}")]
    ConfigStore(anyhow::Error),

    #[error("Prompt failed: {0}")]
    Prompt(String),
}

impl SyncError {
    /// Whether the user has to act (settings, remote cleanup) before syncing can succeed.
    pub fn is_actionable(&self) -> bool {
        matches!(
            self,
            SyncError::RemoteNotFound { .. } | SyncError::AmbiguousRemoteFile { .. }
        )
    }
}

impl From<RemoteError> for SyncError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Unavailable(msg) => SyncError::RemoteUnavailable(msg),
            RemoteError::NotFound(id) => SyncError::RemoteNotFound { id },
        }
    }
}
