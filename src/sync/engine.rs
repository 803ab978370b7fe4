use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::error::SyncError;
use crate::notify::{Notification, Notifier};
use crate::prompt::{ConflictResolutionPrompt, Decision, PromptContext, PromptKind};
use crate::remote::{RemoteFileGateway, RemoteFileMetadata};
use crate::snapshot::{LocalSnapshot, LocalSnapshotStore};

use super::state::{SyncConfig, SyncConfigStore};

/// Orchestrates push, pull, provisioning and the periodic timer.
///
/// One instance per application, usually shared as `Arc<SyncEngine>`.
/// The config store holds the authoritative [`SyncConfig`]; the engine keeps
/// the last loaded or committed copy and hands out clones via
/// [`SyncEngine::config`].
pub struct SyncEngine {
    pub(super) gateway: Arc<dyn RemoteFileGateway>,
    pub(super) snapshots: Arc<dyn LocalSnapshotStore>,
    pub(super) prompt: Arc<dyn ConflictResolutionPrompt>,
    pub(super) config_store: Arc<dyn SyncConfigStore>,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) config: RwLock<SyncConfig>,
    in_progress: AtomicBool,
    pub(super) timer: StdMutex<Option<JoinHandle<()>>>,
}

/// Releases the single-flight flag when dropped, on every exit path.
pub(super) struct SyncGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl SyncEngine {
    /// Create an engine, loading its config from `config_store`.
    pub fn new(
        gateway: Arc<dyn RemoteFileGateway>,
        snapshots: Arc<dyn LocalSnapshotStore>,
        prompt: Arc<dyn ConflictResolutionPrompt>,
        config_store: Arc<dyn SyncConfigStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, SyncError> {
        let config = config_store.load().map_err(SyncError::ConfigStore)?;
        Ok(SyncEngine {
            gateway,
            snapshots,
            prompt,
            config_store,
            notifier,
            config: RwLock::new(config),
            in_progress: AtomicBool::new(false),
            timer: StdMutex::new(None),
        })
    }

    /// Current configuration and bookkeeping.
    pub async fn config(&self) -> SyncConfig {
        self.config.read().await.clone()
    }

    /// Whether a push or pull currently holds the single-flight guard.
    pub fn is_sync_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    pub(super) fn try_acquire(&self) -> Option<SyncGuard<'_>> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SyncGuard {
                flag: &self.in_progress,
            })
    }

    /// Re-read the config from the store, picking up edits made by other processes.
    pub async fn reload_config(&self) -> Result<SyncConfig, SyncError> {
        let mut config = self.config.write().await;
        let stored = self.config_store.load().map_err(SyncError::ConfigStore)?;
        *config = stored.clone();
        Ok(stored)
    }

    /// Apply `f` to the stored config and persist it.
    ///
    /// The store is re-read first so settings changed by another process
    /// survive. All fields touched by `f` land together; callers only commit
    /// after the corresponding remote operation has succeeded.
    pub(super) async fn commit<F>(&self, f: F) -> Result<SyncConfig, SyncError>
    where
        F: FnOnce(&mut SyncConfig),
    {
        let mut config = self.config.write().await;
        let mut updated = self.config_store.load().map_err(SyncError::ConfigStore)?;
        f(&mut updated);
        self.config_store
            .save(&updated)
            .map_err(SyncError::ConfigStore)?;
        *config = updated.clone();
        Ok(updated)
    }

    /// Ask the prompt, folding interrupted dialogs and out-of-set answers into `Cancel`.
    pub(super) async fn decide(
        &self,
        kind: PromptKind,
        context: &PromptContext,
    ) -> Result<Decision, SyncError> {
        match self.prompt.ask(kind, context).await {
            Ok(decision) if kind.allows(decision) => Ok(decision),
            Ok(decision) => {
                log::warn!(
                    "Prompt answered {:?} with {:?}, which is not an option; treating as cancel",
                    kind,
                    decision
                );
                Ok(Decision::Cancel)
            }
            Err(SyncError::UserCancelled) => Ok(Decision::Cancel),
            Err(e) => Err(e),
        }
    }

    /// Upload the current local snapshot, creating the remote file when `id` is `None`.
    ///
    /// On success the remote now equals local, so all three bookkeeping
    /// timestamps move to the drive's reported modification time. If the
    /// sync file was switched while the write was in flight, the written
    /// file is no longer ours and nothing is recorded.
    pub(super) async fn write_snapshot(
        &self,
        id: Option<&str>,
    ) -> Result<RemoteFileMetadata, SyncError> {
        let snapshot = self.snapshots.capture().map_err(SyncError::LocalStore)?;
        let bytes = snapshot.to_bytes()?;
        let file_name = self.config.read().await.effective_file_name().to_string();

        let metadata = self
            .gateway
            .write_content(id, &file_name, &bytes)
            .await?;

        let expected_id = id.map(str::to_string);
        let stamp = metadata.modified_at;
        let remote_id = metadata.id.clone();
        let mut recorded = false;
        self.commit(|config| {
            if config.remote_file_id != expected_id || config.effective_file_name() != file_name {
                return;
            }
            config.remote_file_id = Some(remote_id);
            config.last_sync_to_remote = stamp;
            config.last_local_update = stamp;
            config.last_sync_from_remote = stamp;
            recorded = true;
        })
        .await?;

        if recorded {
            log::info!(
                "Pushed {} bytes to {} ({}), remote modified at {}",
                bytes.len(),
                file_name,
                metadata.id,
                metadata.modified_at
            );
        } else {
            log::warn!(
                "Sync file changed during push; {} ({}) was written but is no longer the sync file",
                file_name,
                metadata.id
            );
        }
        Ok(metadata)
    }

    /// Replace local state with `snapshot` and record the pull.
    pub(super) async fn import_snapshot(&self, snapshot: &LocalSnapshot) -> Result<(), SyncError> {
        self.snapshots
            .overwrite(snapshot)
            .map_err(SyncError::LocalStore)?;

        let now = Utc::now();
        self.commit(move |config| {
            config.last_local_update = now;
            config.last_sync_from_remote = now;
        })
        .await?;

        log::info!(
            "Imported remote data (last active {})",
            snapshot.last_active_time
        );
        Ok(())
    }

    /// Tell the user about a failed operation.
    pub(super) fn report_failure(&self, err: &SyncError) {
        let notification = match err {
            SyncError::UserCancelled => return,
            SyncError::AmbiguousRemoteFile { name, .. } => {
                Notification::AmbiguousRemoteFile { name: name.clone() }
            }
            SyncError::RemoteNotFound { id } => Notification::StaleRemoteFile { id: id.clone() },
            other => Notification::Failed(other.to_string()),
        };
        log::warn!("Sync failed: {}", err);
        self.notifier.notify(notification);
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.disarm_timer();
    }
}
