use crate::error::SyncError;
use crate::notify::Notification;
use crate::prompt::{Decision, PromptContext, PromptKind};
use crate::remote::RemoteFileMetadata;

use super::engine::SyncEngine;
use super::provision::Provisioned;
use super::pull::PullOutcome;
use super::timestamps::is_newer_than;

/// Result of [`SyncEngine::push`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Local data was written to the drive
    Pushed(RemoteFileMetadata),
    /// Another operation was running, sync is disabled, or provisioning was declined
    Skipped,
    /// The user cancelled at the conflict prompt
    Cancelled,
    /// The user chose to load the remote data instead
    PulledInstead(PullOutcome),
}

impl SyncEngine {
    /// Write the local snapshot to the drive.
    ///
    /// Returns [`PushOutcome::Skipped`] rather than an error when another
    /// operation holds the guard. With `force` the conflict check is skipped
    /// and the guard is not required.
    pub async fn push(&self, force: bool) -> Result<PushOutcome, SyncError> {
        let _guard = match self.try_acquire() {
            Some(guard) => Some(guard),
            None if force => {
                log::debug!("Forced push while another sync operation is running");
                None
            }
            None => {
                log::info!("Push skipped: another sync operation is in progress");
                return Ok(PushOutcome::Skipped);
            }
        };

        let notify_progress = self.config.read().await.is_notify_on_sync;
        if notify_progress {
            self.notifier.notify(Notification::SyncInProgress);
        }

        let result = self.push_locked(force).await;

        if notify_progress {
            self.notifier.notify(Notification::SyncFinished);
        }
        if let Err(e) = &result {
            self.report_failure(e);
        }
        result
    }

    async fn push_locked(&self, force: bool) -> Result<PushOutcome, SyncError> {
        let remote_id = match self.ensure_remote_file().await? {
            Provisioned::Aborted => return Ok(PushOutcome::Skipped),
            Provisioned::CreateConfirmed => None,
            Provisioned::Existing(id) | Provisioned::Reused(id) => Some(id),
        };

        if let (Some(id), false) = (remote_id.as_deref(), force) {
            let metadata = self.gateway.get_metadata(id).await?;
            let (last_sync_to_remote, file_name) = {
                let config = self.config.read().await;
                (
                    config.last_sync_to_remote,
                    config.effective_file_name().to_string(),
                )
            };

            if is_newer_than(metadata.modified_at, last_sync_to_remote) {
                log::info!(
                    "Remote changed since last push ({} > {})",
                    metadata.modified_at,
                    last_sync_to_remote
                );
                let context = PromptContext {
                    file_name,
                    remote_modified: Some(metadata.modified_at),
                    local_last_active: self.snapshots.local_last_active().ok(),
                    last_sync: Some(last_sync_to_remote),
                };

                match self.decide(PromptKind::PushConflict, &context).await? {
                    Decision::PullInstead => {
                        log::info!("Push conflict resolved: loading remote data instead");
                        let pulled = self.pull_from(id, true).await?;
                        return Ok(PushOutcome::PulledInstead(pulled));
                    }
                    Decision::PushAnyway => {
                        log::info!("Push conflict resolved: overwriting remote data");
                    }
                    _ => {
                        log::info!("Push cancelled at conflict prompt");
                        return Ok(PushOutcome::Cancelled);
                    }
                }
            }
        }

        let metadata = self.write_snapshot(remote_id.as_deref()).await?;
        Ok(PushOutcome::Pushed(metadata))
    }

    /// Push from the periodic timer: only when sync and auto-sync are enabled.
    ///
    /// Settings are re-read from the store first, so `config --disable` from
    /// another process stops the next tick.
    pub async fn save_for_sync_if_enabled(&self) -> Result<PushOutcome, SyncError> {
        let config = match self.reload_config().await {
            Ok(config) => config,
            Err(e) => {
                self.report_failure(&e);
                return Err(e);
            }
        };
        if !config.wants_auto_sync() {
            log::debug!("Auto sync disabled, nothing to do");
            return Ok(PushOutcome::Skipped);
        }
        self.push(false).await
    }
}
