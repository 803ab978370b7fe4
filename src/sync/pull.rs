use chrono::{DateTime, Utc};

use crate::error::SyncError;
use crate::notify::Notification;
use crate::prompt::{Decision, PromptContext, PromptKind};
use crate::remote::RemoteFileMetadata;
use crate::snapshot::LocalSnapshot;

use super::engine::SyncEngine;
use super::provision::Provisioned;
use super::timestamps::is_newer_than;

/// Result of [`SyncEngine::pull`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// Remote data replaced local data
    Imported { remote_last_active: DateTime<Utc> },
    /// Nothing newer on the drive since the last pull
    UpToDate,
    /// The user cancelled at a prompt
    Cancelled,
    /// Local data was written to the drive instead
    PushedInstead(RemoteFileMetadata),
}

impl SyncEngine {
    /// Replace local data with the remote snapshot.
    ///
    /// Unlike [`SyncEngine::push`], a busy guard is an error
    /// ([`SyncError::SyncBusy`]) so an interactive caller can ask the user to
    /// retry. `skip_in_progress_check` runs without taking the guard.
    pub async fn pull(
        &self,
        force: bool,
        skip_in_progress_check: bool,
    ) -> Result<PullOutcome, SyncError> {
        let _guard = if skip_in_progress_check {
            None
        } else {
            match self.try_acquire() {
                Some(guard) => Some(guard),
                None => {
                    let err = SyncError::SyncBusy;
                    self.report_failure(&err);
                    return Err(err);
                }
            }
        };

        let result = self.pull_locked(force).await;
        if let Err(e) = &result {
            self.report_failure(e);
        }
        result
    }

    async fn pull_locked(&self, force: bool) -> Result<PullOutcome, SyncError> {
        let id = match self.ensure_remote_file().await? {
            Provisioned::Aborted => return Ok(PullOutcome::Cancelled),
            Provisioned::CreateConfirmed => {
                // nothing to load yet: seed the new file with local data
                let metadata = self.write_snapshot(None).await?;
                return Ok(PullOutcome::PushedInstead(metadata));
            }
            Provisioned::Existing(id) | Provisioned::Reused(id) => id,
        };

        self.pull_from(&id, force).await
    }

    /// Pull steps after provisioning: read, compare, confirm, import.
    pub(super) async fn pull_from(&self, id: &str, force: bool) -> Result<PullOutcome, SyncError> {
        let bytes = self.gateway.read_content(id).await?;
        let remote = LocalSnapshot::from_bytes(&bytes)?;

        let (last_sync_from_remote, file_name) = {
            let config = self.config.read().await;
            (
                config.last_sync_from_remote,
                config.effective_file_name().to_string(),
            )
        };

        if !force && !is_newer_than(remote.last_active_time, last_sync_from_remote) {
            log::info!(
                "Remote data (last active {}) already pulled at {}",
                remote.last_active_time,
                last_sync_from_remote
            );
            self.notifier.notify(Notification::AlreadyUpToDate);
            return Ok(PullOutcome::UpToDate);
        }

        let local_last_active = self
            .snapshots
            .local_last_active()
            .map_err(SyncError::LocalStore)?;
        let skip_confirm = force || is_newer_than(remote.last_active_time, local_last_active);
        log::debug!(
            "Pull comparison: remote {} local {} skip confirm {}",
            remote.last_active_time,
            local_last_active,
            skip_confirm
        );

        if !skip_confirm {
            let context = PromptContext {
                file_name,
                remote_modified: Some(remote.last_active_time),
                local_last_active: Some(local_last_active),
                last_sync: Some(last_sync_from_remote),
            };

            match self.decide(PromptKind::PullConflict, &context).await? {
                Decision::LoadFromRemote => {
                    log::info!("Pull conflict resolved: overwriting local data");
                }
                Decision::SaveToRemoteInstead => {
                    log::info!("Pull conflict resolved: saving local data instead");
                    let metadata = self.write_snapshot(Some(id)).await?;
                    return Ok(PullOutcome::PushedInstead(metadata));
                }
                _ => {
                    log::info!("Pull cancelled at conflict prompt");
                    return Ok(PullOutcome::Cancelled);
                }
            }
        }

        self.import_snapshot(&remote).await?;
        Ok(PullOutcome::Imported {
            remote_last_active: remote.last_active_time,
        })
    }
}
