use crate::error::SyncError;
use crate::prompt::{Decision, PromptContext, PromptKind};
use crate::remote::RemoteFileMetadata;

use super::engine::SyncEngine;

/// Result of making sure a remote file is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Provisioned {
    /// `remote_file_id` was already set
    Existing(String),
    /// The user agreed to use the single existing file with the sync file name
    Reused(String),
    /// No file exists and the user agreed to create one; the next write creates it
    CreateConfirmed,
    /// The user declined
    Aborted,
}

/// Result of [`SyncEngine::change_sync_file_name`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// A new remote file was created from the local data
    Created(RemoteFileMetadata),
    /// An existing remote file is now the sync file
    Reused(String),
    /// The user declined; the next sync asks again
    Aborted,
}

impl SyncEngine {
    /// Find, confirm or prepare creation of the remote file.
    ///
    /// Zero matches ask to create, one match asks to reuse, several matches
    /// fail with [`SyncError::AmbiguousRemoteFile`] without touching anything.
    pub(super) async fn ensure_remote_file(&self) -> Result<Provisioned, SyncError> {
        let (existing, file_name) = {
            let config = self.config.read().await;
            (
                config.remote_file_id.clone(),
                config.effective_file_name().to_string(),
            )
        };

        if let Some(id) = existing {
            return Ok(Provisioned::Existing(id));
        }

        log::info!("No remote sync file configured, looking for \"{}\"", file_name);
        let mut matches = self.gateway.find_by_name(&file_name).await?;
        let context = PromptContext::for_file(file_name.clone());

        match matches.len() {
            0 => match self.decide(PromptKind::CreateFile, &context).await? {
                Decision::Confirm => {
                    log::info!("Creating new remote sync file \"{}\"", file_name);
                    Ok(Provisioned::CreateConfirmed)
                }
                _ => {
                    log::info!("Creating \"{}\" declined", file_name);
                    Ok(Provisioned::Aborted)
                }
            },
            1 => {
                let found = matches.remove(0);
                let context = PromptContext {
                    remote_modified: Some(found.modified_at),
                    ..context
                };
                match self.decide(PromptKind::ReuseFile, &context).await? {
                    Decision::Confirm => {
                        let id = found.id.clone();
                        self.commit(|config| {
                            config.remote_file_id = Some(found.id);
                        })
                        .await?;
                        log::info!("Using existing remote file {} as sync file", id);
                        Ok(Provisioned::Reused(id))
                    }
                    _ => {
                        log::info!("Reusing \"{}\" declined", file_name);
                        Ok(Provisioned::Aborted)
                    }
                }
            }
            count => Err(SyncError::AmbiguousRemoteFile {
                name: file_name,
                count,
            }),
        }
    }

    /// Switch to another sync file name and provision it right away.
    ///
    /// The name is stored and the old `remote_file_id` dropped even when the
    /// user declines, so the next push or pull asks again.
    pub async fn change_sync_file_name(&self, new_name: &str) -> Result<FileChange, SyncError> {
        let Some(_guard) = self.try_acquire() else {
            let err = SyncError::SyncBusy;
            self.report_failure(&err);
            return Err(err);
        };

        let result = self.change_sync_file_name_locked(new_name).await;
        if let Err(e) = &result {
            self.report_failure(e);
        }
        result
    }

    async fn change_sync_file_name_locked(&self, new_name: &str) -> Result<FileChange, SyncError> {
        let new_name = new_name.trim().to_string();
        self.commit(|config| {
            config.sync_file_name = new_name;
            config.remote_file_id = None;
        })
        .await?;

        match self.ensure_remote_file().await? {
            Provisioned::CreateConfirmed => {
                let metadata = self.write_snapshot(None).await?;
                Ok(FileChange::Created(metadata))
            }
            Provisioned::Reused(id) | Provisioned::Existing(id) => Ok(FileChange::Reused(id)),
            Provisioned::Aborted => Ok(FileChange::Aborted),
        }
    }
}
