use crate::error::SyncError;
use crate::notify::Notification;

use super::engine::SyncEngine;
use super::pull::PullOutcome;
use super::timestamps::is_newer_than;

/// Result of [`SyncEngine::check_for_initial_update`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupCheck {
    /// Sync or load-on-startup is turned off
    Disabled,
    /// No remote file provisioned yet
    NotProvisioned,
    /// The drive has nothing newer than local data
    NoUpdate,
    /// A newer remote version was found and pulled
    Pulled(PullOutcome),
}

impl SyncEngine {
    /// On startup, pull if the drive changed after our last local update.
    ///
    /// Only the cheap metadata call is made unless an update is found.
    pub async fn check_for_initial_update(&self) -> Result<StartupCheck, SyncError> {
        let config = self.config().await;
        if !config.is_enabled || !config.is_load_remote_data_on_startup {
            return Ok(StartupCheck::Disabled);
        }

        let Some(id) = config.remote_file_id else {
            log::info!("Startup check skipped: no remote sync file configured yet");
            return Ok(StartupCheck::NotProvisioned);
        };

        let metadata = match self.gateway.get_metadata(&id).await {
            Ok(metadata) => metadata,
            Err(e) => {
                let err = SyncError::from(e);
                self.report_failure(&err);
                return Err(err);
            }
        };

        log::debug!(
            "Startup check: remote modified {} vs last local update {}",
            metadata.modified_at,
            config.last_local_update
        );

        if !is_newer_than(metadata.modified_at, config.last_local_update) {
            return Ok(StartupCheck::NoUpdate);
        }

        log::info!("Remote sync file changed since last local update, pulling");
        self.notifier.notify(Notification::RemoteUpdateAvailable);
        let outcome = self.pull(true, false).await?;
        Ok(StartupCheck::Pulled(outcome))
    }
}
