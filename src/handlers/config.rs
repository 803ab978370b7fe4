//! Configuration command handlers

use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;

use crate::sync::{show_status, FileChange, SettingsUpdate, SyncEngine, MIN_SYNC_INTERVAL_MS};

/// Handle `status`
pub async fn handle_status(engine: &SyncEngine) -> Result<()> {
    let config = engine.config().await;
    show_status(&config, engine.is_sync_in_progress());
    Ok(())
}

/// Handle `config`
///
/// A new file name is provisioned right away (find, confirm reuse or create);
/// everything else is stored as given.
pub async fn handle_config(
    engine: Arc<SyncEngine>,
    update: SettingsUpdate,
    show: bool,
) -> Result<()> {
    if show || update.is_empty() {
        return handle_status(&engine).await;
    }

    if let Some(interval) = update.sync_interval_ms {
        if interval < MIN_SYNC_INTERVAL_MS {
            println!(
                "  {} Interval {}ms is below the {}ms minimum; auto sync will not run",
                "Warning:".yellow(),
                interval,
                MIN_SYNC_INTERVAL_MS
            );
        }
    }

    let SettingsUpdate { sync_file_name, .. } = update.clone();
    let other_settings = SettingsUpdate {
        sync_file_name: None,
        ..update
    };

    if !other_settings.is_empty() {
        engine.update_settings(other_settings).await?;
        println!("  {} Settings saved", "✓".green());
    }

    if let Some(name) = sync_file_name {
        match engine.change_sync_file_name(&name).await? {
            FileChange::Created(metadata) => println!(
                "  {} Created {} on the drive ({})",
                "✓".green(),
                metadata.name.cyan(),
                metadata.id.dimmed()
            ),
            FileChange::Reused(id) => println!(
                "  {} Using existing file {} ({})",
                "✓".green(),
                name.cyan(),
                id.dimmed()
            ),
            FileChange::Aborted => println!(
                "  {} Sync file set to {}; it will be looked up again on the next sync",
                "Note:".yellow(),
                name.cyan()
            ),
        }
    }

    Ok(())
}
