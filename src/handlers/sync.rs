//! Push, pull and watch command handlers

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ConfigManager;
use crate::notify::ConsoleNotifier;
use crate::prompt::{
    is_interactive, AutoPrompt, ConflictResolutionPrompt, Decision, InteractivePrompt,
};
use crate::remote::DirectoryGateway;
use crate::snapshot::FileSnapshotStore;
use crate::sync::{FileConfigStore, PullOutcome, PushOutcome, StartupCheck, SyncEngine};

/// Where the engine's collaborators live
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Sync config file (default: config.toml in the config dir)
    pub config_path: Option<PathBuf>,
    /// Local application data file (default: snapshot.json in the config dir)
    pub data_path: Option<PathBuf>,
    /// Directory acting as the drive (default: drive/ in the config dir)
    pub drive_dir: Option<PathBuf>,
    /// Answer every prompt with its default instead of asking
    pub assume_yes: bool,
}

/// Wire the file-based collaborators into an engine
pub fn build_engine(options: &EngineOptions) -> Result<Arc<SyncEngine>> {
    let config_store = match &options.config_path {
        Some(path) => FileConfigStore::new(path),
        None => FileConfigStore::default_location()?,
    };
    let data_path = match &options.data_path {
        Some(path) => path.clone(),
        None => ConfigManager::default_snapshot_path()?,
    };
    let drive_dir = match &options.drive_dir {
        Some(path) => path.clone(),
        None => ConfigManager::default_drive_dir()?,
    };

    let gateway = DirectoryGateway::create(&drive_dir)?;
    log::debug!(
        "Drive: {}, local data: {}, config: {}",
        gateway.root().display(),
        data_path.display(),
        config_store.path().display()
    );

    let prompt: Arc<dyn ConflictResolutionPrompt> = if options.assume_yes {
        Arc::new(AutoPrompt::accept_all())
    } else if is_interactive() {
        Arc::new(InteractivePrompt)
    } else {
        log::warn!("No interactive terminal; prompts will be declined (use --yes to accept)");
        Arc::new(AutoPrompt::new(Decision::Cancel))
    };

    let engine = SyncEngine::new(
        Arc::new(gateway),
        Arc::new(FileSnapshotStore::new(data_path)),
        prompt,
        Arc::new(config_store),
        Arc::new(ConsoleNotifier),
    )
    .context("Failed to load sync configuration")?;

    Ok(Arc::new(engine))
}

/// Handle `push`
pub async fn handle_push(engine: &SyncEngine, force: bool) -> Result<()> {
    println!("{}", "Pushing local data to drive...".cyan().bold());

    match engine.push(force).await? {
        PushOutcome::Pushed(metadata) => {
            println!(
                "  {} Saved to {} (remote modified {})",
                "✓".green(),
                metadata.name.cyan(),
                metadata.modified_at
            );
            record_outcome(&format!("Pushed to {} ({})", metadata.name, metadata.id));
        }
        PushOutcome::PulledInstead(outcome) => {
            println!("  {} Loaded remote data instead", "↓".cyan());
            print_pull_outcome(&outcome);
        }
        PushOutcome::Skipped => println!("  {} Push skipped", "Note:".yellow()),
        PushOutcome::Cancelled => println!("  {} Push cancelled", "Note:".yellow()),
    }

    Ok(())
}

/// Handle `pull`
pub async fn handle_pull(engine: &SyncEngine, force: bool) -> Result<()> {
    println!("{}", "Loading data from drive...".cyan().bold());

    let outcome = engine.pull(force, false).await?;
    print_pull_outcome(&outcome);
    if let PullOutcome::Imported { remote_last_active } = outcome {
        record_outcome(&format!(
            "Imported remote data (last active {remote_last_active})"
        ));
    }

    Ok(())
}

/// Append to the log file; the sync already happened, so failure only warns.
fn record_outcome(message: &str) {
    if let Err(e) = crate::logger::log_to_file(message) {
        log::warn!("Could not write to log file: {:#}", e);
    }
}

fn print_pull_outcome(outcome: &PullOutcome) {
    match outcome {
        PullOutcome::Imported { remote_last_active } => println!(
            "  {} Local data replaced (remote last active {})",
            "✓".green(),
            remote_last_active
        ),
        PullOutcome::UpToDate => {}
        PullOutcome::Cancelled => println!("  {} Pull cancelled", "Note:".yellow()),
        PullOutcome::PushedInstead(metadata) => println!(
            "  {} Saved local data to {} instead",
            "↑".cyan(),
            metadata.name.cyan()
        ),
    }
}

/// Handle `watch`: startup check, then push on the timer until Ctrl-C
pub async fn handle_watch(engine: Arc<SyncEngine>) -> Result<()> {
    let config = engine.config().await;
    if !config.is_enabled {
        println!(
            "{} Sync is disabled. Enable it with {}",
            "Note:".yellow(),
            "drive-sync config --enable".bold()
        );
        return Ok(());
    }

    match engine.check_for_initial_update().await {
        Ok(StartupCheck::Pulled(outcome)) => print_pull_outcome(&outcome),
        Ok(StartupCheck::NoUpdate) => println!("  {} No remote update", "✓".green()),
        Ok(_) => {}
        // already shown by the notifier; keep watching
        Err(e) => log::warn!("Startup check failed: {}", e),
    }

    if !engine.arm_timer().await {
        println!(
            "{} Auto sync is off or the interval is below 5s; nothing to watch",
            "Note:".yellow()
        );
        return Ok(());
    }

    println!(
        "{} every {}s. Press Ctrl-C to stop.",
        "Watching: pushing".cyan().bold(),
        config.sync_interval_ms / 1000
    );
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    engine.disarm_timer();
    println!("\n{}", "Stopped.".green());
    Ok(())
}
