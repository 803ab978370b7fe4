use colored::Colorize;

use crate::prompt::format_timestamp;

use super::state::{SyncConfig, MIN_SYNC_INTERVAL_MS};

fn on_off(value: bool) -> colored::ColoredString {
    if value {
        "On".green()
    } else {
        "Off".yellow()
    }
}

/// Print sync settings and bookkeeping
pub fn show_status(config: &SyncConfig, is_sync_in_progress: bool) {
    println!("{}", "=== Drive Sync Status ===".bold().cyan());
    println!();

    println!("{}", "Settings:".bold());
    println!("  Sync: {}", on_off(config.is_enabled));
    println!("  Auto sync to remote: {}", on_off(config.is_auto_sync_to_remote));
    let interval = format!("{}s", config.sync_interval_ms / 1000);
    if config.sync_interval_ms < MIN_SYNC_INTERVAL_MS {
        println!(
            "  Interval: {} {}",
            interval.red(),
            "(below 5s minimum, timer will not run)".dimmed()
        );
    } else {
        println!("  Interval: {}", interval.cyan());
    }
    println!("  Notify on sync: {}", on_off(config.is_notify_on_sync));
    println!(
        "  Load remote data on startup: {}",
        on_off(config.is_load_remote_data_on_startup)
    );
    println!("  Auto login: {}", on_off(config.is_auto_login));

    println!();
    println!("{}", "Remote file:".bold());
    println!("  Name: {}", config.effective_file_name().cyan());
    match &config.remote_file_id {
        Some(id) => println!("  Id: {}", id.cyan()),
        None => println!(
            "  Id: {}",
            "Not provisioned (next push or pull will look it up)".yellow()
        ),
    }

    println!();
    println!("{}", "Bookkeeping:".bold());
    println!(
        "  Last local update:     {}",
        format_timestamp(config.last_local_update).dimmed()
    );
    println!(
        "  Last sync to remote:   {}",
        format_timestamp(config.last_sync_to_remote).dimmed()
    );
    println!(
        "  Last sync from remote: {}",
        format_timestamp(config.last_sync_from_remote).dimmed()
    );

    if is_sync_in_progress {
        println!();
        println!("  {} A sync operation is in progress", "Note:".yellow());
    }
}
