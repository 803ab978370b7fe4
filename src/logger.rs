use anyhow::{Context, Result};
use log::LevelFilter;
use std::fs::OpenOptions;
use std::io::Write;

use crate::config::ConfigManager;

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Initialize the logging system
///
/// Sets up logging to both console and a log file in the config directory.
///
/// **Console logging** is controlled via the `RUST_LOG` environment variable
/// (`error`, `warn`, `info`, `debug`, `trace`, `off`); the default is `info`.
/// `verbose` raises the default to `debug` when `RUST_LOG` is unset.
///
/// **File logging** goes to `drive-sync.log` inside the config directory.
///
/// ```bash
/// # Follow every timer tick of the watcher
/// RUST_LOG=debug drive-sync watch
/// ```
pub fn init_logger(verbose: bool) -> Result<()> {
    ConfigManager::ensure_config_dir()?;

    let fallback = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let default_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(fallback);

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{:5}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(default_level)
        .target(env_logger::Target::Stderr)
        .try_init()
        .ok(); // already initialized in tests

    rotate_log_if_needed()?;
    log_to_file(&format!("Logger initialized with level: {default_level:?}"))?;

    Ok(())
}

/// Log to file only (used for sync outcomes that should survive the terminal session)
pub fn log_to_file(message: &str) -> Result<()> {
    let log_path = ConfigManager::log_file_path()?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    writeln!(
        file,
        "[{}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        message
    )?;

    Ok(())
}

/// Rotate log file if it exceeds the size limit (10MB)
pub fn rotate_log_if_needed() -> Result<()> {
    let log_path = ConfigManager::log_file_path()?;

    if log_path.exists() {
        let metadata = std::fs::metadata(&log_path)?;

        if metadata.len() > MAX_LOG_SIZE {
            let old_log_path = log_path.with_extension("log.old");

            if old_log_path.exists() {
                std::fs::remove_file(&old_log_path)?;
            }

            std::fs::rename(&log_path, &old_log_path)?;

            log::info!("Log file rotated to {}", old_log_path.display());
        }
    }

    Ok(())
}
