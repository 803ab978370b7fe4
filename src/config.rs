use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_DIR_NAME: &str = "drive-sync";

/// Cross-platform configuration directory manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the main configuration directory path following platform conventions:
    /// - Linux: $XDG_CONFIG_HOME/drive-sync or ~/.config/drive-sync
    /// - macOS: ~/Library/Application Support/drive-sync
    /// - Windows: %APPDATA%\drive-sync
    pub fn config_dir() -> Result<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
                Ok(PathBuf::from(xdg_config).join(APP_DIR_NAME))
            } else {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                Ok(home.join(".config").join(APP_DIR_NAME))
            }
        }

        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home
                .join("Library")
                .join("Application Support")
                .join(APP_DIR_NAME))
        }

        #[cfg(target_os = "windows")]
        {
            Ok(dirs::config_dir()
                .context("Failed to get Windows config directory")?
                .join(APP_DIR_NAME))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join(".drive-sync"))
        }
    }

    /// Sync settings and bookkeeping (config.toml)
    pub fn sync_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Default local application snapshot (snapshot.json)
    pub fn default_snapshot_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("snapshot.json"))
    }

    /// Default directory used as the remote drive
    pub fn default_drive_dir() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("drive"))
    }

    /// Get the log file path
    pub fn log_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("drive-sync.log"))
    }

    /// Ensure the configuration directory exists
    pub fn ensure_config_dir() -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;
        Ok(config_dir)
    }
}
