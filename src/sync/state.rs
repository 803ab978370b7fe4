use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name used when no sync file name is configured
pub const DEFAULT_SYNC_FILE_NAME: &str = "SUPER_PRODUCTIVITY_SYNC.json";

/// Periodic sync intervals below this are refused
pub const MIN_SYNC_INTERVAL_MS: u64 = 5000;

/// Five minutes
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 300_000;

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Sync settings and bookkeeping
///
/// The flags and interval are user settings. `remote_file_id` and the three
/// timestamps are bookkeeping written only by the engine; an epoch timestamp
/// means "never".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub is_enabled: bool,
    pub is_auto_login: bool,
    pub is_auto_sync_to_remote: bool,
    pub is_notify_on_sync: bool,
    pub is_load_remote_data_on_startup: bool,
    pub sync_interval_ms: u64,
    pub sync_file_name: String,

    /// Identity of the provisioned remote file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_file_id: Option<String>,

    /// When local application data last changed
    pub last_local_update: DateTime<Utc>,

    /// Remote modification time reported by the last successful push
    pub last_sync_to_remote: DateTime<Utc>,

    /// When a pull last completed
    pub last_sync_from_remote: DateTime<Utc>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            is_enabled: false,
            is_auto_login: false,
            is_auto_sync_to_remote: false,
            is_notify_on_sync: false,
            is_load_remote_data_on_startup: false,
            sync_interval_ms: DEFAULT_SYNC_INTERVAL_MS,
            sync_file_name: DEFAULT_SYNC_FILE_NAME.to_string(),
            remote_file_id: None,
            last_local_update: epoch(),
            last_sync_to_remote: epoch(),
            last_sync_from_remote: epoch(),
        }
    }
}

impl SyncConfig {
    /// The name used to locate or create the remote file.
    pub fn effective_file_name(&self) -> &str {
        let name = self.sync_file_name.trim();
        if name.is_empty() {
            DEFAULT_SYNC_FILE_NAME
        } else {
            name
        }
    }

    /// Whether the periodic timer should run with these settings.
    pub fn wants_auto_sync(&self) -> bool {
        self.is_enabled && self.is_auto_sync_to_remote
    }

    /// Apply user-editable fields. Returns true if anything changed.
    ///
    /// A new file name drops the current `remote_file_id` so the next sync
    /// provisions the file again.
    pub fn apply(&mut self, update: &SettingsUpdate) -> bool {
        let before = self.clone();

        if let Some(v) = update.is_enabled {
            self.is_enabled = v;
        }
        if let Some(v) = update.is_auto_login {
            self.is_auto_login = v;
        }
        if let Some(v) = update.is_auto_sync_to_remote {
            self.is_auto_sync_to_remote = v;
        }
        if let Some(v) = update.is_notify_on_sync {
            self.is_notify_on_sync = v;
        }
        if let Some(v) = update.is_load_remote_data_on_startup {
            self.is_load_remote_data_on_startup = v;
        }
        if let Some(v) = update.sync_interval_ms {
            self.sync_interval_ms = v;
        }
        if let Some(name) = &update.sync_file_name {
            if name.trim() != self.sync_file_name.trim() {
                self.sync_file_name = name.trim().to_string();
                self.remote_file_id = None;
            }
        }

        *self != before
    }
}

/// Partial update of the user-editable settings
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub is_enabled: Option<bool>,
    pub is_auto_login: Option<bool>,
    pub is_auto_sync_to_remote: Option<bool>,
    pub is_notify_on_sync: Option<bool>,
    pub is_load_remote_data_on_startup: Option<bool>,
    pub sync_interval_ms: Option<u64>,
    pub sync_file_name: Option<String>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.is_enabled.is_none()
            && self.is_auto_login.is_none()
            && self.is_auto_sync_to_remote.is_none()
            && self.is_notify_on_sync.is_none()
            && self.is_load_remote_data_on_startup.is_none()
            && self.sync_interval_ms.is_none()
            && self.sync_file_name.is_none()
    }
}

/// Persistence for [`SyncConfig`]
pub trait SyncConfigStore: Send + Sync {
    fn load(&self) -> Result<SyncConfig>;
    fn save(&self, config: &SyncConfig) -> Result<()>;
}

/// [`SyncConfigStore`] over a TOML file
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileConfigStore { path: path.into() }
    }

    /// Store at the platform config location (`config.toml`).
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(crate::config::ConfigManager::sync_config_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SyncConfigStore for FileConfigStore {
    /// Load configuration from file, falling back to defaults when it does not exist yet
    fn load(&self) -> Result<SyncConfig> {
        if !self.path.exists() {
            return Ok(SyncConfig::default());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config file: {}", self.path.display()))?;

        let config: SyncConfig =
            toml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    fn save(&self, config: &SyncConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write config file: {}", self.path.display()))?;

        Ok(())
    }
}
