// Module declarations
mod engine;
mod provision;
mod pull;
mod push;
mod scheduler;
mod startup;
mod state;
mod status;
pub mod timestamps;

// Re-export public types and functions
pub use engine::SyncEngine;
pub use provision::FileChange;
pub use pull::PullOutcome;
pub use push::PushOutcome;
pub use startup::StartupCheck;
pub use state::{
    FileConfigStore, SettingsUpdate, SyncConfig, SyncConfigStore, DEFAULT_SYNC_FILE_NAME,
    DEFAULT_SYNC_INTERVAL_MS, MIN_SYNC_INTERVAL_MS,
};
pub use status::show_status;
