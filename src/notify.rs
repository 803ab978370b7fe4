//! Fire-and-forget user notifications.

use colored::Colorize;

/// Something the user should be told about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A long-running sync has started
    SyncInProgress,
    /// The sync announced by `SyncInProgress` has ended (successfully or not)
    SyncFinished,
    /// Local data already matches the drive
    AlreadyUpToDate,
    /// The drive has newer data than this instance; downloading
    RemoteUpdateAvailable,
    /// Several remote files share the sync file name
    AmbiguousRemoteFile { name: String },
    /// The configured remote file is gone
    StaleRemoteFile { id: String },
    /// Dismissible failure
    Failed(String),
}

/// Displays notifications. Display failures are never reported back.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Prints notifications to the console.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::SyncInProgress => {
                println!("  {} to drive...", "Syncing".cyan());
            }
            Notification::SyncFinished => {
                println!("  {} Sync finished", "✓".green());
            }
            Notification::AlreadyUpToDate => {
                println!("  {} Data already up to date", "✓".green());
            }
            Notification::RemoteUpdateAvailable => {
                println!(
                    "  {} There is a remote update! Downloading...",
                    "↓".cyan().bold()
                );
            }
            Notification::AmbiguousRemoteFile { name } => {
                eprintln!(
                    "  {} Multiple files named \"{}\" found on the drive. Delete all but one or run {} to choose another name.",
                    "✗".red(),
                    name,
                    "drive-sync config --file-name <NAME>".bold()
                );
            }
            Notification::StaleRemoteFile { id } => {
                eprintln!(
                    "  {} The sync file ({}) no longer exists on the drive. Run {} to choose it again.",
                    "✗".red(),
                    id.dimmed(),
                    "drive-sync config --file-name <NAME>".bold()
                );
            }
            Notification::Failed(message) => {
                eprintln!("  {} {}", "✗".red(), message);
            }
        }
    }
}

/// Notifier for headless runs: everything goes to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Failed(_)
            | Notification::AmbiguousRemoteFile { .. }
            | Notification::StaleRemoteFile { .. } => log::warn!("{:?}", notification),
            _ => log::info!("{:?}", notification),
        }
    }
}
