//! # drive-sync
//!
//! Keeps a locally held application snapshot consistent with a single file
//! on a cloud drive.
//!
//! ## Overview
//!
//! The whole application state travels as one opaque JSON snapshot. There is
//! no field-level merge: when both sides changed, one side replaces the other
//! wholesale and the user picks which.
//!
//! - **Push** writes the local snapshot to the remote file, asking first if
//!   the remote changed since our last push.
//! - **Pull** reads the remote file and overwrites local state, asking first
//!   if local data might be newer.
//! - **Provisioning** finds the remote file by name, or offers to create it.
//! - A periodic timer pushes in the background, and a startup check pulls
//!   remote updates made by other devices.
//!
//! ## Architecture
//!
//! [`sync::SyncEngine`] owns the config and orchestrates the collaborators it
//! is constructed with:
//!
//! - [`remote::RemoteFileGateway`]: the drive
//! - [`snapshot::LocalSnapshotStore`]: local application state
//! - [`prompt::ConflictResolutionPrompt`]: user decisions
//! - [`sync::SyncConfigStore`]: persistence of settings and bookkeeping
//! - [`notify::Notifier`]: user-facing messages

/// Platform-agnostic configuration directory management.
///
/// Locates the config file, default local data file, default drive directory
/// and log file following platform conventions (XDG on Linux, Application
/// Support on macOS, AppData on Windows).
pub mod config;

/// Error taxonomy for sync operations.
pub mod error;

/// Command handlers for the `drive-sync` binary.
pub mod handlers;

/// Logging configuration and utilities.
///
/// Console logging through `env_logger` (controlled by `RUST_LOG`) plus a
/// persistent log file in the config directory with size-based rotation.
pub mod logger;

/// User notifications (progress, up to date, actionable failures).
pub mod notify;

/// Decision prompts: conflict resolution and file create/reuse confirmation.
///
/// Includes an interactive terminal prompt and a decision-table prompt for
/// unattended runs.
pub mod prompt;

/// Remote drive abstraction and a directory-backed drive.
pub mod remote;

/// Local snapshot model and the local snapshot store.
pub mod snapshot;

/// The sync engine: push, pull, provisioning, startup check and timer.
pub mod sync;

pub use error::SyncError;
