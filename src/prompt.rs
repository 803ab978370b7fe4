use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use inquire::error::InquireError;
use inquire::{Confirm, Select};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::SyncError;

/// The situation a decision is requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    /// Remote changed since our last push
    PushConflict,
    /// Local data may be newer than the remote data about to be imported
    PullConflict,
    /// No remote file with the sync file name exists
    CreateFile,
    /// Exactly one remote file with the sync file name exists
    ReuseFile,
}

impl PromptKind {
    /// The decisions a prompt of this kind may return.
    pub fn options(self) -> &'static [Decision] {
        match self {
            PromptKind::PushConflict => &[
                Decision::PushAnyway,
                Decision::PullInstead,
                Decision::Cancel,
            ],
            PromptKind::PullConflict => &[
                Decision::LoadFromRemote,
                Decision::SaveToRemoteInstead,
                Decision::Cancel,
            ],
            PromptKind::CreateFile | PromptKind::ReuseFile => {
                &[Decision::Confirm, Decision::Cancel]
            }
        }
    }

    /// Whether `decision` is one of this kind's options.
    pub fn allows(self, decision: Decision) -> bool {
        self.options().contains(&decision)
    }
}

/// Answer returned by a [`ConflictResolutionPrompt`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// Overwrite the remote data with local data
    PushAnyway,
    /// Overwrite local data with the remote data instead of pushing
    PullInstead,
    /// Overwrite local data with the remote data
    LoadFromRemote,
    /// Overwrite the remote data with local data instead of pulling
    SaveToRemoteInstead,
    /// Yes to a create/reuse confirmation
    Confirm,
    /// Abort without changes
    Cancel,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::PushAnyway => write!(f, "Overwrite remote data (push anyway)"),
            Decision::PullInstead => write!(f, "Overwrite local data (load from remote instead)"),
            Decision::LoadFromRemote => write!(f, "Overwrite local data (load from remote)"),
            Decision::SaveToRemoteInstead => {
                write!(f, "Overwrite remote data (save local data instead)")
            }
            Decision::Confirm => write!(f, "Yes"),
            Decision::Cancel => write!(f, "Abort"),
        }
    }
}

/// What the user needs to see to decide.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    pub file_name: String,
    pub remote_modified: Option<DateTime<Utc>>,
    pub local_last_active: Option<DateTime<Utc>>,
    pub last_sync: Option<DateTime<Utc>>,
}

impl PromptContext {
    pub fn for_file(file_name: impl Into<String>) -> Self {
        PromptContext {
            file_name: file_name.into(),
            ..Default::default()
        }
    }
}

/// Asks the user (or a policy) how to proceed at a decision point.
#[async_trait]
pub trait ConflictResolutionPrompt: Send + Sync {
    async fn ask(&self, kind: PromptKind, context: &PromptContext) -> Result<Decision, SyncError>;
}

/// Check if we're running in an interactive terminal
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
}

/// Terminal prompt built on inquire.
///
/// Runs the blocking dialog on tokio's blocking pool so the runtime keeps
/// driving the timer while the user reads.
#[derive(Debug, Default)]
pub struct InteractivePrompt;

#[async_trait]
impl ConflictResolutionPrompt for InteractivePrompt {
    async fn ask(&self, kind: PromptKind, context: &PromptContext) -> Result<Decision, SyncError> {
        if !is_interactive() {
            return Err(SyncError::Prompt(
                "no interactive terminal available; re-run with --yes to accept defaults"
                    .to_string(),
            ));
        }

        let context = context.clone();
        tokio::task::spawn_blocking(move || ask_in_terminal(kind, &context))
            .await
            .map_err(|e| SyncError::Prompt(e.to_string()))?
    }
}

fn ask_in_terminal(kind: PromptKind, context: &PromptContext) -> Result<Decision, SyncError> {
    match kind {
        PromptKind::CreateFile => confirm(&format!(
            "No file with the name \"{}\" was found. Create it as sync file on the drive?",
            context.file_name
        )),
        PromptKind::ReuseFile => confirm(&format!(
            "Use existing file \"{}\" as sync file?",
            context.file_name
        )),
        PromptKind::PushConflict => {
            println!("\n{}", "Overwrite unsaved data on the drive?".yellow().bold());
            println!(
                "  {}",
                "There are changes on the drive that you don't have locally.".dimmed()
            );
            display_timestamps(context);
            select("How would you like to continue?", kind)
        }
        PromptKind::PullConflict => {
            println!("\n{}", "Overwrite local data with the drive update?".yellow().bold());
            println!(
                "  {}",
                "Local data seems to be newer than the remote data. Unsaved local changes will be lost."
                    .dimmed()
            );
            display_timestamps(context);
            select("How would you like to continue?", kind)
        }
    }
}

fn confirm(message: &str) -> Result<Decision, SyncError> {
    let yes = Confirm::new(message)
        .with_default(true)
        .prompt()
        .map_err(map_inquire_error)?;
    Ok(if yes { Decision::Confirm } else { Decision::Cancel })
}

fn select(message: &str, kind: PromptKind) -> Result<Decision, SyncError> {
    Select::new(message, kind.options().to_vec())
        .with_help_message("Use arrow keys to navigate, Enter to select")
        .prompt()
        .map_err(map_inquire_error)
}

fn map_inquire_error(err: InquireError) -> SyncError {
    match err {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            SyncError::UserCancelled
        }
        other => SyncError::Prompt(other.to_string()),
    }
}

fn display_timestamps(context: &PromptContext) {
    let rows = [
        ("Last modification of remote data:", context.remote_modified),
        ("Last modification of local data:", context.local_last_active),
        ("Last sync from this app instance:", context.last_sync),
    ];
    for (label, value) in rows {
        if let Some(ts) = value {
            println!("  {:<36} {}", label, format_timestamp(ts).cyan());
        }
    }
}

/// Human readable local time for prompts and status output.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    if ts == DateTime::<Utc>::UNIX_EPOCH {
        return "never".to_string();
    }
    ts.with_timezone(&Local)
        .format("%d-%m-%Y %H:%M:%S")
        .to_string()
}

/// Answers prompts from a fixed decision table.
///
/// Used for `--yes` runs and in tests. Every question is recorded so callers
/// can assert which decision points were reached.
#[derive(Debug)]
pub struct AutoPrompt {
    table: HashMap<PromptKind, Decision>,
    fallback: Decision,
    asked: Mutex<Vec<PromptKind>>,
}

impl AutoPrompt {
    /// Answer every prompt with `fallback` unless overridden with [`AutoPrompt::with`].
    pub fn new(fallback: Decision) -> Self {
        AutoPrompt {
            table: HashMap::new(),
            fallback,
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Confirm file creation/reuse and resolve conflicts in the direction
    /// the user asked for (push wins on push, remote wins on pull).
    pub fn accept_all() -> Self {
        Self::new(Decision::Cancel)
            .with(PromptKind::CreateFile, Decision::Confirm)
            .with(PromptKind::ReuseFile, Decision::Confirm)
            .with(PromptKind::PushConflict, Decision::PushAnyway)
            .with(PromptKind::PullConflict, Decision::LoadFromRemote)
    }

    pub fn with(mut self, kind: PromptKind, decision: Decision) -> Self {
        self.table.insert(kind, decision);
        self
    }

    /// Kinds asked so far, in order.
    pub fn asked(&self) -> Vec<PromptKind> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ConflictResolutionPrompt for AutoPrompt {
    async fn ask(&self, kind: PromptKind, _context: &PromptContext) -> Result<Decision, SyncError> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(kind);
        }
        let decision = self.table.get(&kind).copied().unwrap_or(self.fallback);
        log::debug!("Auto-answering {:?} with {:?}", kind, decision);
        Ok(decision)
    }
}
