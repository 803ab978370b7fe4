use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use drive_sync::handlers::{self, EngineOptions};
use drive_sync::logger;
use drive_sync::sync::SettingsUpdate;

#[derive(Parser)]
#[command(name = "drive-sync")]
#[command(about = "Keep local application data in sync with a file on a cloud drive", long_about = None)]
#[command(version)]
struct Cli {
    /// Sync config file (default: config.toml in the config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Local application data file (default: snapshot.json in the config directory)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Directory used as the drive (default: drive/ in the config directory)
    #[arg(long, global = true)]
    drive: Option<PathBuf>,

    /// Accept every prompt (create/reuse the file, keep the side being synced)
    #[arg(short, long, global = true)]
    yes: bool,

    /// Debug logging when RUST_LOG is not set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save local data to the drive
    Push {
        /// Skip the remote-changed check and overwrite the drive
        #[arg(short, long)]
        force: bool,
    },

    /// Load data from the drive, replacing local data
    Pull {
        /// Import even if already up to date, without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Show sync settings and bookkeeping
    Status,

    /// Configure sync settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Sync file name on the drive (looked up or created right away)
        #[arg(long)]
        file_name: Option<String>,

        /// Auto sync interval in milliseconds (minimum 5000)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Enable sync
        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        /// Disable sync
        #[arg(long)]
        disable: bool,

        /// Push periodically while watching
        #[arg(long)]
        auto_sync: Option<bool>,

        /// Show progress notifications for every sync
        #[arg(long)]
        notify: Option<bool>,

        /// Check the drive for newer data when watching starts
        #[arg(long)]
        load_on_startup: Option<bool>,

        /// Log in to the drive automatically on startup
        #[arg(long)]
        auto_login: Option<bool>,
    },

    /// Check for remote updates, then push periodically until Ctrl-C
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logger::init_logger(cli.verbose)?;

    let options = EngineOptions {
        config_path: cli.config,
        data_path: cli.data,
        drive_dir: cli.drive,
        assume_yes: cli.yes,
    };
    let engine = handlers::build_engine(&options)?;

    match cli.command {
        Commands::Push { force } => {
            handlers::handle_push(&engine, force).await?;
        }
        Commands::Pull { force } => {
            handlers::handle_pull(&engine, force).await?;
        }
        Commands::Status => {
            handlers::handle_status(&engine).await?;
        }
        Commands::Config {
            show,
            file_name,
            interval_ms,
            enable,
            disable,
            auto_sync,
            notify,
            load_on_startup,
            auto_login,
        } => {
            let is_enabled = match (enable, disable) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let update = SettingsUpdate {
                is_enabled,
                is_auto_login: auto_login,
                is_auto_sync_to_remote: auto_sync,
                is_notify_on_sync: notify,
                is_load_remote_data_on_startup: load_on_startup,
                sync_interval_ms: interval_ms,
                sync_file_name: file_name,
            };
            handlers::handle_config(engine.clone(), update, show).await?;
        }
        Commands::Watch => {
            handlers::handle_watch(engine.clone()).await?;
        }
    }

    Ok(())
}
