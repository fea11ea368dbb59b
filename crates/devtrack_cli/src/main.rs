//! Devtrack CLI - Command-line interface for project activity tracking.

use anyhow::Result;
use clap::{Parser, Subcommand};
use devtrack_core::Timeframe;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "devtrack")]
#[command(about = "Snapshot-based development activity tracking", long_about = None)]
#[command(version)]
struct Cli {
    /// Data directory holding the database, config and snapshot mirrors
    #[arg(long, global = true, default_value = ".devtrack")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage tracked projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Run or control capture scheduling
    Track {
        #[command(subcommand)]
        command: TrackCommands,
    },
    /// Inspect captured metrics
    Metrics {
        #[command(subcommand)]
        command: MetricsCommands,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Register a new project
    Create {
        /// Unique project name
        name: String,
        /// Source folder to track
        folder: PathBuf,
    },
    /// List all projects
    List,
    /// Rename a project, keeping its history
    Rename {
        /// Current name
        old_name: String,
        /// New name
        new_name: String,
    },
    /// Point a project at a different folder
    SetFolder {
        /// Project name
        name: String,
        /// New source folder
        folder: PathBuf,
    },
    /// Delete a project and all of its records
    Delete {
        /// Project name
        name: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum TrackCommands {
    /// Run the capture scheduler in the foreground
    Start {
        /// Project name
        name: String,
    },
    /// Disable tracking; a running scheduler stops on its next poll
    Stop {
        /// Project name
        name: String,
    },
    /// Capture a single snapshot right now
    Once {
        /// Project name
        name: String,
    },
}

#[derive(Subcommand)]
enum MetricsCommands {
    /// Show aggregated metrics over a timeframe
    Summary {
        /// Project name
        name: String,
        /// Timeframe (today, week, month, all); all four if omitted
        #[arg(long)]
        timeframe: Option<Timeframe>,
    },
    /// Show captured records with per-file detail
    Show {
        /// Project name
        name: String,
        /// Maximum number of records, newest first
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Delete every captured record of a project
    Clear {
        /// Project name
        name: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    // Initialize tracing subscriber
    // Respects RUST_LOG environment variable (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir;

    match cli.command {
        Commands::Project { command } => match command {
            ProjectCommands::Create { name, folder } => {
                commands::project::create(&data_dir, &name, &folder)
            }
            ProjectCommands::List => commands::project::list(&data_dir),
            ProjectCommands::Rename { old_name, new_name } => {
                commands::project::rename(&data_dir, &old_name, &new_name)
            }
            ProjectCommands::SetFolder { name, folder } => {
                commands::project::set_folder(&data_dir, &name, &folder)
            }
            ProjectCommands::Delete { name, yes } => {
                commands::project::delete(&data_dir, &name, yes)
            }
        },
        Commands::Track { command } => match command {
            TrackCommands::Start { name } => commands::track::start(&data_dir, &name),
            TrackCommands::Stop { name } => commands::track::stop(&data_dir, &name),
            TrackCommands::Once { name } => commands::track::once(&data_dir, &name),
        },
        Commands::Metrics { command } => match command {
            MetricsCommands::Summary { name, timeframe } => {
                commands::metrics::summary(&data_dir, &name, timeframe)
            }
            MetricsCommands::Show { name, limit } => {
                commands::metrics::show(&data_dir, &name, limit)
            }
            MetricsCommands::Clear { name, yes } => {
                commands::metrics::clear(&data_dir, &name, yes)
            }
        },
    }
}
