//! Binary entry point for vibefeed.
//!
//! This binary provides the CLI interface for the vibefeed recommender.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use vibefeed::cli::{self, App};
use vibefeed::config::VibefeedConfig;
use vibefeed::io::ImportOptions;
use vibefeed::observability;

/// Vibefeed - preference-vector recommendations for short audio tracks.
#[derive(Parser)]
#[command(name = "vibefeed")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "VIBEFEED_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Database path, overriding the configuration.
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Create the database and seed the default vibes.
    Init,

    /// Import tracks from a CSV file.
    Import {
        /// CSV file to read.
        path: PathBuf,

        /// Stop after this many tracks.
        #[arg(long)]
        limit: Option<usize>,

        /// Validate rows without storing them.
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage users.
    User {
        /// User subcommand.
        #[command(subcommand)]
        action: UserAction,
    },

    /// List vibes.
    Vibes,

    /// Compose a feed.
    Feed {
        /// User id.
        #[arg(short, long)]
        user: String,

        /// Feed mode: explore or vibe.
        #[arg(short, long, default_value = "explore")]
        mode: String,

        /// Vibe id or name (vibe mode only).
        #[arg(long)]
        vibe: Option<String>,

        /// Number of tracks (defaults to the configured feed size).
        #[arg(short, long)]
        limit: Option<usize>,

        /// Seed for reproducible output.
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Record feedback: like, dislike, more_like_this or undo.
    Feedback {
        /// User id.
        #[arg(short, long)]
        user: String,

        /// Track id (ignored by undo).
        #[arg(short, long)]
        track: Option<String>,

        /// Action to apply.
        #[arg(short, long)]
        action: String,
    },

    /// Show a user's feedback history.
    History {
        /// User id.
        #[arg(short, long)]
        user: String,

        /// Maximum number of events.
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Manage configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },
}

/// User subcommands.
#[derive(Subcommand)]
enum UserAction {
    /// Create a guest user.
    Create {
        /// Explicit user id (a UUID is generated otherwise).
        #[arg(long)]
        id: Option<String>,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref(), cli.database.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_settings(Some(&config.logging), cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(command: Commands, config: VibefeedConfig) -> Result<()> {
    if let Commands::Config { show } = command {
        return cmd_config(&config, show);
    }

    let app = App::open(config).context("Failed to open the database")?;

    match command {
        Commands::Init => println!("{}", cli::init(&app)?),

        Commands::Import {
            path,
            limit,
            dry_run,
        } => {
            let options = ImportOptions { limit, dry_run };
            let report = cli::import(&app, &path, &options)
                .with_context(|| format!("Failed to import {}", path.display()))?;
            println!("{report}");
        },

        Commands::User {
            action: UserAction::Create { id },
        } => println!("{}", cli::create_user(&app, id.as_deref())?),

        Commands::Vibes => println!("{}", cli::vibes(&app)?),

        Commands::Feed {
            user,
            mode,
            vibe,
            limit,
            seed,
        } => {
            let report = cli::feed(&app, &user, &mode, vibe.as_deref(), limit, seed)?;
            println!("{report}");
        },

        Commands::Feedback {
            user,
            track,
            action,
        } => cmd_feedback(&app, &user, track.as_deref(), &action)?,

        Commands::History { user, limit } => println!("{}", cli::history(&app, &user, limit)?),

        Commands::Config { .. } => {},
    }

    Ok(())
}

/// Loads configuration, applying the `--database` override.
fn load_config(path: Option<&Path>, database: Option<PathBuf>) -> Result<VibefeedConfig> {
    let mut config = match path {
        Some(path) => VibefeedConfig::load_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => VibefeedConfig::load_default(),
    };
    if database.is_some() {
        config.database_path = database;
    }
    config.recommender.validate()?;
    Ok(config)
}

/// Feedback command. An empty undo stack is reported, not treated as failure.
fn cmd_feedback(app: &App, user: &str, track: Option<&str>, action: &str) -> Result<()> {
    match cli::feedback(app, user, track, action) {
        Ok(report) => println!("{report}"),
        Err(e) if e.is_expected() => println!("{e}"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Config command.
fn cmd_config(config: &VibefeedConfig, show: bool) -> Result<()> {
    if show {
        println!("{}", cli::show_config(config));
    } else {
        println!("Use --show to display the resolved configuration.");
    }
    Ok(())
}
