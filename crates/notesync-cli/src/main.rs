//! notesync CLI - Command-line interface for offline-first notes
//!
//! Provides commands for:
//! - Listing, reading and editing notes against the local cache
//! - Synchronizing the cache with the notes server
//! - Watching the cache for changes
//! - Viewing and validating configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use notesync_core::config::{Config, LoggingConfig};

mod commands;
mod context;
mod output;

use commands::{config::ConfigCommand, note::NoteCommand, sync::SyncCommand, watch::WatchCommand};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "notesync", version, about = "Offline-first notes with server sync")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Read and edit notes
    #[command(subcommand)]
    Note(NoteCommand),
    /// Synchronize the local cache with the server
    Sync(SyncCommand),
    /// Print the note list every time it changes
    Watch(WatchCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);

    init_tracing(cli.verbose, &config.logging);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Note(cmd) => cmd.execute(config, format).await,
        Commands::Sync(cmd) => cmd.execute(config, format).await,
        Commands::Watch(cmd) => cmd.execute(config, format).await,
        Commands::Config(cmd) => cmd.execute(&config_path, format).await,
    }
}

/// Installs the global subscriber
///
/// `RUST_LOG` wins; otherwise `-v` raises the configured level.
fn init_tracing(verbose: u8, logging: &LoggingConfig) {
    let level = match verbose {
        0 => logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
