//! Sahayak CLI - Command-line interface for the Sahayak offline layer
//!
//! Provides commands for:
//! - Listing and creating user content
//! - Saving and liking community content
//! - Viewing recent activity, likes and the sync queue
//! - Raw reads of the persistent store
//! - Viewing and editing configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    activity::{ActivityCommand, LikesCommand},
    config::ConfigCommand,
    content::ContentCommand,
    get::GetCommand,
    like::LikeCommand,
    queue::QueueCommand,
    saved::SavedCommand,
    status::StatusCommand,
    CommandContext,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "sahayak",
    version,
    about = "Offline content, history and sync queue for Sahayak"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show storage, profile statistics and queue status
    Status(StatusCommand),
    /// List or create user content
    #[command(subcommand)]
    Content(ContentCommand),
    /// List or add saved community content
    #[command(subcommand)]
    Saved(SavedCommand),
    /// Like a community record
    Like(LikeCommand),
    /// Show recently liked content
    Likes(LikesCommand),
    /// Show recent activity
    Activity(ActivityCommand),
    /// Inspect the sync queue
    #[command(subcommand)]
    Queue(QueueCommand),
    /// Read a raw value from the store
    Get(GetCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(cli.verbose, cli.quiet)));

    // Logs go to stderr so `--json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let ctx = CommandContext::new(format, cli.config).quiet(cli.quiet);

    match cli.command {
        Commands::Status(cmd) => cmd.execute(&ctx).await,
        Commands::Content(cmd) => cmd.execute(&ctx).await,
        Commands::Saved(cmd) => cmd.execute(&ctx).await,
        Commands::Like(cmd) => cmd.execute(&ctx).await,
        Commands::Likes(cmd) => cmd.execute(&ctx).await,
        Commands::Activity(cmd) => cmd.execute(&ctx).await,
        Commands::Queue(cmd) => cmd.execute(&ctx).await,
        Commands::Get(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
    }
}
