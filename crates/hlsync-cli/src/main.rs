//! hlsync CLI - Headless playback mirror runner
//!
//! Features:
//! - Scenario replay against the simulated engine and element
//! - Effective configuration dump
//! - Playback time formatting

use clap::{Parser, Subcommand};
use commands::ConfigOverrides;
use hlsync_core::MirrorConfig;
use std::path::PathBuf;
use url::Url;

mod commands;
mod output;
mod scenario;

/// hlsync CLI - Playback state mirror toolkit
#[derive(Parser)]
#[command(name = "hlsync")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Drive an HLS playback mirror from the command line", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", global = true)]
    format: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Mirror configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the stream source
    #[arg(short, long, global = true)]
    source: Option<Url>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario file and print the view after each step
    Simulate {
        /// Path to scenario JSON
        scenario: PathBuf,
    },

    /// Print the effective configuration
    Config,

    /// Format a playback position as m:ss
    Time {
        /// Position in seconds
        #[arg(allow_negative_numbers = true)]
        seconds: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(level)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(level)
            .with_writer(std::io::stderr)
            .init();
    }
    hlsync_core::init();

    let overrides = load_overrides(cli.config.as_ref(), cli.source)?;

    match cli.command {
        Commands::Simulate { scenario } => {
            commands::simulate(&scenario, &overrides, &cli.format).await?;
        }
        Commands::Config => {
            commands::show_config(&overrides)?;
        }
        Commands::Time { seconds } => {
            commands::time(seconds, &cli.format)?;
        }
    }

    Ok(())
}

/// Collect the configuration file and source override given on the command line
fn load_overrides(path: Option<&PathBuf>, source: Option<Url>) -> anyhow::Result<ConfigOverrides> {
    let file = match path {
        Some(path) => Some(MirrorConfig::from_json_file(path)?),
        None => None,
    };

    Ok(ConfigOverrides { file, source })
}
