//! Deckhand CLI, the main entry point.
//!
//! Commands:
//! - `serve`: Start the HTTP API server
//! - `generate`: Build and share one deck from a prompt
//! - `doctor`: Report which credentials are configured
//! - `config`: Print the default configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "deckhand",
    about = "Deckhand: an LLM agent that builds and shares slide decks",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    /// Config file (defaults to ~/.deckhand/config.toml)
    #[arg(short, long, global = true, env = "DECKHAND_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
    },

    /// Generate a presentation and print the result as JSON
    Generate {
        /// What the deck should be about
        #[arg(short, long)]
        prompt: String,

        /// Keep the deck in memory instead of calling the Google APIs
        #[arg(long)]
        dry_run: bool,
    },

    /// Diagnose configuration health
    Doctor,

    /// Print the default configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so `generate` output stays machine-readable.
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config_path = cli.config;
    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(config_path, port, host).await?,
        Commands::Generate { prompt, dry_run } => {
            commands::generate::run(config_path, &prompt, dry_run).await?
        }
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Config => commands::config_cmd::show_default()?,
    }

    Ok(())
}
