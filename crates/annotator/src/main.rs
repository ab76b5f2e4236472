//! Annotator - HTTP service that describes batches of images.
//!
//! Accepts a multipart upload of several images with optional per-image
//! prompts and answers with one generated description (or error) per image,
//! produced by a multimodal generation API.
//!
//! # Usage
//!
//! ```bash
//! # Start the server
//! GEMINI_API_KEY=... annotator serve
//!
//! # Listen elsewhere
//! annotator serve --bind 0.0.0.0:8080
//!
//! # View configuration
//! annotator config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;
mod server;

/// Annotator - describe batches of images with a multimodal generation API.
#[derive(Parser, Debug)]
#[command(name = "annotator")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "ANNOTATOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve(cli::serve::ServeArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let loaded = match &cli.config {
        Some(path) => annotator_core::Config::load_from(path),
        None => annotator_core::Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `annotator config path`."
            );
            annotator_core::Config::default()
        }
    };
    logging::init_from_config(&config.logging, cli.verbose, cli.json_logs);

    tracing::debug!("Annotator v{}", annotator_core::VERSION);

    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config, cli.config).await,
    }
}
