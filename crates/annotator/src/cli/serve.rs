//! The `annotator serve` command.

use crate::server::{self, AppState};
use annotator_core::{BatchAnnotator, Config, GeminiClient, RequestDefaults};
use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides server.bind)
    #[arg(long, env = "ANNOTATOR_BIND")]
    pub bind: Option<SocketAddr>,

    /// Directory for staging files (overrides staging.dir)
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, config: Config) -> anyhow::Result<()> {
    let addr = match args.bind {
        Some(addr) => addr,
        None => config.server.bind.parse()?,
    };
    let staging_dir = args.staging_dir.unwrap_or_else(|| config.staging_dir());
    std::fs::create_dir_all(&staging_dir)?;

    let defaults = RequestDefaults::from_config(&config.annotation, &config.credentials.sources);
    if defaults.configured_keys.is_empty() {
        tracing::warn!(
            "No operator API keys configured; requests must supply apiKeys. \
             Set GEMINI_API_KEY or GEMINI_API_KEYS."
        );
    } else {
        tracing::info!("Loaded {} operator API keys", defaults.configured_keys.len());
    }

    let client = GeminiClient::from_config(&config);
    let state = AppState {
        annotator: BatchAnnotator::new(Arc::new(client), staging_dir.clone()),
        defaults: Arc::new(defaults),
    };

    tracing::info!(
        "Staging uploads in {} (model {})",
        staging_dir.display(),
        config.annotation.default_model
    );
    server::serve(addr, state, config.limits.max_upload_bytes()).await
}
