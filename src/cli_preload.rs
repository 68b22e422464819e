//! Standalone tool that builds a movies snapshot from the external search API.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use movielib_server::catalog_search::{preload, save_snapshot, CatalogSearchClient, DEFAULT_KEYWORDS};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Output path for the snapshot JSON file.
    pub output: PathBuf,

    /// Keywords to search for. Uses a built-in seed list when omitted.
    #[clap(long)]
    pub keywords: Vec<String>,

    /// Base URL of the upstream title search API.
    #[clap(long, default_value = "https://api.imdbapi.dev")]
    pub imdb_api_url: String,

    /// Timeout in seconds for upstream search requests.
    #[clap(long, default_value_t = 30)]
    pub upstream_timeout_sec: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?;

    let client = CatalogSearchClient::new(cli_args.imdb_api_url, cli_args.upstream_timeout_sec)
        .context("Failed to build search client")?;

    let keywords: Vec<&str> = if cli_args.keywords.is_empty() {
        DEFAULT_KEYWORDS.to_vec()
    } else {
        cli_args.keywords.iter().map(|s| s.as_str()).collect()
    };

    info!("Preloading movies for {} keywords...", keywords.len());
    let movies = preload(&client, &keywords).await;

    save_snapshot(&cli_args.output, &movies)?;
    info!("Wrote {} movies to {:?}", movies.len(), cli_args.output);
    Ok(())
}
