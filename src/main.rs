use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use movielib_server::audio_reviews::AudioReviewStore;
use movielib_server::catalog_search::{load_snapshot, CatalogSearchClient};
use movielib_server::library_store::SqliteLibraryStore;
use movielib_server::server::{run_server, RequestsLoggingLevel, ServerConfig};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite library database file.
    #[clap(value_parser = parse_path)]
    pub library_db: PathBuf,

    /// Directory for uploaded files (audio reviews). Defaults to an "uploads"
    /// directory next to the database file.
    #[clap(long, value_parser = parse_path)]
    pub uploads_path: Option<PathBuf>,

    /// Path to a preloaded movies snapshot JSON file.
    #[clap(long, value_parser = parse_path)]
    pub movies_snapshot: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

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

    // Default uploads path to an "uploads" directory next to the database file
    let uploads_path = match cli_args.uploads_path {
        Some(path) => path,
        None => cli_args
            .library_db
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("uploads"),
    };

    info!(
        "Opening SQLite library database at {:?}...",
        cli_args.library_db
    );
    let library = Arc::new(SqliteLibraryStore::new(&cli_args.library_db)?);

    info!("Storing uploads under {:?}", uploads_path);
    let audio_reviews = Arc::new(AudioReviewStore::new(uploads_path));

    let search_client = Arc::new(CatalogSearchClient::new(
        cli_args.imdb_api_url,
        cli_args.upstream_timeout_sec,
    )?);

    let movies_snapshot = match cli_args.movies_snapshot {
        Some(path) => match load_snapshot(&path) {
            Ok(movies) => {
                info!("Loaded {} movies from snapshot {:?}", movies.len(), path);
                movies
            }
            Err(err) => {
                warn!("Failed to load movies snapshot {:?}: {}", path, err);
                vec![]
            }
        },
        None => vec![],
    };

    let config = ServerConfig {
        requests_logging_level: cli_args.logging_level,
        port: cli_args.port,
        frontend_dir_path: cli_args.frontend_dir_path,
    };

    info!("Ready to serve at port {}!", config.port);
    run_server(
        config,
        library,
        audio_reviews,
        search_client,
        Arc::new(movies_snapshot),
    )
    .await
}
