use anyhow::Result;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tower_http::services::ServeDir;

use axum::{
    extract::{DefaultBodyLimit, State},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use super::audio::{stream_audio, upload_audio};
use super::catalog_routes::{get_movies_snapshot, search_catalog};
use super::library_routes::{add_entry, check_entry, get_library, remove_entry};
use super::{log_requests, state::*, ServerConfig};
use crate::audio_reviews::AudioReviewStore;
use crate::catalog_search::{CatalogMovie, CatalogSearchClient};
use crate::library_store::SqliteLibraryStore;

// Generous enough for a spoken review, small enough to bound memory use.
const MAX_UPLOAD_BODY_BYTES: usize = 50 * 1024 * 1024;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub library_entries: Option<usize>,
    pub catalog_movies: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        library_entries: state.library.list().ok().map(|entries| entries.len()),
        catalog_movies: state.movies_snapshot.len(),
    };
    Json(stats)
}

impl ServerState {
    fn new(
        config: ServerConfig,
        library: Arc<SqliteLibraryStore>,
        audio_reviews: Arc<AudioReviewStore>,
        search_client: Arc<CatalogSearchClient>,
        movies_snapshot: Arc<Vec<CatalogMovie>>,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            library,
            audio_reviews,
            search_client,
            movies_snapshot,
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    library: Arc<SqliteLibraryStore>,
    audio_reviews: Arc<AudioReviewStore>,
    search_client: Arc<CatalogSearchClient>,
    movies_snapshot: Arc<Vec<CatalogMovie>>,
) -> Result<Router> {
    let state = ServerState::new(
        config.clone(),
        library,
        audio_reviews,
        search_client,
        movies_snapshot,
    );

    let library_routes: Router = Router::new()
        .route("/library", post(add_entry).get(get_library))
        .route("/library/{movie_id}", delete(remove_entry))
        .route("/library/{movie_id}/check", get(check_entry))
        .route(
            "/library/{movie_id}/audio",
            get(stream_audio).put(upload_audio),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
        .with_state(state.clone());

    let catalog_routes: Router = Router::new()
        .route("/catalog/search", get(search_catalog))
        .route("/catalog/movies", get(get_movies_snapshot))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new().route("/", get(home)).with_state(state.clone()),
    };

    let app: Router = home_router
        .merge(library_routes)
        .merge(catalog_routes)
        .layer(middleware::from_fn_with_state(
            config.requests_logging_level,
            log_requests,
        ));

    Ok(app)
}

pub async fn run_server(
    config: ServerConfig,
    library: Arc<SqliteLibraryStore>,
    audio_reviews: Arc<AudioReviewStore>,
    search_client: Arc<CatalogSearchClient>,
    movies_snapshot: Arc<Vec<CatalogMovie>>,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, library, audio_reviews, search_client, movies_snapshot)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app).await?)
}
