use axum::extract::FromRef;

use crate::audio_reviews::AudioReviewStore;
use crate::catalog_search::{CatalogMovie, CatalogSearchClient};
use crate::library_store::SqliteLibraryStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedLibraryStore = Arc<SqliteLibraryStore>;
pub type GuardedAudioReviewStore = Arc<AudioReviewStore>;
pub type GuardedCatalogSearchClient = Arc<CatalogSearchClient>;
pub type SharedMoviesSnapshot = Arc<Vec<CatalogMovie>>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub library: GuardedLibraryStore,
    pub audio_reviews: GuardedAudioReviewStore,
    pub search_client: GuardedCatalogSearchClient,
    pub movies_snapshot: SharedMoviesSnapshot,
}

impl FromRef<ServerState> for GuardedLibraryStore {
    fn from_ref(input: &ServerState) -> Self {
        input.library.clone()
    }
}

impl FromRef<ServerState> for GuardedAudioReviewStore {
    fn from_ref(input: &ServerState) -> Self {
        input.audio_reviews.clone()
    }
}

impl FromRef<ServerState> for GuardedCatalogSearchClient {
    fn from_ref(input: &ServerState) -> Self {
        input.search_client.clone()
    }
}

impl FromRef<ServerState> for SharedMoviesSnapshot {
    fn from_ref(input: &ServerState) -> Self {
        input.movies_snapshot.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
