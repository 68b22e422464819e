use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::state::{GuardedCatalogSearchClient, SharedMoviesSnapshot};

#[derive(Deserialize)]
pub(super) struct SearchParams {
    #[serde(default)]
    q: String,
}

/// GET /catalog/search?q= - search the upstream title catalog.
///
/// Upstream failures degrade to an empty result list rather than an error,
/// the client treats "nothing found" and "upstream down" the same way.
pub(super) async fn search_catalog(
    State(search_client): State<GuardedCatalogSearchClient>,
    Query(params): Query<SearchParams>,
) -> Response {
    Json(search_client.search(&params.q).await).into_response()
}

/// GET /catalog/movies - the preloaded movies snapshot, possibly empty.
pub(super) async fn get_movies_snapshot(
    State(snapshot): State<SharedMoviesSnapshot>,
) -> Response {
    Json(snapshot.as_ref()).into_response()
}
