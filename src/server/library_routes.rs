use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use super::state::{GuardedLibraryStore, ServerState};
use crate::library_store::{LibraryEntry, LibraryError, NewLibraryEntry};

#[derive(Serialize)]
pub(super) struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

pub(super) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: message.into(),
        }),
    )
        .into_response()
}

/// A library entry as served to clients. The audio-attachment existence flag
/// is inlined so list rendering needs no per-item probe request.
#[derive(Serialize)]
pub(super) struct EntryView {
    #[serde(flatten)]
    entry: LibraryEntry,
    #[serde(rename = "hasAudioReview")]
    has_audio_review: bool,
}

impl From<LibraryEntry> for EntryView {
    fn from(entry: LibraryEntry) -> Self {
        EntryView {
            has_audio_review: entry.audio_review_path.is_some(),
            entry,
        }
    }
}

#[derive(Serialize)]
struct EntryResponse {
    success: bool,
    data: EntryView,
}

#[derive(Serialize)]
struct LibraryResponse {
    success: bool,
    data: Vec<EntryView>,
}

#[derive(Serialize)]
struct MessageResponse {
    success: bool,
    message: String,
}

#[derive(Serialize)]
struct CheckResponse {
    success: bool,
    #[serde(rename = "isInLibrary")]
    is_in_library: bool,
}

// Duplicate, validation and not-found failures are all client errors on this
// surface; only storage trouble is the server's fault.
fn library_error_status(err: &LibraryError) -> StatusCode {
    match err {
        LibraryError::Validation(_) | LibraryError::Duplicate(_) | LibraryError::NotFound(_) => {
            StatusCode::BAD_REQUEST
        }
        LibraryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn library_error_response(err: LibraryError) -> Response {
    if let LibraryError::Storage(ref e) = err {
        error!("Library storage error: {}", e);
    }
    error_response(library_error_status(&err), err.to_string())
}

pub(super) async fn add_entry(
    State(library): State<GuardedLibraryStore>,
    Json(body): Json<NewLibraryEntry>,
) -> Response {
    match library.add(body) {
        Ok(entry) => Json(EntryResponse {
            success: true,
            data: entry.into(),
        })
        .into_response(),
        Err(err) => library_error_response(err),
    }
}

pub(super) async fn remove_entry(
    State(state): State<ServerState>,
    Path(movie_id): Path<String>,
) -> Response {
    match state.library.remove(&movie_id) {
        Ok(entry) => {
            // Best effort: a failed file delete must not block entry removal.
            if let Some(audio_path) = entry.audio_review_path {
                state.audio_reviews.remove_file(&audio_path).await;
            }
            Json(MessageResponse {
                success: true,
                message: "Movie removed from library".to_string(),
            })
            .into_response()
        }
        Err(err) => library_error_response(err),
    }
}

pub(super) async fn get_library(State(library): State<GuardedLibraryStore>) -> Response {
    match library.list() {
        Ok(entries) => Json(LibraryResponse {
            success: true,
            data: entries.into_iter().map(EntryView::from).collect(),
        })
        .into_response(),
        Err(err) => library_error_response(err),
    }
}

pub(super) async fn check_entry(
    State(library): State<GuardedLibraryStore>,
    Path(movie_id): Path<String>,
) -> Response {
    match library.exists(&movie_id) {
        Ok(is_in_library) => Json(CheckResponse {
            success: true,
            is_in_library,
        })
        .into_response(),
        Err(err) => library_error_response(err),
    }
}
