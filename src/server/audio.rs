//! Audio review upload and streaming

use super::library_routes::error_response;
use super::state::ServerState;
use axum::{
    body::Body,
    extract::{FromRequestParts, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, BufReader, SeekFrom},
};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, warn};

const HEADER_BYTE_RANGE: &str = "Range";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start_inclusive: Option<u64>,
    end_inclusive: Option<u64>,
}

impl ByteRange {
    pub fn new(start_inclusive: Option<u64>, end_inclusive: Option<u64>) -> ByteRange {
        ByteRange {
            start_inclusive,
            end_inclusive,
        }
    }

    fn parse<S: AsRef<str>>(s: S) -> Option<ByteRange> {
        let v = s.as_ref();
        if !v.starts_with("bytes=") {
            return None;
        }

        let v = &v[6..];
        let parts: Vec<&str> = v.split('-').collect();
        if parts.len() != 2 {
            return None;
        }

        Some(ByteRange {
            start_inclusive: parts[0].parse::<u64>().ok(),
            end_inclusive: parts[1].parse::<u64>().ok(),
        })
    }
}

pub struct ByteRangeExtractionError {}

impl IntoResponse for ByteRangeExtractionError {
    fn into_response(self) -> Response {
        StatusCode::BAD_REQUEST.into_response()
    }
}

impl FromRequestParts<ServerState> for Option<ByteRange> {
    type Rejection = ByteRangeExtractionError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        Ok(parts
            .headers
            .get(HEADER_BYTE_RANGE)
            .map(|x| x.to_str())
            .map(|x| x.ok())
            .and_then(|x| x.and_then(ByteRange::parse)))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ResolvedRange {
    Full,
    Partial { start: u64, length: u64 },
    Unsatisfiable,
}

/// Check a client-supplied range against the actual file length.
///
/// An open end is clamped to the last byte; a start at or past EOF, or an
/// end before the start, is unsatisfiable. All arithmetic happens on
/// validated bounds so a hostile header cannot underflow.
fn resolve_range(byte_range: Option<ByteRange>, file_length: u64) -> ResolvedRange {
    let range = match byte_range {
        None
        | Some(ByteRange {
            start_inclusive: None,
            end_inclusive: None,
        }) => return ResolvedRange::Full,
        Some(range) => range,
    };

    let start = range.start_inclusive.unwrap_or(0);
    if start >= file_length {
        return ResolvedRange::Unsatisfiable;
    }
    let end = range
        .end_inclusive
        .map(|e| e.min(file_length - 1))
        .unwrap_or(file_length - 1);
    if end < start {
        return ResolvedRange::Unsatisfiable;
    }

    ResolvedRange::Partial {
        start,
        length: end - start + 1,
    }
}

/// Content type of the served file: sniffed from the opening bytes, with
/// the stored extension as fallback for formats the sniffer does not know.
fn content_type_for(header: &[u8], relative_path: &str) -> &'static str {
    if let Some(kind) = infer::get(header) {
        if kind.mime_type().starts_with("audio/") {
            return kind.mime_type();
        }
    }
    extension_content_type(relative_path)
}

fn extension_content_type(relative_path: &str) -> &'static str {
    let extension = relative_path
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    match extension.as_str() {
        "mp3" => "audio/mpeg",
        "ogg" | "oga" => "audio/ogg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "webm" => "audio/webm",
        _ => "application/octet-stream",
    }
}

pub(super) async fn stream_audio(
    byte_range: Option<ByteRange>,
    State(state): State<ServerState>,
    Path(movie_id): Path<String>,
) -> Response {
    let entry = match state.library.get(&movie_id) {
        Ok(Some(entry)) => entry,
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, "Movie is not in the library");
        }
        Err(err) => {
            error!("Library storage error: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let relative_path = match entry.audio_review_path {
        Some(path) => path,
        None => {
            return error_response(StatusCode::NOT_FOUND, "No audio review for this movie");
        }
    };

    let path = state.audio_reviews.resolve(&relative_path);
    debug!("Streaming audio review from path {}", path.display());

    let mut file = match File::open(&path).await {
        Ok(x) => x,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(
                "Audio review file missing for movie {}: {}",
                movie_id,
                path.display()
            );
            return error_response(StatusCode::NOT_FOUND, "Audio review file not found");
        }
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let file_length = match file.metadata().await {
        Ok(x) => x.len(),
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let (status_code, start_served, chunk_size) = match resolve_range(byte_range, file_length) {
        ResolvedRange::Full => (StatusCode::OK, 0, file_length),
        ResolvedRange::Partial { start, length } => (StatusCode::PARTIAL_CONTENT, start, length),
        ResolvedRange::Unsatisfiable => {
            let response = Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header("Content-Range", format!("bytes */{}", file_length))
                .body(Body::empty());
            return match response {
                Ok(response) => response,
                Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            };
        }
    };

    let mut sniff_buffer = [0u8; 512];
    let sniffed = file.read(&mut sniff_buffer).await.unwrap_or(0);
    let content_type = content_type_for(&sniff_buffer[..sniffed], &relative_path);

    if file.seek(SeekFrom::Start(start_served)).await.is_err() {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let file_reader = BufReader::with_capacity(4096 * 16, file);
    let stream = ReaderStream::with_capacity(file_reader, 4096 * 16);

    let body = Body::from_stream(stream);

    let mut builder = Response::builder()
        .status(status_code)
        .header("Content-Type", content_type)
        .header("Accept-Ranges", "bytes")
        .header("Content-length", chunk_size);
    if status_code == StatusCode::PARTIAL_CONTENT {
        builder = builder.header(
            "Content-Range",
            format!(
                "bytes {}-{}/{}",
                start_served,
                start_served + chunk_size - 1,
                file_length
            ),
        );
    }

    match builder.body(body) {
        Ok(response) => response,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    #[serde(rename = "audioPath")]
    audio_path: String,
}

/// PUT /library/{movie_id}/audio - attach an audio review (multipart/form-data)
///
/// The entry's recorded path is updated before any file is touched, so a
/// failed database write leaves the previous attachment intact on disk.
pub(super) async fn upload_audio(
    State(state): State<ServerState>,
    Path(movie_id): Path<String>,
    mut multipart: Multipart,
) -> Response {
    let mut filename: Option<String> = None;
    let mut data: Option<Vec<u8>> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == "file" {
            filename = field.file_name().map(|s| s.to_string());
            match field.bytes().await {
                Ok(bytes) => data = Some(bytes.to_vec()),
                Err(e) => {
                    warn!("Failed to read audio file data: {}", e);
                    return error_response(StatusCode::BAD_REQUEST, "Failed to read file");
                }
            }
        }
    }

    let filename = match filename {
        Some(f) if !f.is_empty() => f,
        _ => return error_response(StatusCode::BAD_REQUEST, "No file provided"),
    };

    let data = match data {
        Some(d) if !d.is_empty() => d,
        _ => return error_response(StatusCode::BAD_REQUEST, "No file provided"),
    };

    let entry = match state.library.get(&movie_id) {
        Ok(Some(entry)) => entry,
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, "Movie is not in the library");
        }
        Err(err) => {
            error!("Library storage error: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let audio_path = match state.audio_reviews.relative_path_for(&movie_id, &filename) {
        Ok(path) => path,
        Err(err) => {
            warn!("Rejecting audio upload: {}", err);
            return error_response(StatusCode::BAD_REQUEST, "Invalid movie id");
        }
    };

    if let Err(err) = state.library.set_audio_review_path(&movie_id, &audio_path) {
        error!("Failed to record audio review path: {}", err);
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to store audio review",
        );
    }

    if let Err(err) = state
        .audio_reviews
        .store(&audio_path, &data, entry.audio_review_path.as_deref())
        .await
    {
        error!("Failed to store audio review for {}: {}", movie_id, err);
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to store audio review",
        );
    }

    Json(UploadResponse {
        success: true,
        audio_path,
    })
    .into_response()
}
