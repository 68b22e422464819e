use serde::{Deserialize, Serialize};

/// Classification tag applied when the client does not send one.
pub const DEFAULT_ENTRY_TYPE: &str = "movie";

/// A saved movie in the user's library.
///
/// `movie_id` is the external catalog identifier and the business key;
/// `id` is the store-assigned surrogate. All fields except
/// `audio_review_path` are write-once at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    pub id: i64,
    pub movie_id: String,
    pub title: String,
    pub audio_review_path: Option<String>,
    pub year: Option<i32>,
    pub image: Option<String>,
    pub rating: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: String,
    /// Unix timestamp (seconds) set by the store on insert.
    pub created_at: i64,
    /// Unix timestamp (seconds) bumped when the audio review path changes.
    pub updated_at: i64,
}

/// Client-supplied data for adding an entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLibraryEntry {
    pub movie_id: String,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default, rename = "type")]
    pub entry_type: Option<String>,
}
