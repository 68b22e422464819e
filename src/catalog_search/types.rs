use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Sentinel shown when the external API has no rating for a title.
pub const MISSING_RATING: &str = "N/A";

/// Response shape of the external `/search/titles` endpoint.
#[derive(Debug, Deserialize)]
pub struct TitleSearchResponse {
    #[serde(default)]
    pub titles: Vec<ExternalTitle>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExternalTitle {
    pub id: String,
    #[serde(rename = "type")]
    pub title_type: Option<String>,
    #[serde(rename = "primaryTitle")]
    pub primary_title: Option<String>,
    #[serde(rename = "primaryImage")]
    pub primary_image: Option<ExternalImage>,
    #[serde(rename = "startYear")]
    pub start_year: Option<i32>,
    pub rating: Option<ExternalRating>,
}

#[derive(Debug, Deserialize)]
pub struct ExternalImage {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExternalRating {
    #[serde(rename = "aggregateRating")]
    pub aggregate_rating: Option<f64>,
}

/// A search result reshaped into the client display schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogMovie {
    pub id: String,
    pub title: String,
    pub year: i32,
    pub image: String,
    pub rating: String,
    #[serde(rename = "type")]
    pub movie_type: String,
}

impl ExternalTitle {
    pub fn is_movie(&self) -> bool {
        self.title_type.as_deref() == Some("movie")
    }

    /// Reshape into the display schema, filling the documented defaults:
    /// missing rating becomes "N/A", missing year the current year.
    pub fn into_catalog_movie(self) -> CatalogMovie {
        CatalogMovie {
            title: self.primary_title.unwrap_or_else(|| self.id.clone()),
            year: self.start_year.unwrap_or_else(|| chrono::Utc::now().year()),
            image: self
                .primary_image
                .and_then(|i| i.url)
                .unwrap_or_default(),
            rating: self
                .rating
                .and_then(|r| r.aggregate_rating)
                .map(|r| r.to_string())
                .unwrap_or_else(|| MISSING_RATING.to_string()),
            movie_type: "movie".to_string(),
            id: self.id,
        }
    }
}
