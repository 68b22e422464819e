//! Bulk catalog preload.
//!
//! Pages through the external search API for a fixed set of seed keywords
//! and merges everything discovered into one deduplicated snapshot, persisted
//! as a JSON array for offline/initial browsing.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::client::CatalogSearchClient;
use super::types::CatalogMovie;

/// Seed keywords used when none are given on the command line.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "zombie", "green", "thor", "mission", "x-men", "red", "batman", "ocean", "victory", "king",
    "night", "ultimate", "captain", "young", "iron", "earth", "spider", "power", "love", "war",
    "dark", "queen", "john", "fast", "action", "harry",
];

/// Page cap per keyword, to stay polite with the external API.
pub const MAX_PAGES_PER_KEYWORD: usize = 3;

/// Fetch up to [`MAX_PAGES_PER_KEYWORD`] pages for each keyword and merge
/// the discovered movies, deduplicated by external id across all keywords.
///
/// A failed page request logs a warning and ends that keyword's paging; it
/// does not abort the preload.
pub async fn preload(client: &CatalogSearchClient, keywords: &[&str]) -> Vec<CatalogMovie> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut movies: Vec<CatalogMovie> = Vec::new();

    for keyword in keywords {
        let mut page_token: Option<String> = None;
        for page in 1..=MAX_PAGES_PER_KEYWORD {
            let response = match client.search_titles(keyword, page_token.as_deref()).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Preload page {} for {:?} failed: {}", page, keyword, e);
                    break;
                }
            };

            let next = response.next_page_token.clone();
            for title in response.titles {
                if !title.is_movie() {
                    continue;
                }
                if seen.insert(title.id.clone()) {
                    movies.push(title.into_catalog_movie());
                }
            }

            page_token = next;
            if page_token.is_none() {
                break;
            }
        }
        info!("Preload: {} movies after keyword {:?}", movies.len(), keyword);
    }

    movies
}

/// Write a snapshot as a pretty-printed JSON array.
pub fn save_snapshot<P: AsRef<Path>>(path: P, movies: &[CatalogMovie]) -> Result<()> {
    let json = serde_json::to_string_pretty(movies)?;
    std::fs::write(path.as_ref(), json)
        .with_context(|| format!("Failed to write snapshot to {:?}", path.as_ref()))?;
    Ok(())
}

/// Read a snapshot written by [`save_snapshot`].
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Vec<CatalogMovie>> {
    let json = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read snapshot from {:?}", path.as_ref()))?;
    Ok(serde_json::from_str(&json)?)
}
