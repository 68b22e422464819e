//! HTTP client for the external movie search API.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use tracing::warn;

use super::types::{CatalogMovie, TitleSearchResponse};

/// Results per page requested from the external API.
const PAGE_SIZE: usize = 50;

/// Thin client over the external title search API.
///
/// No retries and no caching: a transport failure or non-2xx response
/// surfaces to callers of [`CatalogSearchClient::search`] as an empty
/// result set.
#[derive(Clone)]
pub struct CatalogSearchClient {
    client: Client,
    base_url: String,
}

impl CatalogSearchClient {
    /// # Arguments
    /// * `base_url` - Base URL of the search API (e.g., "https://api.imdbapi.dev")
    /// * `timeout_secs` - Request timeout in seconds
    pub fn new(base_url: String, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One page of raw search results.
    pub async fn search_titles(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<TitleSearchResponse> {
        let mut url = format!(
            "{}/search/titles?query={}&pageSize={}",
            self.base_url,
            urlencoding::encode(query),
            PAGE_SIZE
        );
        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "Title search request failed with status: {}",
                response.status()
            ));
        }

        Ok(response.json().await?)
    }

    /// Search for movies matching a free-text query.
    ///
    /// Non-movie titles are dropped, duplicates collapse to their first
    /// appearance, and each result is reshaped into the display schema.
    /// Upstream failure yields an empty vec.
    pub async fn search(&self, query: &str) -> Vec<CatalogMovie> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        match self.search_titles(query, None).await {
            Ok(response) => dedupe_movies(response),
            Err(e) => {
                warn!("Title search for {:?} failed: {}", query, e);
                Vec::new()
            }
        }
    }
}

pub(super) fn dedupe_movies(response: TitleSearchResponse) -> Vec<CatalogMovie> {
    let mut seen: HashSet<String> = HashSet::new();
    response
        .titles
        .into_iter()
        .filter(|t| t.is_movie())
        .filter(|t| seen.insert(t.id.clone()))
        .map(|t| t.into_catalog_movie())
        .collect()
}
