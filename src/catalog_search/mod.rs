mod client;
mod preload;
mod types;

pub use client::CatalogSearchClient;
pub use preload::{load_snapshot, preload, save_snapshot, DEFAULT_KEYWORDS, MAX_PAGES_PER_KEYWORD};
pub use types::{CatalogMovie, TitleSearchResponse};
