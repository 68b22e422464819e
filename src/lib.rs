//! Movie Library Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod audio_reviews;
pub mod catalog_search;
pub mod library_store;
pub mod server;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use audio_reviews::AudioReviewStore;
pub use catalog_search::CatalogSearchClient;
pub use library_store::SqliteLibraryStore;
pub use server::{run_server, RequestsLoggingLevel, ServerConfig};
