mod models;
mod schema;
mod store;

pub use models::{LibraryEntry, NewLibraryEntry, DEFAULT_ENTRY_TYPE};
pub use store::{LibraryError, SqliteLibraryStore};
