use super::models::{LibraryEntry, NewLibraryEntry, DEFAULT_ENTRY_TYPE};
use super::schema::LIBRARY_VERSIONED_SCHEMAS;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::Context;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::info;

/// Errors surfaced by library operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("missing required field: {0}")]
    Validation(&'static str),

    #[error("movie {0} is already in the library")]
    Duplicate(String),

    #[error("movie {0} is not in the library")]
    NotFound(String),

    #[error("library storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub struct SqliteLibraryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLibraryStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> anyhow::Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let mut conn = Connection::open(path).context("Failed to open library database")?;

        if is_new_db {
            // Fresh database - create with latest schema
            info!("Creating new library database at {:?}", path);
            LIBRARY_VERSIONED_SCHEMAS.last().unwrap().create(&conn)?;
        } else {
            Self::validate_and_migrate(&mut conn)?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store with the latest schema, for tests.
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        LIBRARY_VERSIONED_SCHEMAS.last().unwrap().create(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn validate_and_migrate(conn: &mut Connection) -> anyhow::Result<()> {
        let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        let db_version = raw_version - BASE_DB_VERSION as i64;

        if db_version < 1 {
            anyhow::bail!(
                "Library database version {} is invalid (expected >= 1)",
                db_version
            );
        }

        let schema = LIBRARY_VERSIONED_SCHEMAS
            .iter()
            .find(|s| s.version == db_version as usize)
            .with_context(|| format!("Unknown library database version {}", db_version))?;
        schema.validate(conn).with_context(|| {
            format!(
                "Library database schema validation failed for version {}",
                db_version
            )
        })?;

        let current_version = LIBRARY_VERSIONED_SCHEMAS.last().unwrap().version as i64;
        if db_version < current_version {
            info!(
                "Migrating library database from version {} to {}",
                db_version, current_version
            );
            let tx = conn.transaction()?;
            for schema in LIBRARY_VERSIONED_SCHEMAS
                .iter()
                .filter(|s| s.version > db_version as usize)
            {
                if let Some(migration_fn) = schema.migration {
                    migration_fn(&tx).with_context(|| {
                        format!("Failed to run migration to version {}", schema.version)
                    })?;
                }
            }
            tx.execute(
                &format!(
                    "PRAGMA user_version = {}",
                    BASE_DB_VERSION + current_version as usize
                ),
                [],
            )?;
            tx.commit()?;
        }
        Ok(())
    }

    /// Add a movie to the library.
    ///
    /// Uniqueness on `movie_id` is enforced by the database constraint; a
    /// violated insert comes back as `Duplicate` without mutating state.
    pub fn add(&self, entry: NewLibraryEntry) -> Result<LibraryEntry, LibraryError> {
        if entry.movie_id.trim().is_empty() {
            return Err(LibraryError::Validation("movieId"));
        }
        if entry.title.trim().is_empty() {
            return Err(LibraryError::Validation("title"));
        }

        let entry_type = entry
            .entry_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENTRY_TYPE.to_string());
        let now = Utc::now().timestamp();

        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO library (movie_id, title, year, image, rating, type, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                entry.movie_id,
                entry.title,
                entry.year,
                entry.image,
                entry.rating,
                entry_type,
                now
            ],
        );

        match result {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                Ok(Self::get_by_id(&conn, id)?)
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(LibraryError::Duplicate(entry.movie_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a movie from the library, returning the deleted entry so the
    /// caller can clean up any attached audio file.
    pub fn remove(&self, movie_id: &str) -> Result<LibraryEntry, LibraryError> {
        let conn = self.conn.lock().unwrap();
        let entry = Self::query_by_movie_id(&conn, movie_id)?
            .ok_or_else(|| LibraryError::NotFound(movie_id.to_string()))?;

        conn.execute("DELETE FROM library WHERE movie_id = ?1", params![movie_id])?;
        Ok(entry)
    }

    /// All entries, most recently added first.
    pub fn list(&self) -> Result<Vec<LibraryEntry>, LibraryError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, movie_id, title, audio_review_path, year, image, rating, type,
                    created_at, updated_at
             FROM library
             ORDER BY created_at DESC, id DESC",
        )?;
        let entries = stmt
            .query_map([], Self::row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn exists(&self, movie_id: &str) -> Result<bool, LibraryError> {
        let conn = self.conn.lock().unwrap();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM library WHERE movie_id = ?1",
                params![movie_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get(&self, movie_id: &str) -> Result<Option<LibraryEntry>, LibraryError> {
        let conn = self.conn.lock().unwrap();
        Self::query_by_movie_id(&conn, movie_id)
    }

    /// Record the relative storage path of an entry's audio review.
    pub fn set_audio_review_path(
        &self,
        movie_id: &str,
        audio_path: &str,
    ) -> Result<(), LibraryError> {
        let now = Utc::now().timestamp();
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(
            "UPDATE library SET audio_review_path = ?1, updated_at = ?2 WHERE movie_id = ?3",
            params![audio_path, now, movie_id],
        )?;
        if affected == 0 {
            return Err(LibraryError::NotFound(movie_id.to_string()));
        }
        Ok(())
    }

    fn query_by_movie_id(
        conn: &Connection,
        movie_id: &str,
    ) -> Result<Option<LibraryEntry>, LibraryError> {
        let entry = conn
            .query_row(
                "SELECT id, movie_id, title, audio_review_path, year, image, rating, type,
                        created_at, updated_at
                 FROM library WHERE movie_id = ?1",
                params![movie_id],
                Self::row_to_entry,
            )
            .optional()?;
        Ok(entry)
    }

    fn get_by_id(conn: &Connection, id: i64) -> Result<LibraryEntry, rusqlite::Error> {
        conn.query_row(
            "SELECT id, movie_id, title, audio_review_path, year, image, rating, type,
                    created_at, updated_at
             FROM library WHERE id = ?1",
            params![id],
            Self::row_to_entry,
        )
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<LibraryEntry> {
        Ok(LibraryEntry {
            id: row.get("id")?,
            movie_id: row.get("movie_id")?,
            title: row.get("title")?,
            audio_review_path: row.get("audio_review_path")?,
            year: row.get("year")?,
            image: row.get("image")?,
            rating: row.get("rating")?,
            entry_type: row.get("type")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}
