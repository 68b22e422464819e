//! SQLite schema for the library database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

/// Library table - one row per saved movie.
///
/// `movie_id` carries a UNIQUE constraint: the database is the authority on
/// entry uniqueness, a violated insert is reported as a duplicate.
const LIBRARY_TABLE_V1: Table = Table {
    name: "library",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true), // AUTOINCREMENT
        sqlite_column!("movie_id", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("audio_review_path", &SqlType::Text),
        sqlite_column!("year", &SqlType::Integer),
        sqlite_column!("image", &SqlType::Text),
        sqlite_column!("rating", &SqlType::Text),
        sqlite_column!(
            "type",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'movie'")
        ),
        sqlite_column!("created_at", &SqlType::Integer, non_null = true),
        sqlite_column!("updated_at", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_library_created_at", "created_at DESC")],
};

/// All versioned schemas for the library database.
pub const LIBRARY_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[LIBRARY_TABLE_V1],
    migration: None, // Initial version has no migration
}];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn v1_schema_creates_and_validates() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = LIBRARY_VERSIONED_SCHEMAS.last().unwrap();
        schema.create(&conn).unwrap();
        schema.validate(&conn).unwrap();
    }

    #[test]
    fn movie_id_unique_constraint_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        LIBRARY_VERSIONED_SCHEMAS.last().unwrap().create(&conn).unwrap();

        conn.execute(
            "INSERT INTO library (movie_id, title, created_at, updated_at)
             VALUES ('tt001', 'First', 0, 0)",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO library (movie_id, title, created_at, updated_at)
             VALUES ('tt001', 'Second', 0, 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn type_defaults_to_movie() {
        let conn = Connection::open_in_memory().unwrap();
        LIBRARY_VERSIONED_SCHEMAS.last().unwrap().create(&conn).unwrap();

        conn.execute(
            "INSERT INTO library (movie_id, title, created_at, updated_at)
             VALUES ('tt001', 'First', 0, 0)",
            [],
        )
        .unwrap();

        let entry_type: String = conn
            .query_row(
                "SELECT type FROM library WHERE movie_id = 'tt001'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(entry_type, "movie");
    }
}
