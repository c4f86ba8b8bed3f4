//! SQLite schema for the persisted library binding.
//!
//! Rows are keyed by integer rowids (which also give the insertion order) and
//! carry the record's identifier token in a unique `id` column. Foreign keys
//! point at those `id` columns with `ON DELETE RESTRICT`, so the database
//! refuses to drop a row something still references.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

const ARTISTS_TABLE_V_0: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "has_award",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

const ALBUMS_TABLE_V_0: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("year", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Text,
            foreign_key = Some(&ForeignKey {
                foreign_table: "artists",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Restrict,
            })
        ),
    ],
    indices: &[("idx_albums_artist", "artist_id")],
    unique_constraints: &[],
};

const TRACKS_TABLE_V_0: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("duration", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Text,
            foreign_key = Some(&ForeignKey {
                foreign_table: "artists",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Restrict,
            })
        ),
        sqlite_column!(
            "album_id",
            &SqlType::Text,
            foreign_key = Some(&ForeignKey {
                foreign_table: "albums",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Restrict,
            })
        ),
    ],
    indices: &[
        ("idx_tracks_artist", "artist_id"),
        ("idx_tracks_album", "album_id"),
    ],
    unique_constraints: &[],
};

/// Membership rows. `kind` is one of `artist`, `album`, `track`; since the
/// target table depends on it there is no foreign key, and the cascade removes
/// rows explicitly.
const FAVORITES_TABLE_V_0: Table = Table {
    name: "favorites",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("kind", &SqlType::Text, non_null = true),
        sqlite_column!("entity_id", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_favorites_entity", "entity_id")],
    unique_constraints: &[&["kind", "entity_id"]],
};

pub const LIBRARY_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ARTISTS_TABLE_V_0,
        ALBUMS_TABLE_V_0,
        TRACKS_TABLE_V_0,
        FAVORITES_TABLE_V_0,
    ],
    migration: None,
}];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn create() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        LIBRARY_VERSIONED_SCHEMAS[0].create(&conn).unwrap();
        conn
    }

    #[test]
    fn created_schema_validates() {
        let conn = create();
        LIBRARY_VERSIONED_SCHEMAS[0].validate(&conn).unwrap();
    }

    #[test]
    fn restrict_blocks_deleting_referenced_artist() {
        let conn = create();
        conn.execute("INSERT INTO artists (id, name) VALUES ('a1', 'X')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO albums (id, name, year, artist_id) VALUES ('m1', 'Y', 2000, 'a1')",
            [],
        )
        .unwrap();

        assert!(conn.execute("DELETE FROM artists WHERE id = 'a1'", []).is_err());

        conn.execute("UPDATE albums SET artist_id = NULL WHERE artist_id = 'a1'", [])
            .unwrap();
        assert_eq!(
            conn.execute("DELETE FROM artists WHERE id = 'a1'", []).unwrap(),
            1
        );
    }

    #[test]
    fn dangling_reference_cannot_be_inserted() {
        let conn = create();
        let result = conn.execute(
            "INSERT INTO tracks (id, name, duration, album_id) VALUES ('t1', 'T', 10, 'missing')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn favorites_are_unique_per_kind() {
        let conn = create();
        conn.execute(
            "INSERT INTO favorites (kind, entity_id) VALUES ('track', 't1')",
            [],
        )
        .unwrap();
        assert!(conn
            .execute(
                "INSERT INTO favorites (kind, entity_id) VALUES ('track', 't1')",
                [],
            )
            .is_err());
        conn.execute(
            "INSERT INTO favorites (kind, entity_id) VALUES ('album', 't1')",
            [],
        )
        .unwrap();
    }
}
