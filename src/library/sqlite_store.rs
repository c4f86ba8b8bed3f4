//! Persisted library binding on top of SQLite.
//!
//! A single connection sits behind a mutex, so every operation is serialized.
//! Writes run in a transaction; a cascade delete performs all of its fixups
//! and the final delete inside one transaction and rolls back if any step
//! touches a different number of rows than the plan predicted.

use super::cascade::{CascadePlan, CascadeReport};
use super::error::{LibraryError, LibraryResult};
use super::id::EntityId;
use super::models::*;
use super::schema::LIBRARY_VERSIONED_SCHEMAS;
use super::trait_def::LibraryStore;
use crate::sqlite_persistence::open_versioned_database;
use anyhow::Result;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

impl ToSql for EntityId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for EntityId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        EntityId::parse(s).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

fn table_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Artist => "artists",
        EntityKind::Album => "albums",
        EntityKind::Track => "tracks",
    }
}

const ARTIST_COLUMNS: &str = "id, name, has_award";
const ALBUM_COLUMNS: &str = "id, name, year, artist_id";
const TRACK_COLUMNS: &str = "id, name, duration, artist_id, album_id";

fn artist_from_row(row: &Row) -> rusqlite::Result<Artist> {
    Ok(Artist {
        id: row.get(0)?,
        name: row.get(1)?,
        has_award: row.get(2)?,
    })
}

fn album_from_row(row: &Row) -> rusqlite::Result<Album> {
    Ok(Album {
        id: row.get(0)?,
        name: row.get(1)?,
        year: row.get(2)?,
        artist_id: row.get(3)?,
    })
}

fn track_from_row(row: &Row) -> rusqlite::Result<Track> {
    Ok(Track {
        id: row.get(0)?,
        name: row.get(1)?,
        duration: row.get(2)?,
        artist_id: row.get(3)?,
        album_id: row.get(4)?,
    })
}

// =============================================================================
// Queries shared by the store operations. They take a plain `Connection` so
// they work both on the connection and inside a `Transaction`.
// =============================================================================

fn exists(conn: &Connection, kind: EntityKind, id: &EntityId) -> LibraryResult<bool> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE id = ?1", table_name(kind)),
            params![id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn ensure_name_available(
    conn: &Connection,
    kind: EntityKind,
    name: &str,
    except: Option<&EntityId>,
) -> LibraryResult<()> {
    let holder: Option<EntityId> = conn
        .query_row(
            &format!("SELECT id FROM {} WHERE name = ?1", table_name(kind)),
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    match holder {
        Some(holder) if Some(&holder) != except => Err(LibraryError::DuplicateName {
            kind,
            name: name.to_string(),
        }),
        _ => Ok(()),
    }
}

fn resolve_reference(
    conn: &Connection,
    kind: EntityKind,
    raw: Option<&str>,
) -> LibraryResult<Option<EntityId>> {
    let Some(raw) = non_blank(raw) else {
        return Ok(None);
    };
    let invalid = || LibraryError::InvalidReference {
        kind,
        id: raw.to_string(),
    };
    let id = EntityId::parse(raw).map_err(|_| invalid())?;
    if exists(conn, kind, &id)? {
        Ok(Some(id))
    } else {
        Err(invalid())
    }
}

fn resolve_patch_reference(
    conn: &Connection,
    kind: EntityKind,
    raw: &Option<Option<String>>,
    current: Option<EntityId>,
) -> LibraryResult<Option<EntityId>> {
    match raw {
        None => Ok(current),
        Some(value) => resolve_reference(conn, kind, value.as_deref()),
    }
}

fn fetch_artist(conn: &Connection, id: &EntityId) -> LibraryResult<Artist> {
    conn.query_row(
        &format!("SELECT {} FROM artists WHERE id = ?1", ARTIST_COLUMNS),
        params![id],
        artist_from_row,
    )
    .optional()?
    .ok_or_else(|| LibraryError::not_found(EntityKind::Artist, id))
}

fn fetch_album(conn: &Connection, id: &EntityId) -> LibraryResult<Album> {
    conn.query_row(
        &format!("SELECT {} FROM albums WHERE id = ?1", ALBUM_COLUMNS),
        params![id],
        album_from_row,
    )
    .optional()?
    .ok_or_else(|| LibraryError::not_found(EntityKind::Album, id))
}

fn fetch_track(conn: &Connection, id: &EntityId) -> LibraryResult<Track> {
    conn.query_row(
        &format!("SELECT {} FROM tracks WHERE id = ?1", TRACK_COLUMNS),
        params![id],
        track_from_row,
    )
    .optional()?
    .ok_or_else(|| LibraryError::not_found(EntityKind::Track, id))
}

fn ids_where(conn: &Connection, table: &str, column: &str, target: &EntityId) -> LibraryResult<Vec<EntityId>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id FROM {} WHERE {} = ?1 ORDER BY rowid",
        table, column
    ))?;
    let ids = stmt
        .query_map(params![target], |row| row.get(0))?
        .collect::<Result<Vec<EntityId>, _>>()?;
    Ok(ids)
}

fn is_favorite(conn: &Connection, kind: EntityKind, id: &EntityId) -> LibraryResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM favorites WHERE kind = ?1 AND entity_id = ?2",
            params![kind.to_db_str(), id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Collects the cascade plan for `target` from the database.
fn prepare_cascade(conn: &Connection, kind: EntityKind, target: EntityId) -> LibraryResult<CascadePlan> {
    if !exists(conn, kind, &target)? {
        return Err(LibraryError::not_found(kind, target));
    }
    let mut plan = CascadePlan::empty(kind, target);
    match kind {
        EntityKind::Artist => {
            plan.album_artist_refs = ids_where(conn, "albums", "artist_id", &target)?;
            plan.track_artist_refs = ids_where(conn, "tracks", "artist_id", &target)?;
        }
        EntityKind::Album => {
            plan.track_album_refs = ids_where(conn, "tracks", "album_id", &target)?;
        }
        EntityKind::Track => {}
    }
    plan.in_favorites = is_favorite(conn, kind, &target)?;
    Ok(plan)
}

/// Runs the fixups of `plan` and the final delete. Every statement must touch
/// exactly the rows the plan lists, otherwise the caller rolls back.
fn apply_cascade(conn: &Connection, plan: &CascadePlan) -> LibraryResult<CascadeReport> {
    let target = &plan.target;
    let check = |step: &str, expected: usize, changed: usize| {
        if expected == changed {
            Ok(())
        } else {
            Err(LibraryError::CascadeAborted {
                kind: plan.kind,
                id: target.to_string(),
                reason: format!("{} changed {} rows, expected {}", step, changed, expected),
            })
        }
    };

    match plan.kind {
        EntityKind::Artist => {
            let changed = conn.execute(
                "UPDATE albums SET artist_id = NULL WHERE artist_id = ?1",
                params![target],
            )?;
            check("detaching albums", plan.album_artist_refs.len(), changed)?;
            let changed = conn.execute(
                "UPDATE tracks SET artist_id = NULL WHERE artist_id = ?1",
                params![target],
            )?;
            check("detaching tracks", plan.track_artist_refs.len(), changed)?;
        }
        EntityKind::Album => {
            let changed = conn.execute(
                "UPDATE tracks SET album_id = NULL WHERE album_id = ?1",
                params![target],
            )?;
            check("detaching tracks", plan.track_album_refs.len(), changed)?;
        }
        EntityKind::Track => {}
    }

    let changed = conn.execute(
        "DELETE FROM favorites WHERE kind = ?1 AND entity_id = ?2",
        params![plan.kind.to_db_str(), target],
    )?;
    check("removing favorite", usize::from(plan.in_favorites), changed)?;

    let changed = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", table_name(plan.kind)),
        params![target],
    )?;
    check("deleting record", 1, changed)?;

    Ok(plan.report())
}

pub struct SqliteLibraryStore {
    conn: Mutex<Connection>,
}

impl SqliteLibraryStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_database(db_path.as_ref(), LIBRARY_VERSIONED_SCHEMAS)?;
        info!("Opened library database {:?}", db_path.as_ref());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> LibraryResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| LibraryError::Poisoned)
    }

    fn list<T>(
        &self,
        table: &str,
        columns: &str,
        from_row: fn(&Row) -> rusqlite::Result<T>,
    ) -> LibraryResult<Vec<T>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY rowid",
            columns, table
        ))?;
        let records = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<T>, _>>()?;
        Ok(records)
    }
}

impl LibraryStore for SqliteLibraryStore {
    fn create_artist(&self, input: NewArtist) -> LibraryResult<Artist> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        ensure_name_available(&tx, EntityKind::Artist, &input.name, None)?;

        let artist = Artist {
            id: EntityId::generate(),
            name: input.name,
            has_award: input.has_award,
        };
        tx.execute(
            "INSERT INTO artists (id, name, has_award) VALUES (?1, ?2, ?3)",
            params![artist.id, artist.name, artist.has_award],
        )?;
        tx.commit()?;
        debug!("Created artist {}", artist.id);
        Ok(artist)
    }

    fn get_artist(&self, id: &str) -> LibraryResult<Artist> {
        let id = EntityId::parse(id)?;
        fetch_artist(&*self.lock()?, &id)
    }

    fn list_artists(&self) -> LibraryResult<Vec<Artist>> {
        self.list("artists", ARTIST_COLUMNS, artist_from_row)
    }

    fn update_artist(&self, id: &str, patch: ArtistPatch) -> LibraryResult<Artist> {
        let id = EntityId::parse(id)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut artist = fetch_artist(&tx, &id)?;
        if let Some(name) = &patch.name {
            ensure_name_available(&tx, EntityKind::Artist, name, Some(&id))?;
        }

        if let Some(name) = patch.name {
            artist.name = name;
        }
        if let Some(has_award) = patch.has_award {
            artist.has_award = has_award;
        }
        tx.execute(
            "UPDATE artists SET name = ?2, has_award = ?3 WHERE id = ?1",
            params![id, artist.name, artist.has_award],
        )?;
        tx.commit()?;
        Ok(artist)
    }

    fn create_album(&self, input: NewAlbum) -> LibraryResult<Album> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        ensure_name_available(&tx, EntityKind::Album, &input.name, None)?;
        let artist_id = resolve_reference(&tx, EntityKind::Artist, input.artist_id.as_deref())?;

        let album = Album {
            id: EntityId::generate(),
            name: input.name,
            year: input.year,
            artist_id,
        };
        tx.execute(
            "INSERT INTO albums (id, name, year, artist_id) VALUES (?1, ?2, ?3, ?4)",
            params![album.id, album.name, album.year, album.artist_id],
        )?;
        tx.commit()?;
        debug!("Created album {}", album.id);
        Ok(album)
    }

    fn get_album(&self, id: &str) -> LibraryResult<Album> {
        let id = EntityId::parse(id)?;
        fetch_album(&*self.lock()?, &id)
    }

    fn list_albums(&self) -> LibraryResult<Vec<Album>> {
        self.list("albums", ALBUM_COLUMNS, album_from_row)
    }

    fn update_album(&self, id: &str, patch: AlbumPatch) -> LibraryResult<Album> {
        let id = EntityId::parse(id)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut album = fetch_album(&tx, &id)?;
        if let Some(name) = &patch.name {
            ensure_name_available(&tx, EntityKind::Album, name, Some(&id))?;
        }
        album.artist_id =
            resolve_patch_reference(&tx, EntityKind::Artist, &patch.artist_id, album.artist_id)?;

        if let Some(name) = patch.name {
            album.name = name;
        }
        if let Some(year) = patch.year {
            album.year = year;
        }
        tx.execute(
            "UPDATE albums SET name = ?2, year = ?3, artist_id = ?4 WHERE id = ?1",
            params![id, album.name, album.year, album.artist_id],
        )?;
        tx.commit()?;
        Ok(album)
    }

    fn create_track(&self, input: NewTrack) -> LibraryResult<Track> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        ensure_name_available(&tx, EntityKind::Track, &input.name, None)?;
        let artist_id = resolve_reference(&tx, EntityKind::Artist, input.artist_id.as_deref())?;
        let album_id = resolve_reference(&tx, EntityKind::Album, input.album_id.as_deref())?;

        let track = Track {
            id: EntityId::generate(),
            name: input.name,
            duration: input.duration,
            artist_id,
            album_id,
        };
        tx.execute(
            "INSERT INTO tracks (id, name, duration, artist_id, album_id) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                track.id,
                track.name,
                track.duration,
                track.artist_id,
                track.album_id
            ],
        )?;
        tx.commit()?;
        debug!("Created track {}", track.id);
        Ok(track)
    }

    fn get_track(&self, id: &str) -> LibraryResult<Track> {
        let id = EntityId::parse(id)?;
        fetch_track(&*self.lock()?, &id)
    }

    fn list_tracks(&self) -> LibraryResult<Vec<Track>> {
        self.list("tracks", TRACK_COLUMNS, track_from_row)
    }

    fn update_track(&self, id: &str, patch: TrackPatch) -> LibraryResult<Track> {
        let id = EntityId::parse(id)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut track = fetch_track(&tx, &id)?;
        if let Some(name) = &patch.name {
            ensure_name_available(&tx, EntityKind::Track, name, Some(&id))?;
        }
        track.artist_id =
            resolve_patch_reference(&tx, EntityKind::Artist, &patch.artist_id, track.artist_id)?;
        track.album_id =
            resolve_patch_reference(&tx, EntityKind::Album, &patch.album_id, track.album_id)?;

        if let Some(name) = patch.name {
            track.name = name;
        }
        if let Some(duration) = patch.duration {
            track.duration = duration;
        }
        tx.execute(
            "UPDATE tracks SET name = ?2, duration = ?3, artist_id = ?4, album_id = ?5 WHERE id = ?1",
            params![
                id,
                track.name,
                track.duration,
                track.artist_id,
                track.album_id
            ],
        )?;
        tx.commit()?;
        Ok(track)
    }

    fn delete(&self, kind: EntityKind, id: &str) -> LibraryResult<CascadeReport> {
        let id = EntityId::parse(id)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let plan = prepare_cascade(&tx, kind, id)?;
        // dropping `tx` on error rolls every fixup back
        let report = apply_cascade(&tx, &plan)?;
        tx.commit()?;
        info!(
            "Deleted {} {} ({} references cleared)",
            kind,
            id,
            report.fixups()
        );
        Ok(report)
    }

    fn list_favorites(&self) -> LibraryResult<FavoritesView> {
        let conn = self.lock()?;
        let query = |kind: EntityKind, columns: &str| {
            format!(
                "SELECT {} FROM favorites f JOIN {} e ON e.id = f.entity_id WHERE f.kind = '{}' ORDER BY f.rowid",
                columns
                    .split(", ")
                    .map(|c| format!("e.{}", c))
                    .collect::<Vec<_>>()
                    .join(", "),
                table_name(kind),
                kind.to_db_str()
            )
        };

        let artists = conn
            .prepare(&query(EntityKind::Artist, ARTIST_COLUMNS))?
            .query_map([], artist_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        let albums = conn
            .prepare(&query(EntityKind::Album, ALBUM_COLUMNS))?
            .query_map([], album_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        let tracks = conn
            .prepare(&query(EntityKind::Track, TRACK_COLUMNS))?
            .query_map([], track_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FavoritesView {
            artists,
            albums,
            tracks,
        })
    }

    fn add_favorite(&self, kind: EntityKind, id: &str) -> LibraryResult<()> {
        let id = EntityId::parse(id)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        if !exists(&tx, kind, &id)? {
            return Err(LibraryError::UnprocessableReference {
                kind,
                id: id.to_string(),
            });
        }
        if is_favorite(&tx, kind, &id)? {
            return Err(LibraryError::AlreadyFavorited {
                kind,
                id: id.to_string(),
            });
        }
        tx.execute(
            "INSERT INTO favorites (kind, entity_id) VALUES (?1, ?2)",
            params![kind.to_db_str(), id],
        )?;
        tx.commit()?;
        debug!("Added {} {} to favorites", kind, id);
        Ok(())
    }

    fn remove_favorite(&self, kind: EntityKind, id: &str) -> LibraryResult<()> {
        let id = EntityId::parse(id)?;
        let changed = self.lock()?.execute(
            "DELETE FROM favorites WHERE kind = ?1 AND entity_id = ?2",
            params![kind.to_db_str(), id],
        )?;
        if changed == 0 {
            return Err(LibraryError::NotFavorited {
                kind,
                id: id.to_string(),
            });
        }
        debug!("Removed {} {} from favorites", kind, id);
        Ok(())
    }

    fn count(&self, kind: EntityKind) -> LibraryResult<usize> {
        let count: i64 = self.lock()?.query_row(
            &format!("SELECT COUNT(*) FROM {}", table_name(kind)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
