//! LibraryStore trait definition.
//!
//! The contract shared by the volatile in-memory binding and the SQLite
//! binding. Identifiers cross this boundary as raw strings; parsing them is
//! part of every operation so both bindings report `InvalidIdentifier` the
//! same way.

use super::cascade::CascadeReport;
use super::error::LibraryResult;
use super::models::*;

/// Trait for library storage backends.
///
/// Implementations guarantee that a cascade delete is observed by every other
/// operation as all-or-nothing.
pub trait LibraryStore: Send + Sync {
    // =========================================================================
    // Artists
    // =========================================================================

    fn create_artist(&self, input: NewArtist) -> LibraryResult<Artist>;

    fn get_artist(&self, id: &str) -> LibraryResult<Artist>;

    /// All artists in insertion order.
    fn list_artists(&self) -> LibraryResult<Vec<Artist>>;

    fn update_artist(&self, id: &str, patch: ArtistPatch) -> LibraryResult<Artist>;

    // =========================================================================
    // Albums
    // =========================================================================

    fn create_album(&self, input: NewAlbum) -> LibraryResult<Album>;

    fn get_album(&self, id: &str) -> LibraryResult<Album>;

    fn list_albums(&self) -> LibraryResult<Vec<Album>>;

    fn update_album(&self, id: &str, patch: AlbumPatch) -> LibraryResult<Album>;

    // =========================================================================
    // Tracks
    // =========================================================================

    fn create_track(&self, input: NewTrack) -> LibraryResult<Track>;

    fn get_track(&self, id: &str) -> LibraryResult<Track>;

    fn list_tracks(&self) -> LibraryResult<Vec<Track>>;

    fn update_track(&self, id: &str, patch: TrackPatch) -> LibraryResult<Track>;

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Deletes a record of `kind`, first clearing every reference to it.
    fn delete(&self, kind: EntityKind, id: &str) -> LibraryResult<CascadeReport>;

    // =========================================================================
    // Favorites
    // =========================================================================

    /// Favorites resolved to records. Stale ids are left out.
    fn list_favorites(&self) -> LibraryResult<FavoritesView>;

    fn add_favorite(&self, kind: EntityKind, id: &str) -> LibraryResult<()>;

    fn remove_favorite(&self, kind: EntityKind, id: &str) -> LibraryResult<()>;

    // =========================================================================
    // Counts (for metrics and the status page)
    // =========================================================================

    fn count(&self, kind: EntityKind) -> LibraryResult<usize>;

    /// Name of the binding, reported on the status page.
    fn backend_name(&self) -> &'static str;
}
