//! Volatile library binding.
//!
//! The whole library lives in one `LibraryState` behind one `RwLock`. Writers,
//! cascade deletes included, take the lock exclusively for the entire
//! operation; readers share it and so never see a half-applied cascade.

use super::cascade::CascadeReport;
use super::error::{LibraryError, LibraryResult};
use super::id::EntityId;
use super::models::*;
use super::state::LibraryState;
use super::trait_def::LibraryStore;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

#[derive(Default)]
pub struct InMemoryLibraryStore {
    state: RwLock<LibraryState>,
}

impl InMemoryLibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> LibraryResult<RwLockReadGuard<'_, LibraryState>> {
        self.state.read().map_err(|_| LibraryError::Poisoned)
    }

    fn write(&self) -> LibraryResult<RwLockWriteGuard<'_, LibraryState>> {
        self.state.write().map_err(|_| LibraryError::Poisoned)
    }
}

impl LibraryStore for InMemoryLibraryStore {
    fn create_artist(&self, input: NewArtist) -> LibraryResult<Artist> {
        let artist = self.write()?.create_artist(input)?;
        debug!("Created artist {}", artist.id);
        Ok(artist)
    }

    fn get_artist(&self, id: &str) -> LibraryResult<Artist> {
        let id = EntityId::parse(id)?;
        self.read()?.artists().require(&id).cloned()
    }

    fn list_artists(&self) -> LibraryResult<Vec<Artist>> {
        Ok(self.read()?.artists().list())
    }

    fn update_artist(&self, id: &str, patch: ArtistPatch) -> LibraryResult<Artist> {
        let id = EntityId::parse(id)?;
        self.write()?.update_artist(&id, patch)
    }

    fn create_album(&self, input: NewAlbum) -> LibraryResult<Album> {
        let album = self.write()?.create_album(input)?;
        debug!("Created album {}", album.id);
        Ok(album)
    }

    fn get_album(&self, id: &str) -> LibraryResult<Album> {
        let id = EntityId::parse(id)?;
        self.read()?.albums().require(&id).cloned()
    }

    fn list_albums(&self) -> LibraryResult<Vec<Album>> {
        Ok(self.read()?.albums().list())
    }

    fn update_album(&self, id: &str, patch: AlbumPatch) -> LibraryResult<Album> {
        let id = EntityId::parse(id)?;
        self.write()?.update_album(&id, patch)
    }

    fn create_track(&self, input: NewTrack) -> LibraryResult<Track> {
        let track = self.write()?.create_track(input)?;
        debug!("Created track {}", track.id);
        Ok(track)
    }

    fn get_track(&self, id: &str) -> LibraryResult<Track> {
        let id = EntityId::parse(id)?;
        self.read()?.tracks().require(&id).cloned()
    }

    fn list_tracks(&self) -> LibraryResult<Vec<Track>> {
        Ok(self.read()?.tracks().list())
    }

    fn update_track(&self, id: &str, patch: TrackPatch) -> LibraryResult<Track> {
        let id = EntityId::parse(id)?;
        self.write()?.update_track(&id, patch)
    }

    fn delete(&self, kind: EntityKind, id: &str) -> LibraryResult<CascadeReport> {
        let id = EntityId::parse(id)?;
        let report = self.write()?.cascade_delete(kind, id)?;
        info!(
            "Deleted {} {} ({} references cleared)",
            kind,
            id,
            report.fixups()
        );
        Ok(report)
    }

    fn list_favorites(&self) -> LibraryResult<FavoritesView> {
        Ok(self.read()?.favorites_view())
    }

    fn add_favorite(&self, kind: EntityKind, id: &str) -> LibraryResult<()> {
        let id = EntityId::parse(id)?;
        self.write()?.add_favorite(kind, id)?;
        debug!("Added {} {} to favorites", kind, id);
        Ok(())
    }

    fn remove_favorite(&self, kind: EntityKind, id: &str) -> LibraryResult<()> {
        let id = EntityId::parse(id)?;
        self.write()?.remove_favorite(kind, &id)?;
        debug!("Removed {} {} from favorites", kind, id);
        Ok(())
    }

    fn count(&self, kind: EntityKind) -> LibraryResult<usize> {
        Ok(self.read()?.count(kind))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
