//! The four collections under a single owner.
//!
//! `LibraryState` is plain data with no locking of its own; the store that
//! owns it decides the exclusion scope. Every mutating method validates fully
//! before touching anything, so a failed call leaves the state unchanged.

use super::collection::Collection;
use super::error::{LibraryError, LibraryResult};
use super::favorites::Favorites;
use super::id::EntityId;
use super::models::*;

#[derive(Clone, Debug, Default)]
pub struct LibraryState {
    pub(crate) artists: Collection<Artist>,
    pub(crate) albums: Collection<Album>,
    pub(crate) tracks: Collection<Track>,
    pub(crate) favorites: Favorites,
}

impl LibraryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artists(&self) -> &Collection<Artist> {
        &self.artists
    }

    pub fn albums(&self) -> &Collection<Album> {
        &self.albums
    }

    pub fn tracks(&self) -> &Collection<Track> {
        &self.tracks
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub fn exists(&self, kind: EntityKind, id: &EntityId) -> bool {
        match kind {
            EntityKind::Artist => self.artists.contains(id),
            EntityKind::Album => self.albums.contains(id),
            EntityKind::Track => self.tracks.contains(id),
        }
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Artist => self.artists.len(),
            EntityKind::Album => self.albums.len(),
            EntityKind::Track => self.tracks.len(),
        }
    }

    /// Resolves a raw foreign key against the current state.
    ///
    /// Blank means no reference. Anything else must name an existing record of
    /// `kind`, otherwise it is an `InvalidReference`.
    pub fn resolve_reference(
        &self,
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
        if self.exists(kind, &id) {
            Ok(Some(id))
        } else {
            Err(invalid())
        }
    }

    /// Patch variant: `None` keeps the current value, `Some(None)` clears it.
    fn resolve_patch_reference(
        &self,
        kind: EntityKind,
        raw: &Option<Option<String>>,
        current: Option<EntityId>,
    ) -> LibraryResult<Option<EntityId>> {
        match raw {
            None => Ok(current),
            Some(value) => self.resolve_reference(kind, value.as_deref()),
        }
    }

    // =========================================================================
    // Artists
    // =========================================================================

    pub fn create_artist(&mut self, input: NewArtist) -> LibraryResult<Artist> {
        let artist = Artist {
            id: EntityId::generate(),
            name: input.name,
            has_award: input.has_award,
        };
        self.artists.insert(artist.clone())?;
        Ok(artist)
    }

    pub fn update_artist(&mut self, id: &EntityId, patch: ArtistPatch) -> LibraryResult<Artist> {
        self.artists.require(id)?;
        if let Some(name) = &patch.name {
            self.artists.ensure_name_available(name, Some(id))?;
        }

        self.artists.modify(id, |artist| {
            if let Some(name) = patch.name {
                artist.name = name;
            }
            if let Some(has_award) = patch.has_award {
                artist.has_award = has_award;
            }
        });
        self.artists.require(id).cloned()
    }

    // =========================================================================
    // Albums
    // =========================================================================

    pub fn create_album(&mut self, input: NewAlbum) -> LibraryResult<Album> {
        self.albums.ensure_name_available(&input.name, None)?;
        let artist_id = self.resolve_reference(EntityKind::Artist, input.artist_id.as_deref())?;

        let album = Album {
            id: EntityId::generate(),
            name: input.name,
            year: input.year,
            artist_id,
        };
        self.albums.insert(album.clone())?;
        Ok(album)
    }

    pub fn update_album(&mut self, id: &EntityId, patch: AlbumPatch) -> LibraryResult<Album> {
        let current = self.albums.require(id)?;
        if let Some(name) = &patch.name {
            self.albums.ensure_name_available(name, Some(id))?;
        }
        let artist_id =
            self.resolve_patch_reference(EntityKind::Artist, &patch.artist_id, current.artist_id)?;

        self.albums.modify(id, |album| {
            if let Some(name) = patch.name {
                album.name = name;
            }
            if let Some(year) = patch.year {
                album.year = year;
            }
            album.artist_id = artist_id;
        });
        self.albums.require(id).cloned()
    }

    // =========================================================================
    // Tracks
    // =========================================================================

    pub fn create_track(&mut self, input: NewTrack) -> LibraryResult<Track> {
        self.tracks.ensure_name_available(&input.name, None)?;
        let artist_id = self.resolve_reference(EntityKind::Artist, input.artist_id.as_deref())?;
        let album_id = self.resolve_reference(EntityKind::Album, input.album_id.as_deref())?;

        let track = Track {
            id: EntityId::generate(),
            name: input.name,
            duration: input.duration,
            artist_id,
            album_id,
        };
        self.tracks.insert(track.clone())?;
        Ok(track)
    }

    pub fn update_track(&mut self, id: &EntityId, patch: TrackPatch) -> LibraryResult<Track> {
        let current = self.tracks.require(id)?;
        if let Some(name) = &patch.name {
            self.tracks.ensure_name_available(name, Some(id))?;
        }
        let artist_id =
            self.resolve_patch_reference(EntityKind::Artist, &patch.artist_id, current.artist_id)?;
        let album_id =
            self.resolve_patch_reference(EntityKind::Album, &patch.album_id, current.album_id)?;

        self.tracks.modify(id, |track| {
            if let Some(name) = patch.name {
                track.name = name;
            }
            if let Some(duration) = patch.duration {
                track.duration = duration;
            }
            track.artist_id = artist_id;
            track.album_id = album_id;
        });
        self.tracks.require(id).cloned()
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    /// Resolves every favorite, silently dropping ids that no longer resolve.
    pub fn favorites_view(&self) -> FavoritesView {
        let favorites = &self.favorites;
        FavoritesView {
            artists: favorites
                .ids(EntityKind::Artist)
                .iter()
                .filter_map(|id| self.artists.get(id).cloned())
                .collect(),
            albums: favorites
                .ids(EntityKind::Album)
                .iter()
                .filter_map(|id| self.albums.get(id).cloned())
                .collect(),
            tracks: favorites
                .ids(EntityKind::Track)
                .iter()
                .filter_map(|id| self.tracks.get(id).cloned())
                .collect(),
        }
    }

    pub fn add_favorite(&mut self, kind: EntityKind, id: EntityId) -> LibraryResult<()> {
        if !self.exists(kind, &id) {
            return Err(LibraryError::UnprocessableReference {
                kind,
                id: id.to_string(),
            });
        }
        self.favorites.add(kind, id)
    }

    pub fn remove_favorite(&mut self, kind: EntityKind, id: &EntityId) -> LibraryResult<()> {
        self.favorites.remove(kind, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_artist(name: &str) -> NewArtist {
        NewArtist {
            name: name.to_string(),
            has_award: false,
        }
    }

    #[test]
    fn album_reference_must_exist_at_write_time() {
        let mut state = LibraryState::new();
        let result = state.create_album(NewAlbum {
            name: "Y".to_string(),
            year: 2000,
            artist_id: Some(EntityId::generate().to_string()),
        });
        assert!(matches!(
            result,
            Err(LibraryError::InvalidReference {
                kind: EntityKind::Artist,
                ..
            })
        ));
        assert!(state.albums().is_empty());
    }

    #[test]
    fn malformed_reference_is_invalid_reference() {
        let mut state = LibraryState::new();
        let result = state.create_track(NewTrack {
            name: "T".to_string(),
            duration: 10,
            artist_id: None,
            album_id: Some("nope".to_string()),
        });
        assert!(matches!(
            result,
            Err(LibraryError::InvalidReference {
                kind: EntityKind::Album,
                ..
            })
        ));
    }

    #[test]
    fn blank_reference_means_none() {
        let mut state = LibraryState::new();
        let album = state
            .create_album(NewAlbum {
                name: "Y".to_string(),
                year: 2000,
                artist_id: Some("".to_string()),
            })
            .unwrap();
        assert_eq!(album.artist_id, None);
    }

    #[test]
    fn update_applies_only_present_fields() {
        let mut state = LibraryState::new();
        let artist = state.create_artist(new_artist("X")).unwrap();
        let album = state
            .create_album(NewAlbum {
                name: "Y".to_string(),
                year: 2000,
                artist_id: Some(artist.id.to_string()),
            })
            .unwrap();

        let updated = state
            .update_album(
                &album.id,
                AlbumPatch {
                    year: Some(2001),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.year, 2001);
        assert_eq!(updated.name, "Y");
        assert_eq!(updated.artist_id, Some(artist.id));

        let cleared = state
            .update_album(
                &album.id,
                AlbumPatch {
                    artist_id: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(cleared.artist_id, None);
        assert_eq!(cleared.id, album.id);
    }

    #[test]
    fn failed_update_leaves_record_untouched() {
        let mut state = LibraryState::new();
        state
            .create_track(NewTrack {
                name: "taken".to_string(),
                duration: 1,
                ..Default::default()
            })
            .unwrap();
        let track = state
            .create_track(NewTrack {
                name: "T".to_string(),
                duration: 1,
                ..Default::default()
            })
            .unwrap();

        // name collides, duration must not be applied either
        let result = state.update_track(
            &track.id,
            TrackPatch {
                name: Some("taken".to_string()),
                duration: Some(99),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(LibraryError::DuplicateName { .. })));
        assert_eq!(state.tracks().get(&track.id).unwrap(), &track);

        // dangling reference, rename must not be applied either
        let result = state.update_track(
            &track.id,
            TrackPatch {
                name: Some("renamed".to_string()),
                artist_id: Some(Some(EntityId::generate().to_string())),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(LibraryError::InvalidReference { .. })));
        assert_eq!(state.tracks().get(&track.id).unwrap(), &track);
    }

    #[test]
    fn renaming_to_own_name_is_allowed() {
        let mut state = LibraryState::new();
        let artist = state.create_artist(new_artist("X")).unwrap();
        let updated = state
            .update_artist(
                &artist.id,
                ArtistPatch {
                    name: Some("X".to_string()),
                    has_award: Some(true),
                },
            )
            .unwrap();
        assert!(updated.has_award);
    }

    #[test]
    fn favorites_view_drops_stale_ids() {
        let mut state = LibraryState::new();
        let artist = state.create_artist(new_artist("X")).unwrap();
        state.add_favorite(EntityKind::Artist, artist.id).unwrap();

        // bypass the cascade to simulate a stale entry
        state.artists.remove(&artist.id);
        assert!(state.favorites().contains(EntityKind::Artist, &artist.id));
        assert!(state.favorites_view().artists.is_empty());
    }

    #[test]
    fn add_favorite_requires_existing_record() {
        let mut state = LibraryState::new();
        assert!(matches!(
            state.add_favorite(EntityKind::Album, EntityId::generate()),
            Err(LibraryError::UnprocessableReference { .. })
        ));
    }
}
