//! The favorites record: three membership lists of weak references.

use super::error::{LibraryError, LibraryResult};
use super::id::EntityId;
use super::models::EntityKind;

/// Holds ids only. It never owns or pins the records it names; stale ids are
/// removed by the cascade when their record is deleted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Favorites {
    artists: Vec<EntityId>,
    albums: Vec<EntityId>,
    tracks: Vec<EntityId>,
}

impl Favorites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self, kind: EntityKind) -> &[EntityId] {
        match kind {
            EntityKind::Artist => &self.artists,
            EntityKind::Album => &self.albums,
            EntityKind::Track => &self.tracks,
        }
    }

    fn ids_mut(&mut self, kind: EntityKind) -> &mut Vec<EntityId> {
        match kind {
            EntityKind::Artist => &mut self.artists,
            EntityKind::Album => &mut self.albums,
            EntityKind::Track => &mut self.tracks,
        }
    }

    pub fn contains(&self, kind: EntityKind, id: &EntityId) -> bool {
        self.ids(kind).contains(id)
    }

    /// Appends `id`. Existence of the target is the caller's concern.
    pub fn add(&mut self, kind: EntityKind, id: EntityId) -> LibraryResult<()> {
        if self.contains(kind, &id) {
            return Err(LibraryError::AlreadyFavorited {
                kind,
                id: id.to_string(),
            });
        }
        self.ids_mut(kind).push(id);
        Ok(())
    }

    pub fn remove(&mut self, kind: EntityKind, id: &EntityId) -> LibraryResult<()> {
        let list = self.ids_mut(kind);
        match list.iter().position(|x| x == id) {
            Some(index) => {
                list.remove(index);
                Ok(())
            }
            None => Err(LibraryError::NotFavorited {
                kind,
                id: id.to_string(),
            }),
        }
    }

    /// Removes `id` if present. Used by the cascade, where absence is fine.
    pub fn discard(&mut self, kind: EntityKind, id: &EntityId) -> bool {
        self.remove(kind, id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.artists.len() + self.albums.len() + self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
