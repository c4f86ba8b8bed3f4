//! Cascade delete across the library collections.
//!
//! A delete is done in two phases under one exclusion scope:
//!
//! 1. **prepare**: confirm the target exists and collect every dependent
//!    reference (album/track foreign keys, favorites membership) into a
//!    [`CascadePlan`].
//! 2. **apply**: check the plan still describes the state exactly, then null
//!    the foreign keys, drop the favorites entry and finally remove the target.
//!
//! If the check fails nothing is mutated and the delete reports
//! `CascadeAborted`. Fixups always run before the owning collection loses the
//! record, so no reader holding the same scope can see a dangling reference.

use super::error::{LibraryError, LibraryResult};
use super::id::EntityId;
use super::models::{Album, EntityKind, Track};
use super::state::LibraryState;

/// Every reference that must be cleared before `target` can be deleted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CascadePlan {
    pub kind: EntityKind,
    pub target: EntityId,
    /// Albums whose `artist_id` is the target.
    pub album_artist_refs: Vec<EntityId>,
    /// Tracks whose `artist_id` is the target.
    pub track_artist_refs: Vec<EntityId>,
    /// Tracks whose `album_id` is the target.
    pub track_album_refs: Vec<EntityId>,
    pub in_favorites: bool,
}

/// What a completed cascade did, for logging and metrics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub albums_detached: usize,
    pub tracks_detached: usize,
    pub unfavorited: bool,
}

impl CascadeReport {
    pub fn fixups(&self) -> usize {
        self.albums_detached + self.tracks_detached + usize::from(self.unfavorited)
    }
}

impl CascadePlan {
    /// A plan with no dependents; bindings fill in the reference lists.
    pub fn empty(kind: EntityKind, target: EntityId) -> Self {
        Self {
            kind,
            target,
            album_artist_refs: Vec::new(),
            track_artist_refs: Vec::new(),
            track_album_refs: Vec::new(),
            in_favorites: false,
        }
    }

    /// Collects the dependents of `target` in `state`.
    ///
    /// Fails with `NotFound` if the target does not exist; this is the only
    /// existence check of the whole delete.
    pub fn prepare(state: &LibraryState, kind: EntityKind, target: EntityId) -> LibraryResult<Self> {
        if !state.exists(kind, &target) {
            return Err(LibraryError::not_found(kind, target));
        }

        let mut plan = Self::empty(kind, target);
        match kind {
            EntityKind::Artist => {
                plan.album_artist_refs = state.albums.ids_where(|a| a.artist_id == Some(target));
                plan.track_artist_refs = state.tracks.ids_where(|t| t.artist_id == Some(target));
            }
            EntityKind::Album => {
                plan.track_album_refs = state.tracks.ids_where(|t| t.album_id == Some(target));
            }
            EntityKind::Track => {}
        }
        plan.in_favorites = state.favorites.contains(kind, &target);
        Ok(plan)
    }

    pub fn report(&self) -> CascadeReport {
        CascadeReport {
            albums_detached: self.album_artist_refs.len(),
            tracks_detached: self.track_artist_refs.len() + self.track_album_refs.len(),
            unfavorited: self.in_favorites,
        }
    }

    fn abort(&self, reason: impl Into<String>) -> LibraryError {
        LibraryError::CascadeAborted {
            kind: self.kind,
            id: self.target.to_string(),
            reason: reason.into(),
        }
    }
}

fn album_points_at(album: Option<&Album>, target: EntityId) -> bool {
    album.is_some_and(|a| a.artist_id == Some(target))
}

fn track_artist_points_at(track: Option<&Track>, target: EntityId) -> bool {
    track.is_some_and(|t| t.artist_id == Some(target))
}

fn track_album_points_at(track: Option<&Track>, target: EntityId) -> bool {
    track.is_some_and(|t| t.album_id == Some(target))
}

impl LibraryState {
    /// Deletes a record together with all references to it.
    pub fn cascade_delete(&mut self, kind: EntityKind, target: EntityId) -> LibraryResult<CascadeReport> {
        let plan = CascadePlan::prepare(self, kind, target)?;
        self.apply_cascade(&plan)
    }

    /// Checks that `plan` matches the state exactly: every listed fixup
    /// applies and no dependent is left out.
    pub fn verify_cascade(&self, plan: &CascadePlan) -> LibraryResult<()> {
        let target = plan.target;
        if !self.exists(plan.kind, &target) {
            return Err(plan.abort("target no longer exists"));
        }

        if let Some(id) = plan
            .album_artist_refs
            .iter()
            .find(|id| !album_points_at(self.albums.get(id), target))
        {
            return Err(plan.abort(format!("album {} does not reference the target", id)));
        }
        if let Some(id) = plan
            .track_artist_refs
            .iter()
            .find(|id| !track_artist_points_at(self.tracks.get(id), target))
        {
            return Err(plan.abort(format!("track {} does not reference the target artist", id)));
        }
        if let Some(id) = plan
            .track_album_refs
            .iter()
            .find(|id| !track_album_points_at(self.tracks.get(id), target))
        {
            return Err(plan.abort(format!("track {} does not reference the target album", id)));
        }
        if plan.in_favorites != self.favorites.contains(plan.kind, &target) {
            return Err(plan.abort("favorites membership changed"));
        }

        let expected = CascadePlan::prepare(self, plan.kind, target)?;
        let covers = |planned: &[EntityId], actual: &[EntityId]| {
            actual.iter().all(|id| planned.contains(id))
        };
        if !covers(&plan.album_artist_refs, &expected.album_artist_refs)
            || !covers(&plan.track_artist_refs, &expected.track_artist_refs)
            || !covers(&plan.track_album_refs, &expected.track_album_refs)
        {
            return Err(plan.abort("plan misses dependent records"));
        }
        Ok(())
    }

    /// Applies a verified plan. Nothing is mutated if verification fails.
    pub fn apply_cascade(&mut self, plan: &CascadePlan) -> LibraryResult<CascadeReport> {
        self.verify_cascade(plan)?;

        for id in &plan.album_artist_refs {
            self.albums.modify(id, |album| album.artist_id = None);
        }
        for id in &plan.track_artist_refs {
            self.tracks.modify(id, |track| track.artist_id = None);
        }
        for id in &plan.track_album_refs {
            self.tracks.modify(id, |track| track.album_id = None);
        }
        if plan.in_favorites {
            self.favorites.discard(plan.kind, &plan.target);
        }

        let removed = match plan.kind {
            EntityKind::Artist => self.artists.remove(&plan.target).is_some(),
            EntityKind::Album => self.albums.remove(&plan.target).is_some(),
            EntityKind::Track => self.tracks.remove(&plan.target).is_some(),
        };
        debug_assert!(removed, "verified target must exist");

        Ok(plan.report())
    }
}
