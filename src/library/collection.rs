//! Keyed store of one record kind.
//!
//! Records are owned by the collection and kept in insertion order. A name
//! index enforces per-kind name uniqueness without scanning.

use super::error::{LibraryError, LibraryResult};
use super::id::EntityId;
use super::models::Entity;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct Collection<T: Entity> {
    records: HashMap<EntityId, T>,
    names: HashMap<String, EntityId>,
    order: Vec<EntityId>,
}

impl<T: Entity> Default for Collection<T> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            names: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T: Entity> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&T> {
        self.records.get(id)
    }

    /// Like `get`, but absent records are a `NotFound` error.
    pub fn require(&self, id: &EntityId) -> LibraryResult<&T> {
        self.records
            .get(id)
            .ok_or_else(|| LibraryError::not_found(T::KIND, id))
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn list(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    /// Fails with `DuplicateName` if a record other than `except` holds `name`.
    pub fn ensure_name_available(&self, name: &str, except: Option<&EntityId>) -> LibraryResult<()> {
        match self.names.get(name) {
            Some(holder) if Some(holder) != except => Err(LibraryError::DuplicateName {
                kind: T::KIND,
                name: name.to_string(),
            }),
            _ => Ok(()),
        }
    }

    pub fn insert(&mut self, record: T) -> LibraryResult<()> {
        self.ensure_name_available(record.name(), None)?;
        let id = record.id();
        self.names.insert(record.name().to_string(), id);
        self.order.push(id);
        self.records.insert(id, record);
        Ok(())
    }

    /// Applies `f` to the record in place, keeping the name index in sync.
    /// Returns false if there is no such record.
    ///
    /// `f` must not change the record's id.
    pub fn modify<F: FnOnce(&mut T)>(&mut self, id: &EntityId, f: F) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        let old_name = record.name().to_string();
        f(record);
        debug_assert_eq!(record.id(), *id);
        if record.name() != old_name {
            self.names.remove(&old_name);
            self.names.insert(record.name().to_string(), *id);
        }
        true
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<T> {
        let record = self.records.remove(id)?;
        self.names.remove(record.name());
        self.order.retain(|x| x != id);
        Some(record)
    }

    /// Ids of the records matching `predicate`, in insertion order.
    pub fn ids_where<P: Fn(&T) -> bool>(&self, predicate: P) -> Vec<EntityId> {
        self.iter()
            .filter(|r| predicate(r))
            .map(|r| r.id())
            .collect()
    }
}
