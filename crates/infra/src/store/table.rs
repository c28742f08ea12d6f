use std::collections::HashMap;
use std::sync::RwLock;

use lendgate_core::Entity;

use super::StoreError;

/// In-memory keyed table for tests/dev.
///
/// Guards are held only for the duration of a single call.
#[derive(Debug)]
pub struct InMemoryTable<E: Entity> {
    inner: RwLock<HashMap<E::Id, E>>,
}

impl<E: Entity> InMemoryTable<E> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<E: Entity> Default for InMemoryTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

impl<E> InMemoryTable<E>
where
    E: Entity + Clone,
{
    pub fn get(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(id).cloned())
    }

    pub fn find(&self, pred: impl Fn(&E) -> bool) -> Result<Option<E>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().find(|e| pred(e)).cloned())
    }

    pub fn list(&self) -> Result<Vec<E>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }

    /// Insert unless an existing record satisfies `conflicts` (checked under the
    /// same write guard).
    pub fn insert_unique(&self, entity: E, conflicts: impl Fn(&E) -> bool) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(entity.id()) || map.values().any(|e| conflicts(e)) {
            return Err(StoreError::Duplicate(format!("{:?}", entity.id())));
        }
        map.insert(*entity.id(), entity);
        Ok(())
    }

    /// Replace an existing record. Returns `false` without inserting when the id
    /// is absent.
    pub fn update(&self, entity: E) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.get_mut(entity.id()) {
            Some(slot) => {
                *slot = entity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn remove(&self, id: &E::Id) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(id).is_some())
    }
}
