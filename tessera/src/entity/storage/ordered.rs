use std::collections::BTreeMap;

use crate::entity::storage::rekey::{Rekey, Rekeying};
use crate::entity::storage::{Enumerate, Get, Insert, InsertWithKey, Key};
use crate::entity::{Entity, EntityError};

/// Arena of entities ordered by key.
///
/// Keys are allocated from a high-water mark that only ever increases, so a
/// key is never reused within the lifetime of the storage (even if the
/// storage is later merged with another). Iteration is in ascending key order,
/// which is also allocation order.
///
/// The largest `u32` is reserved so that the high-water mark itself is always
/// representable.
#[derive(Clone, Debug)]
pub struct OrderedStorage<E>
where
    E: Entity,
{
    inner: BTreeMap<E::Key, E>,
    next: u32,
}

impl<E> OrderedStorage<E>
where
    E: Entity,
{
    /// Gets the high-water mark of the storage.
    ///
    /// This is one more than the largest key ever allocated (or zero).
    pub fn high_water_mark(&self) -> u32 {
        self.next
    }

    /// Moves all entities into new keys given by a rekeying and rekeys any
    /// references held by the entities themselves.
    pub fn rekey_by<R>(self, rekeying: &R) -> Self
    where
        E: Rekey<R>,
        R: Rekeying<E::Key>,
    {
        let OrderedStorage { inner, next } = self;
        let inner: BTreeMap<_, _> = inner
            .into_iter()
            .map(|(key, mut entity)| {
                entity.rekey(rekeying);
                (rekeying.rekey(key), entity)
            })
            .collect();
        let next = inner
            .keys()
            .next_back()
            .map(|key| key.into_index().saturating_add(1))
            .unwrap_or(0)
            .max(rekeying.rekey(E::Key::from_index(next)).into_index());
        OrderedStorage { inner, next }
    }

    /// Moves all entities of another storage into this storage.
    ///
    /// The keys of the two storages must be disjoint; an entity in `other`
    /// replaces any entity in `self` with the same key.
    pub fn append(&mut self, other: Self) {
        let OrderedStorage { inner, next } = other;
        self.inner.extend(inner);
        self.next = self.next.max(next);
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &E> {
        self.inner.values()
    }

    pub fn values_mut(&mut self) -> impl ExactSizeIterator<Item = &mut E> {
        self.inner.values_mut()
    }
}

impl<E> Default for OrderedStorage<E>
where
    E: Entity,
{
    fn default() -> Self {
        OrderedStorage {
            inner: BTreeMap::new(),
            next: 0,
        }
    }
}

impl<E> PartialEq for OrderedStorage<E>
where
    E: Entity + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<E> Enumerate<E> for OrderedStorage<E>
where
    E: Entity,
{
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn iter<'a>(&'a self) -> Box<dyn 'a + Iterator<Item = (E::Key, &'a E)>> {
        Box::new(self.inner.iter().map(|(key, entity)| (*key, entity)))
    }
}

impl<E> Get<E> for OrderedStorage<E>
where
    E: Entity,
{
    fn get(&self, key: &E::Key) -> Option<&E> {
        self.inner.get(key)
    }

    fn get_mut(&mut self, key: &E::Key) -> Option<&mut E> {
        self.inner.get_mut(key)
    }
}

impl<E> Insert<E> for OrderedStorage<E>
where
    E: Entity,
{
    fn insert(&mut self, entity: E) -> Result<E::Key, EntityError> {
        if self.next == u32::MAX {
            return Err(EntityError::KeyExhausted);
        }
        let key = E::Key::from_index(self.next);
        self.next += 1;
        self.inner.insert(key, entity);
        Ok(key)
    }
}

impl<E> InsertWithKey<E> for OrderedStorage<E>
where
    E: Entity,
{
    fn insert_with_key(&mut self, key: &E::Key, entity: E) -> Result<Option<E>, EntityError> {
        let index = key.into_index();
        if index == u32::MAX {
            return Err(EntityError::KeyExhausted);
        }
        self.next = self.next.max(index + 1);
        Ok(self.inner.insert(*key, entity))
    }
}
