use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Deref;

use crate::entity::storage::{AsStorage, Get};
use crate::entity::Entity;

pub trait ClosedView {
    type Key;
    type Entity: Entity<Key = Self::Key>;

    fn key(&self) -> Self::Key;
}

/// Immutable binding of storage and a key.
///
/// A `View` always refers to an entity that is present in its storage. Views
/// are only ever constructed against storage that cannot be mutated while the
/// view is alive, so dereferencing never fails.
pub struct View<'a, M, E>
where
    M: AsStorage<E>,
    E: Entity,
{
    storage: &'a M,
    key: E::Key,
}

impl<'a, M, E> View<'a, M, E>
where
    M: AsStorage<E>,
    E: Entity,
{
    pub fn bind(storage: &'a M, key: E::Key) -> Option<Self> {
        storage
            .as_storage()
            .contains_key(&key)
            .then(|| View::bind_unchecked(storage, key))
    }

    pub(crate) fn bind_unchecked(storage: &'a M, key: E::Key) -> Self {
        View { storage, key }
    }

    /// Binds another key into the same storage.
    pub fn rebind<T>(&self, key: T::Key) -> Option<View<'a, M, T>>
    where
        M: AsStorage<T>,
        T: Entity,
    {
        View::bind(self.storage, key)
    }

    pub fn key(&self) -> E::Key {
        self.key
    }

    pub fn storage(&self) -> &'a M {
        self.storage
    }

    pub fn entity(&self) -> &'a E {
        self.storage
            .as_storage()
            .get(&self.key)
            .expect("view key invalidated")
    }
}

impl<'a, M, E> Clone for View<'a, M, E>
where
    M: AsStorage<E>,
    E: Entity,
{
    fn clone(&self) -> Self {
        View {
            storage: self.storage,
            key: self.key,
        }
    }
}

impl<'a, M, E> Copy for View<'a, M, E>
where
    M: AsStorage<E>,
    E: Entity,
{
}

impl<'a, M, E> ClosedView for View<'a, M, E>
where
    M: AsStorage<E>,
    E: Entity,
{
    type Key = E::Key;
    type Entity = E;

    fn key(&self) -> Self::Key {
        self.key
    }
}

impl<'a, M, E> Debug for View<'a, M, E>
where
    M: AsStorage<E>,
    E: Debug + Entity,
{
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("View")
            .field("key", &self.key)
            .field("entity", self.entity())
            .finish()
    }
}

impl<'a, M, E> Deref for View<'a, M, E>
where
    M: AsStorage<E>,
    E: Entity,
{
    type Target = E;

    fn deref(&self) -> &Self::Target {
        self.entity()
    }
}

impl<'a, M, E> Eq for View<'a, M, E>
where
    M: AsStorage<E>,
    E: Entity,
{
}

impl<'a, M, E> Hash for View<'a, M, E>
where
    M: AsStorage<E>,
    E: Entity,
{
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.key.hash(state);
    }
}

impl<'a, M, E> PartialEq for View<'a, M, E>
where
    M: AsStorage<E>,
    E: Entity,
{
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
