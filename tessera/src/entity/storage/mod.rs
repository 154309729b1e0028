mod ordered;
mod rekey;

use std::fmt::Debug;
use std::hash::Hash;

use crate::entity::{Entity, EntityError};

pub use crate::entity::storage::ordered::OrderedStorage;
pub use crate::entity::storage::rekey::{rekey, Offset, Rekey, Rekeying};

/// Opaque integer key.
///
/// Keys are allocated from a monotonically increasing counter and are never
/// reused within the lifetime of a storage. The ordering of keys is the
/// ordering of their allocation.
pub trait Key: Copy + Debug + Eq + Hash + Ord + Sized {
    fn from_index(index: u32) -> Self;

    fn into_index(self) -> u32;
}

pub trait Enumerate<E>
where
    E: Entity,
{
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gets an iterator over the keys and entities in ascending key order.
    fn iter<'a>(&'a self) -> Box<dyn 'a + Iterator<Item = (E::Key, &'a E)>>;

    fn keys<'a>(&'a self) -> Box<dyn 'a + Iterator<Item = E::Key>> {
        Box::new(self.iter().map(|(key, _)| key))
    }
}

pub trait Get<E>
where
    E: Entity,
{
    fn get(&self, key: &E::Key) -> Option<&E>;

    fn get_mut(&mut self, key: &E::Key) -> Option<&mut E>;

    fn contains_key(&self, key: &E::Key) -> bool {
        self.get(key).is_some()
    }
}

pub trait Insert<E>
where
    E: Entity,
{
    fn insert(&mut self, entity: E) -> Result<E::Key, EntityError>;
}

pub trait InsertWithKey<E>
where
    E: Entity,
{
    fn insert_with_key(&mut self, key: &E::Key, entity: E) -> Result<Option<E>, EntityError>;
}

pub trait AsStorage<E>
where
    E: Entity,
{
    fn as_storage(&self) -> &OrderedStorage<E>;
}

impl<'a, E, T> AsStorage<E> for &'a T
where
    E: Entity,
    T: AsStorage<E> + ?Sized,
{
    fn as_storage(&self) -> &OrderedStorage<E> {
        <T as AsStorage<E>>::as_storage(self)
    }
}

impl<'a, E, T> AsStorage<E> for &'a mut T
where
    E: Entity,
    T: AsStorage<E> + ?Sized,
{
    fn as_storage(&self) -> &OrderedStorage<E> {
        <T as AsStorage<E>>::as_storage(self)
    }
}

pub trait AsStorageMut<E>: AsStorage<E>
where
    E: Entity,
{
    fn as_storage_mut(&mut self) -> &mut OrderedStorage<E>;
}

impl<'a, E, T> AsStorageMut<E> for &'a mut T
where
    E: Entity,
    T: AsStorageMut<E> + ?Sized,
{
    fn as_storage_mut(&mut self) -> &mut OrderedStorage<E> {
        <T as AsStorageMut<E>>::as_storage_mut(self)
    }
}

pub trait AsStorageOf {
    fn as_storage_of<E>(&self) -> &OrderedStorage<E>
    where
        E: Entity,
        Self: AsStorage<E>,
    {
        self.as_storage()
    }

    fn as_storage_mut_of<E>(&mut self) -> &mut OrderedStorage<E>
    where
        E: Entity,
        Self: AsStorageMut<E>,
    {
        self.as_storage_mut()
    }
}

impl<T> AsStorageOf for T {}

#[cfg(test)]
mod tests {
    use crate::entity::storage::{
        Enumerate, Get, Insert, InsertWithKey, Key, Offset, OrderedStorage, Rekey, Rekeying,
    };
    use crate::entity::{Entity, EntityError};

    #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
    pub struct NodeKey(u32);

    impl Key for NodeKey {
        fn from_index(index: u32) -> Self {
            NodeKey(index)
        }

        fn into_index(self) -> u32 {
            self.0
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct Node {
        link: Option<NodeKey>,
    }

    impl Entity for Node {
        type Key = NodeKey;
    }

    impl<R> Rekey<R> for Node
    where
        R: Rekeying<NodeKey>,
    {
        fn rekey(&mut self, rekeying: &R) {
            self.link = self.link.map(|key| rekeying.rekey(key));
        }
    }

    #[test]
    fn insert_allocates_monotonic_keys() {
        let mut storage = OrderedStorage::<Node>::default();
        let a = storage.insert(Node { link: None }).unwrap();
        let b = storage.insert(Node { link: Some(a) }).unwrap();

        assert_eq!(NodeKey(0), a);
        assert_eq!(NodeKey(1), b);
        assert_eq!(2, storage.len());
        assert_eq!(2, storage.high_water_mark());
        assert_eq!(Some(a), storage.get(&b).unwrap().link);
    }

    #[test]
    fn insert_with_key_advances_high_water_mark() {
        let mut storage = OrderedStorage::<Node>::default();
        storage
            .insert_with_key(&NodeKey(7), Node { link: None })
            .unwrap();
        let key = storage.insert(Node { link: None }).unwrap();

        assert_eq!(NodeKey(8), key);
        assert_eq!(vec![NodeKey(7), NodeKey(8)], storage.keys().collect::<Vec<_>>());
    }

    #[test]
    fn insert_exhausted_key_space() {
        let mut storage = OrderedStorage::<Node>::default();
        storage
            .insert_with_key(&NodeKey(u32::MAX - 1), Node { link: None })
            .unwrap();

        assert_eq!(
            Err(EntityError::KeyExhausted),
            storage.insert(Node { link: None })
        );
    }

    #[test]
    fn rekey_by_offset() {
        let mut storage = OrderedStorage::<Node>::default();
        let a = storage.insert(Node { link: None }).unwrap();
        storage.insert(Node { link: Some(a) }).unwrap();
        let storage = storage.rekey_by(&Offset::new(10));

        assert_eq!(vec![NodeKey(10), NodeKey(11)], storage.keys().collect::<Vec<_>>());
        assert_eq!(Some(NodeKey(10)), storage.get(&NodeKey(11)).unwrap().link);
        assert_eq!(12, storage.high_water_mark());
    }
}
