use crate::entity::storage::Key;

/// Mapping from keys to new keys.
///
/// A rekeying must be injective over the keys it is applied to.
pub trait Rekeying<K>
where
    K: Key,
{
    fn rekey(&self, key: K) -> K;
}

/// Entity that holds references (keys) that must follow a rekeying.
pub trait Rekey<R> {
    fn rekey(&mut self, rekeying: &R);
}

/// Rekeying that translates every key by a fixed offset.
///
/// The offset is not checked against overflow when applied. Code that
/// constructs an `Offset` must ensure that every key it is applied to remains
/// representable, such as by checking the high-water mark of the storage.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Offset(u32);

impl Offset {
    pub fn new(offset: u32) -> Self {
        Offset(offset)
    }
}

impl<K> Rekeying<K> for Offset
where
    K: Key,
{
    fn rekey(&self, key: K) -> K {
        K::from_index(key.into_index() + self.0)
    }
}

/// Applies a rekeying to a key.
///
/// This is useful in generic code where a rekeying is bounded by `Rekeying`
/// for more than one key type and method syntax would be ambiguous.
pub fn rekey<R, K>(rekeying: &R, key: K) -> K
where
    R: Rekeying<K>,
    K: Key,
{
    rekeying.rekey(key)
}
