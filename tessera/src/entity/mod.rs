pub mod storage;
pub mod view;

use thiserror::Error;

use crate::entity::storage::Key;

#[derive(Debug, Error, PartialEq)]
pub enum EntityError {
    #[error("required entity not found")]
    EntityNotFound,
    #[error("key space exhausted")]
    KeyExhausted,
}

/// Topological entity owned by an arena.
///
/// Entities refer to one another only by key, never by reference. This allows
/// circular navigation (rings around faces and edges) without cyclic
/// ownership.
pub trait Entity: 'static + Clone + Sized {
    type Key: Key + 'static;
}
