//! Encodings of mesh graphs.
//!
//! This module provides two encodings of [`MeshGraph`]s and the assembly of
//! graphs from fragments decoded independently.
//!
//! | Module     | Representation              | Lossless topology |
//! |------------|-----------------------------|-------------------|
//! | `fan`      | Triangle fan index stream   | Faces only        |
//! | `binary`   | Little-endian byte buffers  | Yes               |
//!
//! The `fan` encoding flattens each face into a fan of triangles around an
//! _anchor_ vertex. It is consumed by triangle-only pipelines and can be
//! decoded back into the original faces, because consecutive faces never share
//! an anchor. The `binary` encoding serializes every entity and all navigation
//! (including non-manifold radial rings) into named sub-buffers described by a
//! [`BufferLayout`].
//!
//! [`BufferLayout`]: crate::encoding::binary::BufferLayout
//! [`MeshGraph`]: crate::graph::MeshGraph

pub mod assembly;
pub mod binary;
pub mod fan;

use thiserror::Error;

use crate::buffer::BufferError;
use crate::graph::{FaceKey, GraphError};

/// Errors concerning encodings.
#[derive(Debug, Error, PartialEq)]
pub enum EncodingError {
    /// A face cannot be given an anchor that differs from the anchor of the
    /// previous face.
    #[error("anchor of face {face:?} conflicts with the previous face")]
    AnchorConflict { face: FaceKey },
    /// A byte range computed for a field exceeds its buffer.
    #[error("buffer truncated in field `{field}`: expected {expected} bytes, but got {actual}")]
    TruncatedBuffer {
        field: String,
        expected: usize,
        actual: usize,
    },
    #[error("required field `{field}` not found")]
    MissingRequiredField { field: String },
    /// An attribute has inconsistent arity across elements.
    #[error("conflicting attribute in field `{field}`")]
    AttributeConflict { field: String },
    /// An index or key refers to an element that does not exist.
    #[error("invalid index")]
    InvalidIndex,
    #[error(transparent)]
    Graph(GraphError),
    #[error(transparent)]
    Buffer(BufferError),
}

impl From<GraphError> for EncodingError {
    fn from(error: GraphError) -> Self {
        match error {
            GraphError::InvalidIndex => EncodingError::InvalidIndex,
            error => EncodingError::Graph(error),
        }
    }
}

impl From<BufferError> for EncodingError {
    fn from(error: BufferError) -> Self {
        match error {
            BufferError::IndexOutOfBounds => EncodingError::InvalidIndex,
            error => EncodingError::Buffer(error),
        }
    }
}
