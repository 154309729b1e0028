//! Linear representation of triangle meshes.
//!
//! This module provides a `MeshBuffer` that represents a triangulated mesh as a
//! flat _index buffer_ and a _position buffer_. Every three consecutive indices
//! form a triangle and each index refers to a position. This layout is consumed
//! directly by graphics pipelines and is the carrier of the triangle fan
//! encoding (see the `encoding::fan` module).
//!
//! Index buffers contain no explicit polygon boundaries. A `MeshBuffer` only
//! guarantees that its indices are aligned to triangles and are in bounds.
//!
//! # Examples
//!
//! ```rust
//! use tessera::buffer::MeshBuffer;
//! use tessera::prelude::*;
//!
//! let buffer = MeshBuffer::from_raw_buffers(
//!     vec![0u32, 1, 2, 0, 2, 3],
//!     vec![
//!         [0.0, 0.0, 0.0],
//!         [1.0, 0.0, 0.0],
//!         [1.0, 1.0, 0.0],
//!         [0.0, 1.0, 0.0],
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(2, buffer.triangles().count());
//! ```

use num::{NumCast, Unsigned};
use std::fmt::Debug;
use thiserror::Error;

use crate::geometry::Position;

#[derive(Debug, Error, PartialEq)]
pub enum BufferError {
    #[error("index into position data out of bounds")]
    IndexOutOfBounds,
    #[error("index overflow")]
    IndexOverflow,
    #[error("index buffer conflicts with arity")]
    IndexUnaligned,
}

pub trait FromRawBuffers<N, G>: Sized {
    type Error: Debug;

    fn from_raw_buffers<I, J>(indices: I, vertices: J) -> Result<Self, Self::Error>
    where
        I: IntoIterator<Item = N>,
        J: IntoIterator<Item = G>;
}

pub trait FromRawBuffersWithArity<N, G>: Sized {
    type Error: Debug;

    fn from_raw_buffers_with_arity<I, J>(
        indices: I,
        vertices: J,
        arity: usize,
    ) -> Result<Self, Self::Error>
    where
        I: IntoIterator<Item = N>,
        J: IntoIterator<Item = G>;
}

/// Flat triangle index buffer and position buffer.
///
/// The number of indices is always a multiple of three and every index is
/// less than the number of positions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffer {
    indices: Vec<u32>,
    positions: Vec<Position>,
}

impl MeshBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_raw_buffers_unchecked(indices: Vec<u32>, positions: Vec<Position>) -> Self {
        MeshBuffer { indices, positions }
    }

    pub fn into_raw_buffers(self) -> (Vec<u32>, Vec<Position>) {
        let MeshBuffer { indices, positions } = self;
        (indices, positions)
    }

    pub fn as_index_slice(&self) -> &[u32] {
        self.indices.as_slice()
    }

    pub fn as_position_slice(&self) -> &[Position] {
        self.positions.as_slice()
    }

    /// Gets an iterator over the triangles in the index buffer.
    pub fn triangles(&self) -> impl '_ + ExactSizeIterator<Item = [u32; 3]> {
        self.indices
            .chunks_exact(3)
            .map(|triangle| [triangle[0], triangle[1], triangle[2]])
    }

    /// Appends the contents of another buffer.
    ///
    /// The indices of `buffer` are offset by the number of positions in this
    /// buffer, so the appended triangles refer to the appended positions. The
    /// vertex ranges of the two buffers are disjoint, so no triangle of one
    /// buffer shares an index with a triangle of the other.
    ///
    /// # Errors
    ///
    /// Returns an error if an offset index cannot be represented.
    pub fn append(&mut self, buffer: MeshBuffer) -> Result<(), BufferError> {
        let MeshBuffer { indices, positions } = buffer;
        let offset = u32::try_from(self.positions.len()).map_err(|_| BufferError::IndexOverflow)?;
        let indices = indices
            .into_iter()
            .map(|index| index.checked_add(offset).ok_or(BufferError::IndexOverflow))
            .collect::<Result<Vec<_>, _>>()?;
        self.indices.extend(indices);
        self.positions.extend(positions);
        Ok(())
    }
}

impl<M> FromRawBuffers<M, Position> for MeshBuffer
where
    M: Copy + NumCast + Unsigned,
{
    type Error = BufferError;

    /// Creates a `MeshBuffer` from raw index and position buffers.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of indices is not a multiple of three or
    /// an index is out of bounds.
    fn from_raw_buffers<I, J>(indices: I, positions: J) -> Result<Self, BufferError>
    where
        I: IntoIterator<Item = M>,
        J: IntoIterator<Item = Position>,
    {
        let indices = indices
            .into_iter()
            .map(|index| <u32 as NumCast>::from(index).ok_or(BufferError::IndexOverflow))
            .collect::<Result<Vec<_>, _>>()?;
        if indices.len() % 3 != 0 {
            return Err(BufferError::IndexUnaligned);
        }
        let positions: Vec<_> = positions.into_iter().collect();
        if indices
            .iter()
            .any(|index| *index as usize >= positions.len())
        {
            Err(BufferError::IndexOutOfBounds)
        }
        else {
            Ok(MeshBuffer { indices, positions })
        }
    }
}
