//! **Tessera** is a library for polygonal mesh topology.
//!
//! Meshes are represented by a [`MeshGraph`] of vertices, edges, face corners
//! (loops), and faces that supports arbitrary polygons and non-manifold edges.
//! Graphs can be encoded as triangle fans for triangle-only pipelines and
//! decoded back into their original polygons, or losslessly encoded into
//! little-endian byte buffers for storage in asset containers.
//!
//! Please note that versions in the `0.0.*` series are experimental and
//! unstable! Use exact version constraints when specifying a dependency to
//! avoid spurious breakage.
//!
//! [`MeshGraph`]: crate::graph::MeshGraph
#![allow(unknown_lints)] // Allow clippy lints.

pub mod buffer;
pub mod encoding;
pub mod entity;
pub mod geometry;
pub mod graph;
pub mod transact;

pub use crate::geometry::{Normal, Position};

pub mod prelude {
    //! Re-exports commonly used types and traits.
    //!
    //! Importing the contents of this module is recommended, as constructing
    //! and encoding graphs is expressed mostly through traits.

    pub use crate::buffer::{FromRawBuffers as _, FromRawBuffersWithArity as _};
    pub use crate::encoding::binary::{FromBuffer as _, ToBuffer as _};
    pub use crate::encoding::fan::{FromTriangleFan as _, ToTriangleFan as _};
    pub use crate::transact::Transact as _;
    pub use crate::IteratorExt as _;
}

/// Extension methods for types implementing [`Iterator`].
pub trait IteratorExt: Iterator + Sized {
    /// Provides an iterator over a window of duplets that includes the first
    /// value in the sequence at the beginning and end of the iteration.
    ///
    /// Given a collection of ordered elements $\\{a, b, c\\}$, this iterator
    /// yields the ordered items $\\{(a, b), (b, c), (c, a)\\}$. This is the
    /// sequence of edges of a polygon with the given vertices.
    fn perimeter(self) -> Perimeter<Self>
    where
        Self::Item: Clone;
}

impl<I> IteratorExt for I
where
    I: Iterator,
{
    fn perimeter(self) -> Perimeter<I>
    where
        I::Item: Clone,
    {
        Perimeter::new(self)
    }
}

/// Iterator that produces a window of duplets over its input.
///
/// See [`IteratorExt::perimeter`].
pub struct Perimeter<I>
where
    I: Iterator,
    I::Item: Clone,
{
    input: I,
    first: Option<I::Item>,
    previous: Option<I::Item>,
}

impl<I> Perimeter<I>
where
    I: Iterator,
    I::Item: Clone,
{
    fn new(mut input: I) -> Self {
        let first = input.next();
        let previous = first.clone();
        Perimeter {
            input,
            first,
            previous,
        }
    }
}

impl<I> Iterator for Perimeter<I>
where
    I: Iterator,
    I::Item: Clone,
{
    type Item = (I::Item, I::Item);

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.input.next();
        match (self.previous.take(), next.or_else(|| self.first.take())) {
            (Some(a), Some(b)) => {
                self.previous = Some(b.clone());
                Some((a, b))
            }
            _ => None,
        }
    }
}
