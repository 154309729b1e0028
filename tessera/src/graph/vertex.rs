use derivative::Derivative;
use std::collections::BTreeSet;
use std::ops::Deref;

use crate::entity::storage::{rekey, Key, Rekey};
use crate::entity::view::{ClosedView, View};
use crate::entity::Entity;
use crate::geometry::Position;
use crate::graph::core::GraphRekeying;
use crate::graph::data::Attributes;
use crate::graph::edge::{Edge, EdgeKey, EdgeView};
use crate::graph::{MeshGraph, OptionExt as _};

/// Vertex entity.
#[derive(Derivative)]
#[derivative(Clone, Debug, PartialEq)]
pub struct Vertex {
    /// Position of the vertex.
    #[derivative(PartialEq(compare_with = "crate::geometry::bit_eq"))]
    pub position: Position,
    /// Incident edges.
    pub(crate) edges: BTreeSet<EdgeKey>,
    #[derivative(
        Debug = "ignore",
        PartialEq(compare_with = "crate::graph::data::attributes_bit_eq")
    )]
    pub attributes: Attributes,
}

impl Vertex {
    pub(crate) fn new(position: Position, attributes: Attributes) -> Self {
        Vertex {
            position,
            edges: BTreeSet::new(),
            attributes,
        }
    }
}

impl Entity for Vertex {
    type Key = VertexKey;
}

impl<R> Rekey<R> for Vertex
where
    R: GraphRekeying,
{
    fn rekey(&mut self, rekeying: &R) {
        self.edges = self.edges.iter().map(|ab| rekey(rekeying, *ab)).collect();
    }
}

/// Vertex key.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct VertexKey(u32);

impl Key for VertexKey {
    fn from_index(index: u32) -> Self {
        VertexKey(index)
    }

    fn into_index(self) -> u32 {
        self.0
    }
}

/// View of a vertex in a graph.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct VertexView<'a> {
    inner: View<'a, MeshGraph, Vertex>,
}

impl<'a> VertexView<'a> {
    pub fn key(&self) -> VertexKey {
        self.inner.key()
    }

    pub fn position(&self) -> &'a Position {
        &self.inner.entity().position
    }

    /// Gets an iterator over the edges incident to the vertex.
    pub fn edges(&self) -> impl 'a + Clone + Iterator<Item = EdgeView<'a>> {
        let inner = self.inner;
        inner
            .entity()
            .edges
            .iter()
            .map(move |ab| {
                inner
                    .rebind::<Edge>(*ab)
                    .map(EdgeView::from)
                    .expect_consistent()
            })
    }

    /// Gets an iterator over the vertices that share an edge with the vertex.
    pub fn adjacent_vertices(&self) -> impl 'a + Clone + Iterator<Item = VertexView<'a>> {
        let key = self.key();
        self.edges()
            .map(move |edge| edge.opposite_vertex(key).expect_consistent())
    }

    /// Gets the number of edges incident to the vertex.
    pub fn valence(&self) -> usize {
        self.inner.entity().edges.len()
    }
}

impl<'a> ClosedView for VertexView<'a> {
    type Key = VertexKey;
    type Entity = Vertex;

    fn key(&self) -> Self::Key {
        self.inner.key()
    }
}

impl<'a> Deref for VertexView<'a> {
    type Target = Vertex;

    fn deref(&self) -> &Self::Target {
        self.inner.entity()
    }
}

impl<'a> From<View<'a, MeshGraph, Vertex>> for VertexView<'a> {
    fn from(inner: View<'a, MeshGraph, Vertex>) -> Self {
        VertexView { inner }
    }
}
