use derivative::Derivative;
use smallvec::SmallVec;
use std::ops::Deref;

use crate::entity::storage::{rekey, Key, Rekey};
use crate::entity::view::{ClosedView, View};
use crate::entity::Entity;
use crate::graph::core::GraphRekeying;
use crate::graph::corner::{LoopCirculator, LoopKey};
use crate::graph::data::Attributes;
use crate::graph::face::{Face, FaceKey, FaceView};
use crate::graph::vertex::{Vertex, VertexKey, VertexView};
use crate::graph::{MeshGraph, OptionExt as _};

/// Edge entity.
///
/// An edge always connects exactly two distinct vertices. The pair is stored
/// in the order in which the edge was first created, but is otherwise
/// unordered: no two edges share the same pair of vertices in either order.
#[derive(Derivative)]
#[derivative(Clone, Debug, PartialEq)]
pub struct Edge {
    pub(crate) vertices: (VertexKey, VertexKey),
    /// Faces incident to the edge, one entry per corner that leaves along the
    /// edge. More than two entries indicates a non-manifold edge.
    pub(crate) faces: SmallVec<[FaceKey; 2]>,
    #[derivative(
        Debug = "ignore",
        PartialEq(compare_with = "crate::graph::data::attributes_bit_eq")
    )]
    pub attributes: Attributes,
}

impl Edge {
    pub(crate) fn new(vertices: (VertexKey, VertexKey), attributes: Attributes) -> Self {
        Edge {
            vertices,
            faces: SmallVec::new(),
            attributes,
        }
    }

    pub(crate) fn has_vertex(&self, key: VertexKey) -> bool {
        self.vertices.0 == key || self.vertices.1 == key
    }

    pub(crate) fn connects(&self, a: VertexKey, b: VertexKey) -> bool {
        self.vertices == (a, b) || self.vertices == (b, a)
    }
}

impl Entity for Edge {
    type Key = EdgeKey;
}

impl<R> Rekey<R> for Edge
where
    R: GraphRekeying,
{
    fn rekey(&mut self, rekeying: &R) {
        let (a, b) = self.vertices;
        self.vertices = (rekey(rekeying, a), rekey(rekeying, b));
        for face in self.faces.iter_mut() {
            *face = rekey(rekeying, *face);
        }
    }
}

/// Edge key.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct EdgeKey(u32);

impl Key for EdgeKey {
    fn from_index(index: u32) -> Self {
        EdgeKey(index)
    }

    fn into_index(self) -> u32 {
        self.0
    }
}

/// View of an edge in a graph.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct EdgeView<'a> {
    inner: View<'a, MeshGraph, Edge>,
}

impl<'a> EdgeView<'a> {
    pub fn key(&self) -> EdgeKey {
        self.inner.key()
    }

    pub fn vertex_keys(&self) -> (VertexKey, VertexKey) {
        self.inner.entity().vertices
    }

    pub fn face_keys(&self) -> &'a [FaceKey] {
        self.inner.entity().faces.as_slice()
    }

    pub fn vertices(&self) -> (VertexView<'a>, VertexView<'a>) {
        let (a, b) = self.vertex_keys();
        (self.bind_vertex(a), self.bind_vertex(b))
    }

    /// Gets an iterator over the faces incident to the edge.
    ///
    /// A face that uses the edge more than once appears once per use.
    pub fn faces(&self) -> impl 'a + Clone + Iterator<Item = FaceView<'a>> {
        let inner = self.inner;
        self.face_keys().iter().map(move |key| {
            inner
                .rebind::<Face>(*key)
                .map(FaceView::from)
                .expect_consistent()
        })
    }

    /// Gets a circulator over the radial cycle of corners around the edge.
    ///
    /// The circulator is empty if the edge is not part of any face.
    pub fn loops(&self) -> LoopCirculator<'a> {
        LoopCirculator::radial(self.inner.storage(), self.first_loop())
    }

    /// Gets the vertex opposite the given vertex.
    ///
    /// Returns `None` if the given vertex is not connected by the edge.
    pub fn opposite_vertex(&self, key: VertexKey) -> Option<VertexView<'a>> {
        match self.vertex_keys() {
            (a, b) if a == key => Some(self.bind_vertex(b)),
            (a, b) if b == key => Some(self.bind_vertex(a)),
            _ => None,
        }
    }

    /// Returns `true` if the edge is incident to exactly one face.
    pub fn is_boundary(&self) -> bool {
        self.face_keys().len() == 1
    }

    /// Returns `true` if the edge is incident to at most two faces.
    pub fn is_manifold(&self) -> bool {
        self.face_keys().len() <= 2
    }

    pub fn is_non_manifold(&self) -> bool {
        !self.is_manifold()
    }

    fn bind_vertex(&self, key: VertexKey) -> VertexView<'a> {
        self.inner
            .rebind::<Vertex>(key)
            .map(VertexView::from)
            .expect_consistent()
    }

    fn first_loop(&self) -> Option<LoopKey> {
        let key = self.key();
        let face = self.face_keys().first()?;
        let face = self.inner.rebind::<Face>(*face).expect_consistent();
        face.edges
            .iter()
            .zip(face.loops.iter())
            .find(|(edge, _)| **edge == key)
            .map(|(_, corner)| *corner)
    }
}

impl<'a> ClosedView for EdgeView<'a> {
    type Key = EdgeKey;
    type Entity = Edge;

    fn key(&self) -> Self::Key {
        self.inner.key()
    }
}

impl<'a> Deref for EdgeView<'a> {
    type Target = Edge;

    fn deref(&self) -> &Self::Target {
        self.inner.entity()
    }
}

impl<'a> From<View<'a, MeshGraph, Edge>> for EdgeView<'a> {
    fn from(inner: View<'a, MeshGraph, Edge>) -> Self {
        EdgeView { inner }
    }
}
