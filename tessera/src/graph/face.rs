use derivative::Derivative;
use itertools::Itertools;
use smallvec::SmallVec;
use std::ops::Deref;

use crate::entity::storage::{rekey, Key, Rekey};
use crate::entity::view::{ClosedView, View};
use crate::entity::Entity;
use crate::geometry::{self, Normal};
use crate::graph::core::GraphRekeying;
use crate::graph::corner::{LoopCirculator, LoopKey};
use crate::graph::data::Attributes;
use crate::graph::edge::{Edge, EdgeKey, EdgeView};
use crate::graph::vertex::{Vertex, VertexKey, VertexView};
use crate::graph::{MeshGraph, OptionExt as _};

/// Face entity.
///
/// The vertex, edge, and loop sequences of a face are index-aligned: `edges[i]`
/// connects `vertices[i]` and `vertices[i + 1]` (wrapping) and `loops[i]` is
/// the corner at `vertices[i]`. The order of `vertices` is the winding of the
/// face.
#[derive(Derivative)]
#[derivative(Clone, Debug, PartialEq)]
pub struct Face {
    pub(crate) vertices: SmallVec<[VertexKey; 4]>,
    pub(crate) edges: SmallVec<[EdgeKey; 4]>,
    pub(crate) loops: SmallVec<[LoopKey; 4]>,
    #[derivative(PartialEq(compare_with = "crate::geometry::normal_bit_eq"))]
    pub normal: Option<Normal>,
    #[derivative(
        Debug = "ignore",
        PartialEq(compare_with = "crate::graph::data::attributes_bit_eq")
    )]
    pub attributes: Attributes,
}

impl Face {
    pub(crate) fn new(
        vertices: SmallVec<[VertexKey; 4]>,
        edges: SmallVec<[EdgeKey; 4]>,
        attributes: Attributes,
    ) -> Self {
        Face {
            vertices,
            edges,
            loops: SmallVec::new(),
            normal: None,
            attributes,
        }
    }

    pub fn arity(&self) -> usize {
        self.vertices.len()
    }
}

impl Entity for Face {
    type Key = FaceKey;
}

impl<R> Rekey<R> for Face
where
    R: GraphRekeying,
{
    fn rekey(&mut self, rekeying: &R) {
        for vertex in self.vertices.iter_mut() {
            *vertex = rekey(rekeying, *vertex);
        }
        for edge in self.edges.iter_mut() {
            *edge = rekey(rekeying, *edge);
        }
        for corner in self.loops.iter_mut() {
            *corner = rekey(rekeying, *corner);
        }
    }
}

/// Face key.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FaceKey(u32);

impl Key for FaceKey {
    fn from_index(index: u32) -> Self {
        FaceKey(index)
    }

    fn into_index(self) -> u32 {
        self.0
    }
}

/// View of a face in a graph.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FaceView<'a> {
    inner: View<'a, MeshGraph, Face>,
}

impl<'a> FaceView<'a> {
    pub fn key(&self) -> FaceKey {
        self.inner.key()
    }

    pub fn vertex_keys(&self) -> &'a [VertexKey] {
        self.inner.entity().vertices.as_slice()
    }

    pub fn edge_keys(&self) -> &'a [EdgeKey] {
        self.inner.entity().edges.as_slice()
    }

    pub fn loop_keys(&self) -> &'a [LoopKey] {
        self.inner.entity().loops.as_slice()
    }

    /// Gets a circulator over the corners of the face in winding order.
    pub fn loops(&self) -> LoopCirculator<'a> {
        LoopCirculator::face(self.inner.storage(), self.loop_keys().first().copied())
    }

    pub fn vertices(&self) -> impl 'a + Clone + Iterator<Item = VertexView<'a>> {
        let inner = self.inner;
        self.vertex_keys().iter().map(move |key| {
            inner
                .rebind::<Vertex>(*key)
                .map(VertexView::from)
                .expect_consistent()
        })
    }

    pub fn edges(&self) -> impl 'a + Clone + Iterator<Item = EdgeView<'a>> {
        let inner = self.inner;
        self.edge_keys().iter().map(move |key| {
            inner
                .rebind::<Edge>(*key)
                .map(EdgeView::from)
                .expect_consistent()
        })
    }

    /// Gets an iterator over the distinct faces that share an edge with the
    /// face.
    pub fn adjacent_faces(&self) -> impl 'a + Iterator<Item = FaceView<'a>> {
        let key = self.key();
        self.edges()
            .flat_map(|edge| edge.faces())
            .filter(move |face| face.key() != key)
            .unique_by(|face| face.key())
    }

    /// Gets the normal of the face.
    ///
    /// If the face has no stored normal, then the normal is computed from the
    /// positions of its vertices. Returns `None` if neither is available.
    pub fn normal(&self) -> Option<Normal> {
        self.inner.entity().normal.or_else(|| {
            geometry::newell_normal(self.vertices().map(|vertex| *vertex.position()))
        })
    }
}

impl<'a> ClosedView for FaceView<'a> {
    type Key = FaceKey;
    type Entity = Face;

    fn key(&self) -> Self::Key {
        self.inner.key()
    }
}

impl<'a> Deref for FaceView<'a> {
    type Target = Face;

    fn deref(&self) -> &Self::Target {
        self.inner.entity()
    }
}

impl<'a> From<View<'a, MeshGraph, Face>> for FaceView<'a> {
    fn from(inner: View<'a, MeshGraph, Face>) -> Self {
        FaceView { inner }
    }
}
