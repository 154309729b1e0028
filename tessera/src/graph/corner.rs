use derivative::Derivative;
use std::iter::FusedIterator;
use std::ops::Deref;

use crate::entity::storage::{rekey, AsStorageOf, Get, Key, Rekey};
use crate::entity::view::{ClosedView, View};
use crate::entity::Entity;
use crate::graph::core::GraphRekeying;
use crate::graph::data::Attributes;
use crate::graph::edge::{Edge, EdgeKey, EdgeView};
use crate::graph::face::{Face, FaceKey, FaceView};
use crate::graph::trace::{Trace, TraceFirst};
use crate::graph::vertex::{Vertex, VertexKey, VertexView};
use crate::graph::{MeshGraph, OptionExt as _};

/// Corner of a face.
///
/// A loop binds a vertex, the edge leaving that vertex toward the next vertex
/// in the winding of its face, and the face itself. Every loop participates in
/// two rings: the ring of corners around its face (`next` and `prev`) and the
/// radial ring of corners around its edge (`radial_next` and `radial_prev`).
#[derive(Derivative)]
#[derivative(Clone, Debug, PartialEq)]
pub struct Loop {
    pub(crate) vertex: VertexKey,
    pub(crate) edge: EdgeKey,
    pub(crate) face: FaceKey,
    pub(crate) next: LoopKey,
    pub(crate) prev: LoopKey,
    pub(crate) radial_next: LoopKey,
    pub(crate) radial_prev: LoopKey,
    #[derivative(
        Debug = "ignore",
        PartialEq(compare_with = "crate::graph::data::attributes_bit_eq")
    )]
    pub attributes: Attributes,
}

impl Loop {
    /// Constructs a loop with no ring connectivity.
    ///
    /// The navigation keys of such a loop are placeholders until the rings are
    /// wired when a mutation is committed.
    pub(crate) fn detached(
        key: LoopKey,
        vertex: VertexKey,
        edge: EdgeKey,
        face: FaceKey,
        attributes: Attributes,
    ) -> Self {
        Loop {
            vertex,
            edge,
            face,
            next: key,
            prev: key,
            radial_next: key,
            radial_prev: key,
            attributes,
        }
    }
}

impl Entity for Loop {
    type Key = LoopKey;
}

impl<R> Rekey<R> for Loop
where
    R: GraphRekeying,
{
    fn rekey(&mut self, rekeying: &R) {
        self.vertex = rekey(rekeying, self.vertex);
        self.edge = rekey(rekeying, self.edge);
        self.face = rekey(rekeying, self.face);
        self.next = rekey(rekeying, self.next);
        self.prev = rekey(rekeying, self.prev);
        self.radial_next = rekey(rekeying, self.radial_next);
        self.radial_prev = rekey(rekeying, self.radial_prev);
    }
}

/// Loop key.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LoopKey(u32);

impl Key for LoopKey {
    fn from_index(index: u32) -> Self {
        LoopKey(index)
    }

    fn into_index(self) -> u32 {
        self.0
    }
}

/// View of a loop (face corner) in a graph.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct LoopView<'a> {
    inner: View<'a, MeshGraph, Loop>,
}

impl<'a> LoopView<'a> {
    pub fn key(&self) -> LoopKey {
        self.inner.key()
    }

    pub fn next_loop(&self) -> LoopView<'a> {
        self.bind_loop(self.inner.entity().next)
    }

    pub fn previous_loop(&self) -> LoopView<'a> {
        self.bind_loop(self.inner.entity().prev)
    }

    pub fn radial_next_loop(&self) -> LoopView<'a> {
        self.bind_loop(self.inner.entity().radial_next)
    }

    pub fn radial_previous_loop(&self) -> LoopView<'a> {
        self.bind_loop(self.inner.entity().radial_prev)
    }

    pub fn vertex(&self) -> VertexView<'a> {
        self.inner
            .rebind::<Vertex>(self.inner.entity().vertex)
            .map(VertexView::from)
            .expect_consistent()
    }

    pub fn edge(&self) -> EdgeView<'a> {
        self.inner
            .rebind::<Edge>(self.inner.entity().edge)
            .map(EdgeView::from)
            .expect_consistent()
    }

    pub fn face(&self) -> FaceView<'a> {
        self.inner
            .rebind::<Face>(self.inner.entity().face)
            .map(FaceView::from)
            .expect_consistent()
    }

    fn bind_loop(&self, key: LoopKey) -> LoopView<'a> {
        self.inner
            .rebind::<Loop>(key)
            .map(LoopView::from)
            .expect_consistent()
    }
}

impl<'a> ClosedView for LoopView<'a> {
    type Key = LoopKey;
    type Entity = Loop;

    fn key(&self) -> Self::Key {
        self.inner.key()
    }
}

impl<'a> Deref for LoopView<'a> {
    type Target = Loop;

    fn deref(&self) -> &Self::Target {
        self.inner.entity()
    }
}

impl<'a> From<View<'a, MeshGraph, Loop>> for LoopView<'a> {
    fn from(inner: View<'a, MeshGraph, Loop>) -> Self {
        LoopView { inner }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Ring {
    Face,
    Radial,
}

/// Iterator over a ring of loops.
///
/// The circulator visits each loop in a ring exactly once, starting from an
/// initial loop and following either face or radial connectivity.
#[derive(Clone, Debug)]
pub struct LoopCirculator<'a> {
    graph: &'a MeshGraph,
    key: Option<LoopKey>,
    trace: TraceFirst<LoopKey>,
    ring: Ring,
}

impl<'a> LoopCirculator<'a> {
    pub(in crate::graph) fn face(graph: &'a MeshGraph, key: Option<LoopKey>) -> Self {
        LoopCirculator::new(graph, key, Ring::Face)
    }

    pub(in crate::graph) fn radial(graph: &'a MeshGraph, key: Option<LoopKey>) -> Self {
        LoopCirculator::new(graph, key, Ring::Radial)
    }

    fn new(graph: &'a MeshGraph, key: Option<LoopKey>, ring: Ring) -> Self {
        LoopCirculator {
            graph,
            key,
            trace: Default::default(),
            ring,
        }
    }
}

impl<'a> FusedIterator for LoopCirculator<'a> {}

impl<'a> Iterator for LoopCirculator<'a> {
    type Item = LoopView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.key.take()?;
        if !self.trace.insert(key) {
            return None;
        }
        let entity = self.graph.as_storage_of::<Loop>().get(&key)?;
        self.key = Some(match self.ring {
            Ring::Face => entity.next,
            Ring::Radial => entity.radial_next,
        });
        Some(View::<MeshGraph, Loop>::bind_unchecked(self.graph, key).into())
    }
}
