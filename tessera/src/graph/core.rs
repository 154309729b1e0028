use ahash::AHashMap;

use crate::entity::storage::{
    AsStorage, AsStorageMut, Enumerate, Offset, OrderedStorage, Rekeying,
};
use crate::graph::corner::{Loop, LoopKey};
use crate::graph::edge::{Edge, EdgeKey};
use crate::graph::face::{Face, FaceKey};
use crate::graph::vertex::{Vertex, VertexKey};
use crate::graph::GraphError;

/// Canonical (unordered) vertex pair of an edge.
pub type Span = (VertexKey, VertexKey);

pub fn canonical_span(a: VertexKey, b: VertexKey) -> Span {
    if a <= b {
        (a, b)
    }
    else {
        (b, a)
    }
}

/// Raw storage of all entities in a graph.
///
/// A core owns storage for vertices, edges, loops, and faces together with an
/// index of edges by their canonical span. A core makes no promises about the
/// consistency of navigation between entities; see `MeshGraph` and
/// `Mutation`.
#[derive(Clone, Debug, Default)]
pub struct Core {
    vertices: OrderedStorage<Vertex>,
    edges: OrderedStorage<Edge>,
    loops: OrderedStorage<Loop>,
    faces: OrderedStorage<Face>,
    spans: AHashMap<Span, EdgeKey>,
}

impl Core {
    pub fn edge_by_span(&self, a: VertexKey, b: VertexKey) -> Option<EdgeKey> {
        self.spans.get(&canonical_span(a, b)).copied()
    }

    pub(in crate::graph) fn insert_span(&mut self, span: Span, key: EdgeKey) -> Option<EdgeKey> {
        self.spans.insert(canonical_span(span.0, span.1), key)
    }

    /// Rebuilds the span index from edge storage.
    ///
    /// # Errors
    ///
    /// Returns an error if more than one edge connects the same pair of
    /// vertices.
    pub(in crate::graph) fn reindex_spans(&mut self) -> Result<(), GraphError> {
        let mut spans = AHashMap::with_capacity(self.edges.len());
        for (key, edge) in self.edges.iter() {
            let (a, b) = edge.vertices;
            if spans.insert(canonical_span(a, b), key).is_some() {
                return Err(GraphError::DuplicateEdge);
            }
        }
        self.spans = spans;
        Ok(())
    }

    /// Moves the entities of another core into this core.
    ///
    /// Every key in `other` is translated by the high-water marks of this
    /// core, so no key in the output collides and no key is reused. References
    /// held by the entities of `other` are translated consistently.
    ///
    /// # Errors
    ///
    /// Returns an error if the translated keys are not representable.
    pub(in crate::graph) fn merge(mut self, other: Core) -> Result<Core, GraphError> {
        let offsets = CoreOffsets::checked(&self, &other)?;
        let Core {
            vertices,
            edges,
            loops,
            faces,
            ..
        } = other;
        self.vertices.append(vertices.rekey_by(&offsets));
        self.edges.append(edges.rekey_by(&offsets));
        self.loops.append(loops.rekey_by(&offsets));
        self.faces.append(faces.rekey_by(&offsets));
        self.reindex_spans()?;
        Ok(self)
    }
}

impl AsStorage<Vertex> for Core {
    fn as_storage(&self) -> &OrderedStorage<Vertex> {
        &self.vertices
    }
}

impl AsStorage<Edge> for Core {
    fn as_storage(&self) -> &OrderedStorage<Edge> {
        &self.edges
    }
}

impl AsStorage<Loop> for Core {
    fn as_storage(&self) -> &OrderedStorage<Loop> {
        &self.loops
    }
}

impl AsStorage<Face> for Core {
    fn as_storage(&self) -> &OrderedStorage<Face> {
        &self.faces
    }
}

impl AsStorageMut<Vertex> for Core {
    fn as_storage_mut(&mut self) -> &mut OrderedStorage<Vertex> {
        &mut self.vertices
    }
}

impl AsStorageMut<Edge> for Core {
    fn as_storage_mut(&mut self) -> &mut OrderedStorage<Edge> {
        &mut self.edges
    }
}

impl AsStorageMut<Loop> for Core {
    fn as_storage_mut(&mut self) -> &mut OrderedStorage<Loop> {
        &mut self.loops
    }
}

impl AsStorageMut<Face> for Core {
    fn as_storage_mut(&mut self) -> &mut OrderedStorage<Face> {
        &mut self.faces
    }
}

/// Per-entity key offsets used to merge one core into another.
#[derive(Clone, Copy, Debug)]
pub(in crate::graph) struct CoreOffsets {
    vertices: Offset,
    edges: Offset,
    loops: Offset,
    faces: Offset,
}

impl CoreOffsets {
    fn checked(target: &Core, source: &Core) -> Result<Self, GraphError> {
        fn offset(target: u32, source: u32) -> Result<Offset, GraphError> {
            target
                .checked_add(source)
                .filter(|sum| *sum < u32::MAX)
                .map(|_| Offset::new(target))
                .ok_or(GraphError::IndexOverflow)
        }
        Ok(CoreOffsets {
            vertices: offset(
                target.vertices.high_water_mark(),
                source.vertices.high_water_mark(),
            )?,
            edges: offset(
                target.edges.high_water_mark(),
                source.edges.high_water_mark(),
            )?,
            loops: offset(
                target.loops.high_water_mark(),
                source.loops.high_water_mark(),
            )?,
            faces: offset(
                target.faces.high_water_mark(),
                source.faces.high_water_mark(),
            )?,
        })
    }
}

impl Rekeying<VertexKey> for CoreOffsets {
    fn rekey(&self, key: VertexKey) -> VertexKey {
        self.vertices.rekey(key)
    }
}

impl Rekeying<EdgeKey> for CoreOffsets {
    fn rekey(&self, key: EdgeKey) -> EdgeKey {
        self.edges.rekey(key)
    }
}

impl Rekeying<LoopKey> for CoreOffsets {
    fn rekey(&self, key: LoopKey) -> LoopKey {
        self.loops.rekey(key)
    }
}

impl Rekeying<FaceKey> for CoreOffsets {
    fn rekey(&self, key: FaceKey) -> FaceKey {
        self.faces.rekey(key)
    }
}

/// Rekeying over every kind of graph key.
pub trait GraphRekeying:
    Rekeying<VertexKey> + Rekeying<EdgeKey> + Rekeying<LoopKey> + Rekeying<FaceKey>
{
}

impl<R> GraphRekeying for R where
    R: Rekeying<VertexKey> + Rekeying<EdgeKey> + Rekeying<LoopKey> + Rekeying<FaceKey>
{
}
