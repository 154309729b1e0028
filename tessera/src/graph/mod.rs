//! Polygonal mesh graph.
//!
//! This module provides a representation of polygonal meshes that supports
//! arbitrary polygons (n-gons) and non-manifold edges. A [`MeshGraph`] is
//! composed of four entities: _vertices_, _edges_, _loops_, and _faces_.
//!
//! An edge is undirected and connects exactly two distinct vertices. No two
//! edges connect the same pair of vertices. An edge may be shared by any number
//! of faces; an edge shared by more than two faces is _non-manifold_.
//!
//! A loop is a _corner_ of a face. Each loop binds a vertex, the edge that
//! leaves that vertex in the winding of the face, and the face itself. Loops
//! form two kinds of rings:
//!
//! - The _face ring_ of a face visits each of its corners in winding order
//!   (see [`LoopView::next_loop`]).
//! - The _radial ring_ of an edge visits each corner that leaves along that
//!   edge across all of its faces (see [`LoopView::radial_next_loop`]). The
//!   order of corners in a radial ring is the order in which they were
//!   created; there is no geometric ordering of faces around a non-manifold
//!   edge.
//!
//! Entities refer to one another only by key. Keys are allocated from a
//! counter per entity and are never reused within a graph, including when
//! graphs are merged.
//!
//! # Consistency
//!
//! A [`MeshGraph`] is always consistent: its rings are closed and agree with
//! the vertex, edge, and loop sequences of its faces. Topology can only be
//! changed through a [`Mutation`], which wires rings and validates the graph
//! when committed. Data that does not affect topology, such as positions and
//! attributes, can be modified directly.
//!
//! # Examples
//!
//! ```rust
//! use tessera::graph::MeshGraph;
//! use tessera::prelude::*;
//!
//! let graph = MeshGraph::from_raw_buffers(
//!     vec![vec![0u32, 1, 2], vec![1, 3, 2]],
//!     vec![
//!         [0.0, 0.0, 0.0],
//!         [1.0, 0.0, 0.0],
//!         [0.0, 1.0, 0.0],
//!         [1.0, 1.0, 0.0],
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(5, graph.edge_count());
//! assert_eq!(6, graph.loop_count());
//! ```

mod core;
mod corner;
pub mod data;
mod edge;
mod face;
mod mutation;
mod topology;
mod trace;
mod vertex;

use num::{NumCast, ToPrimitive, Unsigned};
use smallvec::SmallVec;
use thiserror::Error;

use crate::buffer::{FromRawBuffers, FromRawBuffersWithArity};
use crate::entity::storage::{AsStorage, AsStorageOf, Enumerate, Get, OrderedStorage};
use crate::entity::view::View;
use crate::entity::EntityError;
use crate::geometry::{Normal, Position};
use crate::graph::data::Attributes;
use crate::transact::Transact;

pub use crate::entity::view::ClosedView;
pub use crate::graph::corner::{Loop, LoopCirculator, LoopKey, LoopView};
pub use crate::graph::edge::{Edge, EdgeKey, EdgeView};
pub use crate::graph::face::{Face, FaceKey, FaceView};
pub use crate::graph::mutation::{EdgePolicy, Mutation};
pub use crate::graph::vertex::{Vertex, VertexKey, VertexView};

pub(crate) use crate::graph::core::Core;

/// Errors concerning [`MeshGraph`]s.
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    /// A face has fewer than three vertices or visits the same vertex twice in
    /// a row.
    #[error("degenerate face with arity {arity}")]
    DegenerateFace { arity: usize },
    /// An edge connects a vertex to itself.
    #[error("degenerate edge")]
    DegenerateEdge,
    #[error("duplicate edge")]
    DuplicateEdge,
    /// A key or index refers to an entity that does not exist.
    #[error("invalid index or key")]
    InvalidIndex,
    #[error("topology malformed")]
    TopologyMalformed,
    #[error("conflicting topology found")]
    TopologyConflict,
    /// The key space of an entity has been exhausted.
    #[error("index overflow")]
    IndexOverflow,
    #[error("conflicting arity; expected {expected}, but got {actual}")]
    ArityConflict { expected: usize, actual: usize },
}

impl From<EntityError> for GraphError {
    fn from(error: EntityError) -> Self {
        match error {
            EntityError::EntityNotFound => GraphError::InvalidIndex,
            EntityError::KeyExhausted => GraphError::IndexOverflow,
        }
    }
}

trait OptionExt<T> {
    fn expect_consistent(self) -> T;
}

impl<T> OptionExt<T> for Option<T> {
    fn expect_consistent(self) -> T {
        self.expect("internal error: graph consistency violated")
    }
}

/// Polygonal mesh of vertices, edges, loops, and faces.
///
/// See the [module documentation](crate::graph) for more information.
#[derive(Clone, Debug, Default)]
pub struct MeshGraph {
    core: Core,
}

impl MeshGraph {
    /// Creates an empty `MeshGraph`.
    pub fn new() -> Self {
        MeshGraph::default()
    }

    /// Constructs a graph from raw storage that has been wired externally,
    /// such as by a decoder.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage is not consistent.
    pub(crate) fn from_core(mut core: Core) -> Result<Self, GraphError> {
        core.reindex_spans()?;
        topology::validate(&core)?;
        Ok(MeshGraph { core })
    }

    pub(crate) fn into_core(self) -> Core {
        self.core
    }

    /// Begins a mutation of the graph.
    pub fn mutate(self) -> Mutation {
        Mutation::from(self)
    }

    pub fn vertex_count(&self) -> usize {
        self.as_storage_of::<Vertex>().len()
    }

    pub fn edge_count(&self) -> usize {
        self.as_storage_of::<Edge>().len()
    }

    pub fn loop_count(&self) -> usize {
        self.as_storage_of::<Loop>().len()
    }

    pub fn face_count(&self) -> usize {
        self.as_storage_of::<Face>().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0
    }

    /// Gets a view of the vertex with the given key.
    pub fn vertex(&self, key: VertexKey) -> Option<VertexView<'_>> {
        View::bind(self, key).map(From::from)
    }

    pub fn edge(&self, key: EdgeKey) -> Option<EdgeView<'_>> {
        View::bind(self, key).map(From::from)
    }

    // `loop` is a keyword.
    pub fn loop_(&self, key: LoopKey) -> Option<LoopView<'_>> {
        View::bind(self, key).map(From::from)
    }

    pub fn face(&self, key: FaceKey) -> Option<FaceView<'_>> {
        View::bind(self, key).map(From::from)
    }

    /// Gets an iterator of views over the vertices in the graph in key order.
    pub fn vertices(&self) -> impl '_ + Iterator<Item = VertexView<'_>> {
        self.as_storage_of::<Vertex>()
            .keys()
            .map(move |key| View::bind_unchecked(self, key))
            .map(From::from)
    }

    pub fn edges(&self) -> impl '_ + Iterator<Item = EdgeView<'_>> {
        self.as_storage_of::<Edge>()
            .keys()
            .map(move |key| View::bind_unchecked(self, key))
            .map(From::from)
    }

    pub fn loops(&self) -> impl '_ + Iterator<Item = LoopView<'_>> {
        self.as_storage_of::<Loop>()
            .keys()
            .map(move |key| View::bind_unchecked(self, key))
            .map(From::from)
    }

    pub fn faces(&self) -> impl '_ + Iterator<Item = FaceView<'_>> {
        self.as_storage_of::<Face>()
            .keys()
            .map(move |key| View::bind_unchecked(self, key))
            .map(From::from)
    }

    /// Gets the edge that connects the given vertices, if any.
    ///
    /// The order of the vertices is not significant.
    pub fn edge_between(&self, a: VertexKey, b: VertexKey) -> Option<EdgeView<'_>> {
        self.core.edge_by_span(a, b).and_then(|key| self.edge(key))
    }

    pub fn position_mut(&mut self, key: VertexKey) -> Option<&mut Position> {
        self.core
            .as_storage_mut_of::<Vertex>()
            .get_mut(&key)
            .map(|vertex| &mut vertex.position)
    }

    pub fn face_normal_mut(&mut self, key: FaceKey) -> Option<&mut Option<Normal>> {
        self.core
            .as_storage_mut_of::<Face>()
            .get_mut(&key)
            .map(|face| &mut face.normal)
    }

    pub fn vertex_attributes_mut(&mut self, key: VertexKey) -> Option<&mut Attributes> {
        self.core
            .as_storage_mut_of::<Vertex>()
            .get_mut(&key)
            .map(|vertex| &mut vertex.attributes)
    }

    pub fn edge_attributes_mut(&mut self, key: EdgeKey) -> Option<&mut Attributes> {
        self.core
            .as_storage_mut_of::<Edge>()
            .get_mut(&key)
            .map(|edge| &mut edge.attributes)
    }

    pub fn loop_attributes_mut(&mut self, key: LoopKey) -> Option<&mut Attributes> {
        self.core
            .as_storage_mut_of::<Loop>()
            .get_mut(&key)
            .map(|corner| &mut corner.attributes)
    }

    pub fn face_attributes_mut(&mut self, key: FaceKey) -> Option<&mut Attributes> {
        self.core
            .as_storage_mut_of::<Face>()
            .get_mut(&key)
            .map(|face| &mut face.attributes)
    }

    /// Merges another graph into this graph.
    ///
    /// Every key of `other` is translated past the high-water marks of this
    /// graph, so keys in the output never collide and are never reused. Keys
    /// of `self` are unchanged. The translation of the keys of `other` can be
    /// computed from the key counts of `self` before the merge.
    ///
    /// Edges are not shared between the two graphs, even if vertex positions
    /// coincide.
    ///
    /// # Errors
    ///
    /// Returns an error if the translated keys cannot be represented.
    pub fn merge(self, other: MeshGraph) -> Result<MeshGraph, GraphError> {
        let core = self.core.merge(other.core)?;
        Ok(MeshGraph { core })
    }

    /// Checks every topological invariant of the graph.
    ///
    /// A graph is always consistent, so this only fails if an internal
    /// invariant has been violated. It is exposed for diagnostics and tests.
    pub fn validate(&self) -> Result<(), GraphError> {
        topology::validate(&self.core)
    }
}

impl AsStorage<Vertex> for MeshGraph {
    fn as_storage(&self) -> &OrderedStorage<Vertex> {
        self.core.as_storage()
    }
}

impl AsStorage<Edge> for MeshGraph {
    fn as_storage(&self) -> &OrderedStorage<Edge> {
        self.core.as_storage()
    }
}

impl AsStorage<Loop> for MeshGraph {
    fn as_storage(&self) -> &OrderedStorage<Loop> {
        self.core.as_storage()
    }
}

impl AsStorage<Face> for MeshGraph {
    fn as_storage(&self) -> &OrderedStorage<Face> {
        self.core.as_storage()
    }
}

impl PartialEq for MeshGraph {
    /// Compares graphs structurally: keys, navigation, and the bit patterns of
    /// positions, normals, and attributes must be identical.
    fn eq(&self, other: &Self) -> bool {
        self.as_storage_of::<Vertex>() == other.as_storage_of::<Vertex>()
            && self.as_storage_of::<Edge>() == other.as_storage_of::<Edge>()
            && self.as_storage_of::<Loop>() == other.as_storage_of::<Loop>()
            && self.as_storage_of::<Face>() == other.as_storage_of::<Face>()
    }
}

impl<P, N> FromRawBuffers<P, Position> for MeshGraph
where
    P: IntoIterator<Item = N>,
    N: Copy + NumCast + ToPrimitive + Unsigned,
{
    type Error = GraphError;

    /// Creates a graph from a buffer of polygons and a buffer of positions.
    ///
    /// Each polygon is a sequence of indices into the positions.
    ///
    /// # Errors
    ///
    /// Returns an error if an index is out of bounds or a polygon is
    /// degenerate.
    fn from_raw_buffers<I, J>(indices: I, positions: J) -> Result<Self, Self::Error>
    where
        I: IntoIterator<Item = P>,
        J: IntoIterator<Item = Position>,
    {
        let (graph, ()) = Mutation::default().commit_with(|mutation| {
            let vertices = insert_positions(mutation, positions)?;
            for polygon in indices {
                let perimeter = polygon
                    .into_iter()
                    .map(|index| lookup(&vertices, index))
                    .collect::<Result<SmallVec<[_; 4]>, _>>()?;
                mutation.add_face(perimeter, Attributes::new())?;
            }
            Ok::<_, GraphError>(())
        })?;
        Ok(graph)
    }
}

impl<N> FromRawBuffersWithArity<N, Position> for MeshGraph
where
    N: Copy + NumCast + ToPrimitive + Unsigned,
{
    type Error = GraphError;

    /// Creates a graph from a flat buffer of indices with a constant arity and
    /// a buffer of positions.
    ///
    /// # Errors
    ///
    /// Returns an error if the arity is less than three, the number of indices
    /// is not a multiple of the arity, an index is out of bounds, or a polygon
    /// is degenerate.
    fn from_raw_buffers_with_arity<I, J>(
        indices: I,
        positions: J,
        arity: usize,
    ) -> Result<Self, Self::Error>
    where
        I: IntoIterator<Item = N>,
        J: IntoIterator<Item = Position>,
    {
        if arity < 3 {
            return Err(GraphError::DegenerateFace { arity });
        }
        let indices = indices.into_iter().collect::<Vec<_>>();
        if indices.len() % arity != 0 {
            return Err(GraphError::ArityConflict {
                expected: arity,
                actual: indices.len() % arity,
            });
        }
        MeshGraph::from_raw_buffers(indices.chunks(arity).map(|chunk| chunk.to_vec()), positions)
    }
}

fn insert_positions<J>(mutation: &mut Mutation, positions: J) -> Result<Vec<VertexKey>, GraphError>
where
    J: IntoIterator<Item = Position>,
{
    positions
        .into_iter()
        .map(|position| mutation.add_vertex(position, Attributes::new()))
        .collect()
}

fn lookup<N>(vertices: &[VertexKey], index: N) -> Result<VertexKey, GraphError>
where
    N: NumCast + ToPrimitive,
{
    <usize as NumCast>::from(index)
        .and_then(|index| vertices.get(index))
        .copied()
        .ok_or(GraphError::InvalidIndex)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use crate::buffer::{FromRawBuffers, FromRawBuffersWithArity};
    use crate::entity::storage::Key;
    use crate::graph::data::{name, Attribute};
    use crate::graph::{GraphError, MeshGraph, VertexKey};

    fn quad() -> MeshGraph {
        MeshGraph::from_raw_buffers_with_arity(
            vec![0u32, 1, 2, 3],
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            4,
        )
        .unwrap()
    }

    #[test]
    fn quad_topology() {
        let graph = quad();

        assert_eq!(4, graph.vertex_count());
        assert_eq!(4, graph.edge_count());
        assert_eq!(4, graph.loop_count());
        assert_eq!(1, graph.face_count());
        let face = graph.faces().next().unwrap();
        assert_eq!(4, face.arity());
        assert_eq!(4, face.loops().count());
        assert!(graph.edges().all(|edge| edge.is_boundary()));
        for (i, j) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
            assert!(graph
                .edge_between(VertexKey::from_index(i), VertexKey::from_index(j))
                .is_some());
        }
        assert!(graph
            .edge_between(VertexKey::from_index(0), VertexKey::from_index(2))
            .is_none());
        graph.validate().unwrap();
    }

    #[test]
    fn shared_edge_between_triangles() {
        let graph = MeshGraph::from_raw_buffers(
            vec![vec![0u32, 1, 2], vec![1, 2, 3]],
            vec![[0.0, 0.0, 0.0]; 4],
        )
        .unwrap();

        assert_eq!(5, graph.edge_count());
        let edge = graph
            .edge_between(VertexKey::from_index(1), VertexKey::from_index(2))
            .unwrap();
        let faces = graph.faces().map(|face| face.key()).collect::<Vec<_>>();
        assert_eq!(faces.as_slice(), edge.face_keys());
        assert_eq!(2, edge.loops().count());
        let corner = edge.loops().next().unwrap();
        assert_eq!(corner.key(), corner.radial_next_loop().radial_next_loop().key());
        assert_ne!(corner.key(), corner.radial_next_loop().key());
    }

    #[test]
    fn non_manifold_edge() {
        let graph = MeshGraph::from_raw_buffers(
            vec![vec![0u32, 1, 2], vec![1, 0, 3], vec![0, 1, 4]],
            vec![[0.0, 0.0, 0.0]; 5],
        )
        .unwrap();

        let edge = graph
            .edge_between(VertexKey::from_index(0), VertexKey::from_index(1))
            .unwrap();
        assert!(edge.is_non_manifold());
        assert_eq!(3, edge.face_keys().len());
        let corners = edge.loops().map(|corner| corner.key()).collect::<Vec<_>>();
        assert_eq!(3, corners.len());
        // Radial order is creation order.
        assert!(corners.windows(2).all(|pair| pair[0] < pair[1]));
        let corner = edge.loops().next().unwrap();
        let mut walk = corner;
        for _ in 0..3 {
            walk = walk.radial_next_loop();
        }
        assert_eq!(corner.key(), walk.key());
        assert_eq!(
            corner.key(),
            corner.radial_previous_loop().radial_next_loop().key()
        );
        graph.validate().unwrap();
    }

    #[test]
    fn adjacent_faces_and_vertices() {
        let graph = MeshGraph::from_raw_buffers(
            vec![vec![0u32, 1, 2], vec![1, 3, 2], vec![2, 3, 4]],
            vec![[0.0, 0.0, 0.0]; 5],
        )
        .unwrap();

        let face = graph.faces().nth(1).unwrap();
        assert_eq!(2, face.adjacent_faces().count());
        let vertex = graph.vertex(VertexKey::from_index(2)).unwrap();
        assert_eq!(4, vertex.valence());
        assert_eq!(4, vertex.adjacent_vertices().count());
    }

    #[test]
    fn degenerate_and_invalid_polygons() {
        assert_eq!(
            Err(GraphError::DegenerateFace { arity: 2 }),
            MeshGraph::from_raw_buffers(vec![vec![0u32, 1]], vec![[0.0; 3]; 2])
        );
        assert_eq!(
            Err(GraphError::DegenerateFace { arity: 3 }),
            MeshGraph::from_raw_buffers(vec![vec![0u32, 1, 1]], vec![[0.0; 3]; 2])
        );
        assert_eq!(
            Err(GraphError::InvalidIndex),
            MeshGraph::from_raw_buffers(vec![vec![0u32, 1, 7]], vec![[0.0; 3]; 3])
        );
        assert_eq!(
            Err(GraphError::ArityConflict {
                expected: 3,
                actual: 1,
            }),
            MeshGraph::from_raw_buffers_with_arity(vec![0u32, 1, 2, 0], vec![[0.0; 3]; 3], 3)
        );
    }

    #[test]
    fn merge_translates_keys() {
        let graph = quad().merge(quad()).unwrap();

        assert_eq!(8, graph.vertex_count());
        assert_eq!(8, graph.edge_count());
        assert_eq!(2, graph.face_count());
        let face = graph.faces().nth(1).unwrap();
        assert_eq!(
            vec![4, 5, 6, 7],
            face.vertex_keys()
                .iter()
                .map(|key| key.into_index())
                .collect::<Vec<_>>()
        );
        assert!(face
            .loops()
            .all(|corner| corner.face().key() == face.key() && corner.edge().is_boundary()));
        graph.validate().unwrap();
    }

    #[test]
    fn face_normal() {
        let mut graph = quad();
        let key = graph.faces().next().unwrap().key();
        let normal = graph.face(key).unwrap().normal().unwrap();

        assert_abs_diff_eq!(1.0, normal[2]);
        *graph.face_normal_mut(key).unwrap() = Some([0.0, 0.0, -1.0]);
        assert_eq!(Some([0.0, 0.0, -1.0]), graph.face(key).unwrap().normal());
    }

    #[test]
    fn attributes_are_mutable_without_mutation() {
        let mut graph = quad();
        let key = graph.vertices().next().unwrap().key();
        graph
            .vertex_attributes_mut(key)
            .unwrap()
            .insert(name::CREASE.to_owned(), Attribute::Scalar(1.0));
        *graph.position_mut(key).unwrap() = [2.0, 0.0, 0.0];

        let vertex = graph.vertex(key).unwrap();
        assert_eq!(Some(&Attribute::Scalar(1.0)), vertex.attributes.get(name::CREASE));
        assert_eq!(&[2.0, 0.0, 0.0], vertex.position());
    }
}
