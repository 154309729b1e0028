//! Triangle fan encoding.
//!
//! This encoding flattens each face of a graph into a _triangle fan_: a face
//! with vertices $\\{a, v_1, \ldots, v_{n-1}\\}$ (rotated so that its _anchor_
//! $a$ comes first) is emitted as the $n - 2$ triangles
//! $(a, v_1, v_2), (a, v_2, v_3), \ldots, (a, v_{n-2}, v_{n-1})$.
//!
//! The resulting index stream has no explicit face boundaries. Instead, the
//! encoder guarantees two properties:
//!
//! 1. The triangles of a face form a _continuous_ fan: each triangle shares
//!    its anchor and its second index with the anchor and third index of the
//!    previous triangle.
//! 2. Consecutive faces never share an anchor.
//!
//! The decoder therefore extends an open face with a triangle $(x, y, w)$ if
//! and only if $x$ is the anchor of the open face and $y$ is the third index
//! of its last triangle. Otherwise, a new face begins. Because the first
//! triangle of a face always begins with a different anchor, this rule
//! recovers every encoded face exactly, starting at its anchor. This also
//! holds for faces that visit a vertex more than once.
//!
//! Faces are encoded in key order and vertices are indexed by their rank in
//! key order.
//!
//! # Examples
//!
//! ```rust
//! use tessera::encoding::fan::{FromTriangleFan, ToTriangleFan};
//! use tessera::graph::MeshGraph;
//! use tessera::prelude::*;
//!
//! let graph = MeshGraph::from_raw_buffers_with_arity(
//!     vec![0u32, 1, 2, 3],
//!     vec![
//!         [0.0, 0.0, 0.0],
//!         [1.0, 0.0, 0.0],
//!         [1.0, 1.0, 0.0],
//!         [0.0, 1.0, 0.0],
//!     ],
//!     4,
//! )
//! .unwrap();
//! let buffer = graph.to_triangle_fan().unwrap();
//! assert_eq!(&[0, 1, 2, 0, 2, 3], buffer.as_index_slice());
//!
//! let graph = MeshGraph::from_triangle_fan(&buffer).unwrap();
//! assert_eq!(1, graph.face_count());
//! assert_eq!(4, graph.edge_count());
//! ```

use ahash::AHashMap;
use itertools::Itertools;
use log::{debug, trace};
use smallvec::SmallVec;

use crate::buffer::MeshBuffer;
use crate::encoding::EncodingError;
use crate::graph::data::Attributes;
use crate::graph::{GraphError, MeshGraph, Mutation, VertexKey};
use crate::transact::Transact;

/// Vertex indices of a face decoded from a fan.
pub type Polygon = SmallVec<[u32; 4]>;

/// Selection of the anchor of each face.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AnchorPolicy {
    /// Anchors each face at its vertex with the least index. If that vertex is
    /// the anchor of the previous face, then the vertex with the next least
    /// index is used instead.
    Minimum,
    /// Anchors each face at its first vertex. There is no fallback: if the
    /// first vertex is the anchor of the previous face, then encoding fails.
    ///
    /// Decoded faces begin at their anchor, so re-encoding a decoded graph
    /// with this policy reproduces the decoded index stream exactly.
    Leading,
}

impl Default for AnchorPolicy {
    fn default() -> Self {
        AnchorPolicy::Minimum
    }
}

/// Triangle fan encoder.
#[derive(Clone, Copy, Debug, Default)]
pub struct FanEncoder {
    policy: AnchorPolicy,
}

impl FanEncoder {
    pub fn new(policy: AnchorPolicy) -> Self {
        FanEncoder { policy }
    }

    pub fn policy(&self) -> AnchorPolicy {
        self.policy
    }

    /// Encodes a graph into a triangle fan index buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the anchor of a face cannot differ from the anchor
    /// of the previous face.
    pub fn encode(&self, graph: &MeshGraph) -> Result<MeshBuffer, EncodingError> {
        let ranks = graph
            .vertices()
            .enumerate()
            .map(|(rank, vertex)| {
                u32::try_from(rank)
                    .map(|rank| (vertex.key(), rank))
                    .map_err(|_| GraphError::IndexOverflow)
            })
            .collect::<Result<AHashMap<_, _>, _>>()?;
        let positions = graph
            .vertices()
            .map(|vertex| *vertex.position())
            .collect::<Vec<_>>();
        let mut indices = Vec::with_capacity(graph.loop_count() * 3);
        let mut previous = None;
        for face in graph.faces() {
            let polygon = face
                .vertex_keys()
                .iter()
                .map(|key| rank(&ranks, *key))
                .collect::<Polygon>();
            if polygon.len() < 3 {
                return Err(GraphError::DegenerateFace {
                    arity: polygon.len(),
                }
                .into());
            }
            let start = self
                .anchor(&polygon, previous)
                .ok_or(EncodingError::AnchorConflict { face: face.key() })?;
            let anchor = polygon[start];
            let n = polygon.len();
            for i in 1..(n - 1) {
                indices.extend_from_slice(&[
                    anchor,
                    polygon[(start + i) % n],
                    polygon[(start + i + 1) % n],
                ]);
            }
            previous = Some(anchor);
        }
        debug!(
            "encoded {} faces into {} triangles over {} vertices",
            graph.face_count(),
            indices.len() / 3,
            positions.len(),
        );
        Ok(MeshBuffer::from_raw_buffers_unchecked(indices, positions))
    }

    /// Gets the position in a polygon of its anchor.
    fn anchor(&self, polygon: &[u32], previous: Option<u32>) -> Option<usize> {
        let position = |index: u32| polygon.iter().position(|vertex| *vertex == index);
        match self.policy {
            AnchorPolicy::Leading => (Some(polygon[0]) != previous).then(|| 0),
            AnchorPolicy::Minimum => {
                let mut candidates = polygon.iter().copied().sorted().dedup();
                let minimum = candidates.next()?;
                if Some(minimum) != previous {
                    position(minimum)
                }
                else {
                    let fallback = candidates.next()?;
                    trace!(
                        "anchor {} conflicts with previous face; using {}",
                        minimum,
                        fallback,
                    );
                    position(fallback)
                }
            }
        }
    }
}

fn rank(ranks: &AHashMap<VertexKey, u32>, key: VertexKey) -> u32 {
    *ranks
        .get(&key)
        .expect("internal error: graph consistency violated")
}

/// Encodes a graph into a triangle fan index buffer with the default anchor
/// policy.
pub fn encode(graph: &MeshGraph) -> Result<MeshBuffer, EncodingError> {
    FanEncoder::default().encode(graph)
}

/// Partitions a triangle index stream into polygons.
///
/// A triangle $(x, y, w)$ extends the open polygon if $x$ is its first index
/// and $y$ is its last index. Otherwise, the open polygon is closed and a new
/// polygon $\\{x, y, w\\}$ is opened. Triangles that do not form a
/// continuous fan therefore yield separate polygons. Any trailing indices that
/// do not form a triangle are ignored.
pub fn partition(indices: &[u32]) -> Vec<Polygon> {
    let mut polygons: Vec<Polygon> = Vec::with_capacity(indices.len() / 3);
    for triangle in indices.chunks_exact(3) {
        let (x, y, w) = (triangle[0], triangle[1], triangle[2]);
        match polygons.last_mut() {
            Some(polygon) if polygon[0] == x && polygon.last() == Some(&y) => {
                polygon.push(w);
            }
            _ => {
                polygons.push(Polygon::from_slice(&[x, y, w]));
            }
        }
    }
    polygons
}

/// Decodes a triangle fan index buffer into a graph.
///
/// Every position becomes a vertex, including positions that are not referred
/// to by any triangle, and vertex keys are allocated in position order.
///
/// # Errors
///
/// Returns an error if a decoded polygon is degenerate, such as a triangle that
/// refers to the same vertex more than once in a row.
pub fn decode(buffer: &MeshBuffer) -> Result<MeshGraph, EncodingError> {
    let polygons = partition(buffer.as_index_slice());
    let (graph, ()) = Mutation::default().commit_with(|mutation| {
        let vertices = buffer
            .as_position_slice()
            .iter()
            .map(|position| mutation.add_vertex(*position, Attributes::new()))
            .collect::<Result<Vec<_>, _>>()?;
        for polygon in polygons.iter() {
            trace!("decoded polygon {:?}", polygon);
            let perimeter = polygon
                .iter()
                .map(|index| {
                    vertices
                        .get(*index as usize)
                        .copied()
                        .ok_or(GraphError::InvalidIndex)
                })
                .collect::<Result<SmallVec<[_; 4]>, _>>()?;
            mutation.add_face(perimeter, Attributes::new())?;
        }
        Ok::<_, GraphError>(())
    })?;
    debug!(
        "decoded {} triangles into {} faces",
        buffer.as_index_slice().len() / 3,
        graph.face_count(),
    );
    Ok(graph)
}

pub trait ToTriangleFan {
    fn to_triangle_fan(&self) -> Result<MeshBuffer, EncodingError> {
        self.to_triangle_fan_with(FanEncoder::default())
    }

    fn to_triangle_fan_with(&self, encoder: FanEncoder) -> Result<MeshBuffer, EncodingError>;
}

pub trait FromTriangleFan: Sized {
    fn from_triangle_fan(buffer: &MeshBuffer) -> Result<Self, EncodingError>;
}

impl ToTriangleFan for MeshGraph {
    fn to_triangle_fan_with(&self, encoder: FanEncoder) -> Result<MeshBuffer, EncodingError> {
        encoder.encode(self)
    }
}

impl FromTriangleFan for MeshGraph {
    fn from_triangle_fan(buffer: &MeshBuffer) -> Result<Self, EncodingError> {
        decode(buffer)
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use crate::buffer::{FromRawBuffers, FromRawBuffersWithArity, MeshBuffer};
    use crate::encoding::fan::{
        self, AnchorPolicy, FanEncoder, FromTriangleFan, Polygon, ToTriangleFan,
    };
    use crate::encoding::EncodingError;
    use crate::entity::storage::Key;
    use crate::graph::{FaceKey, GraphError, MeshGraph, VertexKey};

    fn positions(n: usize) -> Vec<[f32; 3]> {
        (0..n).map(|i| [i as f32, 0.0, 0.0]).collect()
    }

    // Gets the lexicographically least rotation of a polygon.
    fn canonical(polygon: &[u32]) -> Vec<u32> {
        (0..polygon.len())
            .map(|start| {
                polygon[start..]
                    .iter()
                    .chain(polygon[..start].iter())
                    .copied()
                    .collect::<Vec<_>>()
            })
            .min()
            .unwrap()
    }

    fn faces(graph: &MeshGraph) -> Vec<Vec<u32>> {
        graph
            .faces()
            .map(|face| {
                canonical(
                    &face
                        .vertex_keys()
                        .iter()
                        .map(|key| key.into_index())
                        .collect::<Vec<_>>(),
                )
            })
            .sorted()
            .collect()
    }

    fn assert_round_trip(polygons: Vec<Vec<u32>>, n: usize) {
        let graph = MeshGraph::from_raw_buffers(polygons, positions(n)).unwrap();
        let buffer = graph.to_triangle_fan().unwrap();
        let decoded = MeshGraph::from_triangle_fan(&buffer).unwrap();

        assert_eq!(faces(&graph), faces(&decoded));
        assert_eq!(graph.edge_count(), decoded.edge_count());
        decoded.validate().unwrap();
        // Decoded faces begin at their anchors.
        let reencoded = decoded
            .to_triangle_fan_with(FanEncoder::new(AnchorPolicy::Leading))
            .unwrap();
        assert_eq!(buffer, reencoded);
    }

    #[test]
    fn encode_quad() {
        let graph =
            MeshGraph::from_raw_buffers_with_arity(vec![0u32, 1, 2, 3], positions(4), 4).unwrap();
        let buffer = fan::encode(&graph).unwrap();

        assert_eq!(&[0, 1, 2, 0, 2, 3], buffer.as_index_slice());
    }

    #[test]
    fn decode_quad() {
        let buffer = MeshBuffer::from_raw_buffers(vec![0u32, 1, 2, 0, 2, 3], positions(4)).unwrap();
        let graph = fan::decode(&buffer).unwrap();

        assert_eq!(1, graph.face_count());
        assert_eq!(4, graph.edge_count());
        let face = graph.faces().next().unwrap();
        assert_eq!(
            vec![0, 1, 2, 3],
            face.vertex_keys()
                .iter()
                .map(|key| key.into_index())
                .collect::<Vec<_>>()
        );
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
            assert!(graph
                .edge_between(VertexKey::from_index(a), VertexKey::from_index(b))
                .is_some());
        }
    }

    #[test]
    fn decode_adjacent_triangles() {
        let buffer = MeshBuffer::from_raw_buffers(vec![0u32, 1, 2, 1, 2, 3], positions(4)).unwrap();
        let graph = fan::decode(&buffer).unwrap();

        assert_eq!(2, graph.face_count());
        assert_eq!(5, graph.edge_count());
        let edge = graph
            .edge_between(VertexKey::from_index(1), VertexKey::from_index(2))
            .unwrap();
        assert_eq!(&[FaceKey::from_index(0), FaceKey::from_index(1)], edge.face_keys());
        assert_eq!(2, edge.loops().count());
    }

    #[test]
    fn anchor_falls_back_to_next_least_vertex() {
        let graph =
            MeshGraph::from_raw_buffers(vec![vec![0u32, 1, 2], vec![0, 2, 3]], positions(4))
                .unwrap();
        let buffer = fan::encode(&graph).unwrap();

        assert_eq!(&[0, 1, 2, 2, 3, 0], buffer.as_index_slice());
        assert_eq!(2, fan::decode(&buffer).unwrap().face_count());
    }

    #[test]
    fn leading_anchor_conflict() {
        let graph =
            MeshGraph::from_raw_buffers(vec![vec![0u32, 1, 2], vec![0, 2, 3]], positions(4))
                .unwrap();

        assert_eq!(
            Err(EncodingError::AnchorConflict {
                face: FaceKey::from_index(1),
            }),
            graph.to_triangle_fan_with(FanEncoder::new(AnchorPolicy::Leading))
        );
    }

    #[test]
    fn round_trip_mixed_polygons() {
        assert_round_trip(
            vec![
                vec![0, 1, 5, 4],
                vec![1, 2, 6, 5],
                vec![2, 3, 7, 6],
                vec![4, 5, 9, 10, 8],
                vec![5, 6, 9],
            ],
            11,
        );
    }

    #[test]
    fn round_trip_non_manifold_fan() {
        // Three faces share the edge (0, 1) and each begins at vertex 0.
        assert_round_trip(vec![vec![0, 1, 2], vec![0, 1, 3], vec![1, 0, 4]], 5);
    }

    #[test]
    fn round_trip_repeated_vertices() {
        // The second face visits vertex 2 twice and shares vertices with the
        // first face, whose anchor appears incidentally in the second.
        assert_round_trip(
            vec![vec![0, 1, 2, 3], vec![1, 0, 2, 4, 5, 2, 6], vec![0, 3, 2]],
            7,
        );
    }

    #[test]
    fn round_trip_repeated_least_vertex() {
        // The least rotation of the second face is not the rotation that
        // begins at the first occurrence of its least vertex.
        assert_round_trip(vec![vec![0, 7, 1, 0, 7], vec![2, 3, 4]], 8);
    }

    #[test]
    fn partition_maximal_fans() {
        assert_eq!(
            vec![
                Polygon::from_slice(&[0, 1, 2, 3, 4]),
                Polygon::from_slice(&[0, 1, 3]),
                Polygon::from_slice(&[1, 3, 5]),
                Polygon::from_slice(&[2, 3, 4]),
            ],
            fan::partition(&[0, 1, 2, 0, 2, 3, 0, 3, 4, 0, 1, 3, 1, 3, 5, 2, 3, 4, 7])
        );
    }

    #[test]
    fn decode_degenerate_triangle() {
        let buffer = MeshBuffer::from_raw_buffers(vec![0u32, 0, 1], positions(2)).unwrap();

        assert_eq!(
            Err(EncodingError::Graph(GraphError::DegenerateFace { arity: 3 })),
            fan::decode(&buffer)
        );
    }
}
