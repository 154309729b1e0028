//! Topological mutation of graphs.

mod edge;
mod face;
mod vertex;

use log::trace;

use crate::entity::storage::{AsStorageOf, Enumerate};
use crate::graph::core::Core;
use crate::graph::edge::EdgeKey;
use crate::graph::face::Face;
use crate::graph::vertex::{Vertex, VertexKey};
use crate::graph::{topology, GraphError, MeshGraph};
use crate::transact::Transact;

pub use crate::graph::mutation::edge::EdgePolicy;

/// Topological mutation of a [`MeshGraph`].
///
/// A mutation accumulates entities without maintaining the rings that connect
/// them. Face rings and radial rings are wired when the mutation is committed,
/// because the radial ring of an edge depends on every face that shares it.
/// Committing then validates the complete graph, so a committed graph is
/// always consistent.
///
/// Dropping or aborting a mutation discards it. A mutation that has been begun
/// from an existing graph via [`MeshGraph::mutate`] consumes that graph.
///
/// # Examples
///
/// ```rust
/// use tessera::graph::{EdgePolicy, Mutation};
/// use tessera::graph::data::Attributes;
/// use tessera::prelude::*;
///
/// let mut mutation = Mutation::default();
/// let a = mutation.add_vertex([0.0, 0.0, 0.0], Attributes::new()).unwrap();
/// let b = mutation.add_vertex([1.0, 0.0, 0.0], Attributes::new()).unwrap();
/// let c = mutation.add_vertex([0.0, 1.0, 0.0], Attributes::new()).unwrap();
/// mutation.add_face(vec![a, b, c], Attributes::new()).unwrap();
/// let graph = mutation.commit().unwrap();
///
/// assert_eq!(3, graph.edge_count());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Mutation {
    pub(in crate::graph) core: Core,
}

impl Mutation {
    pub fn vertex_count(&self) -> usize {
        self.core.as_storage_of::<Vertex>().len()
    }

    pub fn face_count(&self) -> usize {
        self.core.as_storage_of::<Face>().len()
    }

    /// Gets the edge that connects the given vertices, if any.
    pub fn edge_between(&self, a: VertexKey, b: VertexKey) -> Option<EdgeKey> {
        self.core.edge_by_span(a, b)
    }
}

impl From<MeshGraph> for Mutation {
    fn from(graph: MeshGraph) -> Self {
        Mutation {
            core: graph.into_core(),
        }
    }
}

impl Transact<MeshGraph> for Mutation {
    type Output = MeshGraph;
    type Error = GraphError;

    /// Wires face and radial rings and validates the graph.
    ///
    /// Radial rings are rebuilt for every edge, ordering corners by key.
    ///
    /// # Errors
    ///
    /// Returns an error if a face is missing corners or the resulting
    /// topology is inconsistent.
    fn commit(self) -> Result<Self::Output, Self::Error> {
        let Mutation { mut core } = self;
        trace!(
            "committing mutation with {} faces",
            core.as_storage_of::<Face>().len()
        );
        topology::connect(&mut core)?;
        MeshGraph::from_core(core)
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::data::Attributes;
    use crate::graph::{EdgePolicy, GraphError, MeshGraph, Mutation};
    use crate::transact::Transact;

    fn triangle(mutation: &mut Mutation) -> [crate::graph::VertexKey; 3] {
        let a = mutation.add_vertex([0.0, 0.0, 0.0], Attributes::new()).unwrap();
        let b = mutation.add_vertex([1.0, 0.0, 0.0], Attributes::new()).unwrap();
        let c = mutation.add_vertex([0.0, 1.0, 0.0], Attributes::new()).unwrap();
        [a, b, c]
    }

    #[test]
    fn add_edge_rejects_duplicates() {
        let mut mutation = Mutation::default();
        let [a, b, _] = triangle(&mut mutation);
        let ab = mutation
            .add_edge((a, b), Attributes::new(), EdgePolicy::Reject)
            .unwrap();

        assert_eq!(
            Err(GraphError::DuplicateEdge),
            mutation.add_edge((b, a), Attributes::new(), EdgePolicy::Reject)
        );
        assert_eq!(
            Ok(ab),
            mutation.add_edge((b, a), Attributes::new(), EdgePolicy::Reuse)
        );
        assert_eq!(
            Err(GraphError::DegenerateEdge),
            mutation.add_edge((a, a), Attributes::new(), EdgePolicy::Reuse)
        );
    }

    #[test]
    fn add_face_reuses_edges() {
        let mut mutation = Mutation::default();
        let [a, b, c] = triangle(&mut mutation);
        let d = mutation.add_vertex([1.0, 1.0, 0.0], Attributes::new()).unwrap();
        let ab = mutation
            .add_edge((a, b), Attributes::new(), EdgePolicy::Reject)
            .unwrap();
        mutation.add_face(vec![a, b, c], Attributes::new()).unwrap();
        mutation.add_face(vec![b, d, c], Attributes::new()).unwrap();
        let graph = mutation.commit().unwrap();

        assert_eq!(5, graph.edge_count());
        assert_eq!(Some(ab), graph.edge_between(b, a).map(|edge| edge.key()));
        assert!(graph.edge_between(b, c).unwrap().is_manifold());
        assert_eq!(2, graph.edge_between(b, c).unwrap().face_keys().len());
    }

    #[test]
    fn add_face_with_corners() {
        let mut mutation = Mutation::default();
        let [a, b, c] = triangle(&mut mutation);
        let face = mutation
            .add_face_boundary(vec![a, b, c], Attributes::new())
            .unwrap();
        let ab = mutation.edge_between(a, b).unwrap();
        let bc = mutation.edge_between(b, c).unwrap();
        let ca = mutation.edge_between(c, a).unwrap();

        assert_eq!(
            Err(GraphError::TopologyConflict),
            mutation.add_loop(b, bc, face, Attributes::new())
        );
        mutation.add_loop(a, ab, face, Attributes::new()).unwrap();
        mutation.add_loop(b, bc, face, Attributes::new()).unwrap();
        mutation.add_loop(c, ca, face, Attributes::new()).unwrap();
        assert_eq!(
            Err(GraphError::TopologyConflict),
            mutation.add_loop(a, ab, face, Attributes::new())
        );
        let graph = mutation.commit().unwrap();

        let face = graph.face(face).unwrap();
        assert_eq!(
            vec![a, b, c],
            face.loops()
                .map(|corner| corner.vertex().key())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn commit_rejects_incomplete_faces() {
        let mut mutation = Mutation::default();
        let [a, b, c] = triangle(&mut mutation);
        let face = mutation
            .add_face_boundary(vec![a, b, c], Attributes::new())
            .unwrap();
        let ab = mutation.edge_between(a, b).unwrap();
        mutation.add_loop(a, ab, face, Attributes::new()).unwrap();

        assert_eq!(Err(GraphError::TopologyMalformed), mutation.commit());
    }

    #[test]
    fn mutate_existing_graph() {
        let mut mutation = Mutation::default();
        let [a, b, c] = triangle(&mut mutation);
        mutation.add_face(vec![a, b, c], Attributes::new()).unwrap();
        let graph = mutation.commit().unwrap();

        let mut mutation = graph.mutate();
        let d = mutation.add_vertex([1.0, 1.0, 0.0], Attributes::new()).unwrap();
        mutation.add_face(vec![c, b, d], Attributes::new()).unwrap();
        let graph: MeshGraph = mutation.commit().unwrap();

        assert_eq!(2, graph.face_count());
        assert_eq!(2, graph.edge_between(b, c).unwrap().loops().count());
        graph.validate().unwrap();
    }
}
