use crate::entity::storage::{AsStorageOf, Get, Insert};
use crate::graph::data::Attributes;
use crate::graph::edge::{Edge, EdgeKey};
use crate::graph::mutation::Mutation;
use crate::graph::vertex::{Vertex, VertexKey};
use crate::graph::{GraphError, OptionExt as _};

/// Behavior of edge insertion when an edge already connects the given
/// vertices.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EdgePolicy {
    /// Fail with [`GraphError::DuplicateEdge`].
    Reject,
    /// Return the existing edge. Its attributes are left unchanged.
    Reuse,
}

impl Default for EdgePolicy {
    fn default() -> Self {
        EdgePolicy::Reject
    }
}

impl Mutation {
    /// Inserts an edge between two vertices.
    ///
    /// The order of the vertices is not significant for identity: an edge
    /// `(b, a)` is the same edge as `(a, b)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertices are the same, either vertex does not
    /// exist, or an edge already connects the vertices and the policy is
    /// [`EdgePolicy::Reject`].
    pub fn add_edge(
        &mut self,
        (a, b): (VertexKey, VertexKey),
        attributes: Attributes,
        policy: EdgePolicy,
    ) -> Result<EdgeKey, GraphError> {
        if a == b {
            return Err(GraphError::DegenerateEdge);
        }
        if !(self.contains_vertex(a) && self.contains_vertex(b)) {
            return Err(GraphError::InvalidIndex);
        }
        if let Some(key) = self.core.edge_by_span(a, b) {
            return match policy {
                EdgePolicy::Reject => Err(GraphError::DuplicateEdge),
                EdgePolicy::Reuse => Ok(key),
            };
        }
        let key = self
            .core
            .as_storage_mut_of::<Edge>()
            .insert(Edge::new((a, b), attributes))?;
        self.core.insert_span((a, b), key);
        for vertex in [a, b] {
            self.core
                .as_storage_mut_of::<Vertex>()
                .get_mut(&vertex)
                .expect_consistent()
                .edges
                .insert(key);
        }
        Ok(key)
    }
}
