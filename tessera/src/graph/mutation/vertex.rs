use crate::entity::storage::{AsStorageOf, Get, Insert};
use crate::geometry::Position;
use crate::graph::data::Attributes;
use crate::graph::mutation::Mutation;
use crate::graph::vertex::{Vertex, VertexKey};
use crate::graph::GraphError;

impl Mutation {
    /// Inserts a vertex with no incident edges.
    ///
    /// # Errors
    ///
    /// Returns an error if vertex keys have been exhausted.
    pub fn add_vertex(
        &mut self,
        position: Position,
        attributes: Attributes,
    ) -> Result<VertexKey, GraphError> {
        self.core
            .as_storage_mut_of::<Vertex>()
            .insert(Vertex::new(position, attributes))
            .map_err(From::from)
    }

    pub(in crate::graph) fn contains_vertex(&self, key: VertexKey) -> bool {
        self.core.as_storage_of::<Vertex>().contains_key(&key)
    }
}
