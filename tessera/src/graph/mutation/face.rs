use smallvec::SmallVec;

use crate::entity::storage::{AsStorageOf, Get, Insert, InsertWithKey, Key};
use crate::graph::corner::{Loop, LoopKey};
use crate::graph::data::Attributes;
use crate::graph::edge::{Edge, EdgeKey};
use crate::graph::face::{Face, FaceKey};
use crate::graph::mutation::{EdgePolicy, Mutation};
use crate::graph::vertex::VertexKey;
use crate::graph::{GraphError, OptionExt as _};
use crate::IteratorExt as _;

impl Mutation {
    /// Inserts a face and its corners.
    ///
    /// Edges between consecutive vertices (including the last and first
    /// vertices) are inserted if they do not already exist and are otherwise
    /// reused, so faces that share a boundary share edges.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than three vertices, consecutive
    /// vertices are the same, or any vertex does not exist.
    pub fn add_face<I>(&mut self, vertices: I, attributes: Attributes) -> Result<FaceKey, GraphError>
    where
        I: IntoIterator<Item = VertexKey>,
    {
        let face = self.add_face_boundary(vertices, attributes)?;
        let (vertices, edges) = {
            let face = self.core.as_storage_of::<Face>().get(&face).expect_consistent();
            (face.vertices.clone(), face.edges.clone())
        };
        for (vertex, edge) in vertices.into_iter().zip(edges) {
            self.insert_loop(vertex, edge, face, Attributes::new())?;
        }
        Ok(face)
    }

    /// Inserts a face and its edges, but no corners.
    ///
    /// Corners must be inserted in order with [`Mutation::add_loop`] before the
    /// mutation is committed.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Mutation::add_face`].
    pub fn add_face_boundary<I>(
        &mut self,
        vertices: I,
        attributes: Attributes,
    ) -> Result<FaceKey, GraphError>
    where
        I: IntoIterator<Item = VertexKey>,
    {
        let vertices = vertices.into_iter().collect::<SmallVec<[_; 4]>>();
        let arity = vertices.len();
        if arity < 3 {
            return Err(GraphError::DegenerateFace { arity });
        }
        if !vertices.iter().all(|vertex| self.contains_vertex(*vertex)) {
            return Err(GraphError::InvalidIndex);
        }
        if vertices.iter().perimeter().any(|(a, b)| a == b) {
            return Err(GraphError::DegenerateFace { arity });
        }
        let edges = vertices
            .iter()
            .copied()
            .perimeter()
            .map(|span| self.add_edge(span, Attributes::new(), EdgePolicy::Reuse))
            .collect::<Result<SmallVec<[_; 4]>, _>>()?;
        let face = self
            .core
            .as_storage_mut_of::<Face>()
            .insert(Face::new(vertices, edges.clone(), attributes))?;
        for edge in edges {
            self.core
                .as_storage_mut_of::<Edge>()
                .get_mut(&edge)
                .expect_consistent()
                .faces
                .push(face);
        }
        Ok(face)
    }

    /// Inserts the next corner of a face that was inserted with
    /// [`Mutation::add_face_boundary`].
    ///
    /// Corners must be inserted in the winding order of the face: the `i`th
    /// corner must refer to the `i`th vertex of the face and the edge from that
    /// vertex to the next.
    ///
    /// # Errors
    ///
    /// Returns an error if any entity does not exist or if the vertex and edge
    /// do not match the next corner of the face.
    pub fn add_loop(
        &mut self,
        vertex: VertexKey,
        edge: EdgeKey,
        face: FaceKey,
        attributes: Attributes,
    ) -> Result<LoopKey, GraphError> {
        if !self.contains_vertex(vertex) || !self.core.as_storage_of::<Edge>().contains_key(&edge) {
            return Err(GraphError::InvalidIndex);
        }
        let entity = self
            .core
            .as_storage_of::<Face>()
            .get(&face)
            .ok_or(GraphError::InvalidIndex)?;
        let index = entity.loops.len();
        if index >= entity.arity()
            || entity.vertices[index] != vertex
            || entity.edges[index] != edge
        {
            return Err(GraphError::TopologyConflict);
        }
        self.insert_loop(vertex, edge, face, attributes)
    }

    fn insert_loop(
        &mut self,
        vertex: VertexKey,
        edge: EdgeKey,
        face: FaceKey,
        attributes: Attributes,
    ) -> Result<LoopKey, GraphError> {
        let storage = self.core.as_storage_mut_of::<Loop>();
        let key = LoopKey::from_index(storage.high_water_mark());
        storage.insert_with_key(&key, Loop::detached(key, vertex, edge, face, attributes))?;
        self.core
            .as_storage_mut_of::<Face>()
            .get_mut(&face)
            .expect_consistent()
            .loops
            .push(key);
        Ok(key)
    }
}
