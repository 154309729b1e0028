//! Construction and validation of rings.

use ahash::{AHashMap, AHashSet};
use smallvec::SmallVec;

use crate::entity::storage::{AsStorageOf, Enumerate, Get};
use crate::graph::core::{canonical_span, Core};
use crate::graph::corner::{Loop, LoopKey};
use crate::graph::edge::{Edge, EdgeKey};
use crate::graph::face::{Face, FaceKey};
use crate::graph::trace::{Trace, TraceAny};
use crate::graph::vertex::Vertex;
use crate::graph::{GraphError, OptionExt as _};
use crate::IteratorExt as _;

/// Wires the face ring of every face and the radial ring of every edge.
pub fn connect(core: &mut Core) -> Result<(), GraphError> {
    let faces = core.as_storage_of::<Face>().keys().collect::<Vec<_>>();
    for face in faces {
        connect_face_ring(core, face)?;
    }
    connect_radial_rings(core)
}

/// Wires the `next` and `prev` keys of the corners of a face.
///
/// # Errors
///
/// Returns an error if the face does not exist or does not have a corner for
/// each of its vertices.
pub fn connect_face_ring(core: &mut Core, face: FaceKey) -> Result<(), GraphError> {
    let entity = core
        .as_storage_of::<Face>()
        .get(&face)
        .ok_or(GraphError::InvalidIndex)?;
    let n = entity.loops.len();
    if n < 2 || n != entity.arity() {
        return Err(GraphError::TopologyMalformed);
    }
    let loops = entity.loops.clone();
    let storage = core.as_storage_mut_of::<Loop>();
    for (i, key) in loops.iter().enumerate() {
        let corner = storage.get_mut(key).ok_or(GraphError::InvalidIndex)?;
        corner.next = loops[(i + 1) % n];
        corner.prev = loops[(i + n - 1) % n];
    }
    Ok(())
}

/// Wires the `radial_next` and `radial_prev` keys of every corner.
///
/// Corners are grouped by edge and each group is linked into a ring in
/// ascending key order, which is the order in which the corners were created.
/// A group of one corner forms a ring of one. Each corner is marked when it is
/// linked and is never linked again, regardless of the order in which edges are
/// encountered.
pub fn connect_radial_rings(core: &mut Core) -> Result<(), GraphError> {
    let mut rings: AHashMap<EdgeKey, SmallVec<[LoopKey; 2]>> = AHashMap::new();
    for (key, corner) in core.as_storage_of::<Loop>().iter() {
        rings.entry(corner.edge).or_default().push(key);
    }
    let keys = core.as_storage_of::<Loop>().keys().collect::<Vec<_>>();
    let mut visited = AHashSet::with_capacity(keys.len());
    let storage = core.as_storage_mut_of::<Loop>();
    for key in keys {
        if visited.contains(&key) {
            continue;
        }
        let edge = storage.get(&key).expect_consistent().edge;
        let ring = rings.get(&edge).expect_consistent();
        let n = ring.len();
        for (i, corner) in ring.iter().enumerate() {
            if !visited.insert(*corner) {
                return Err(GraphError::TopologyMalformed);
            }
            let entity = storage.get_mut(corner).expect_consistent();
            entity.radial_next = ring[(i + 1) % n];
            entity.radial_prev = ring[(i + n - 1) % n];
        }
    }
    Ok(())
}

/// Checks every topological invariant of a core.
///
/// This checks that:
///
/// - edges connect two distinct existing vertices that refer back to them,
///   and no two edges connect the same vertices;
/// - faces have at least three vertices and index-aligned vertex, edge, and
///   loop sequences, where each edge connects consecutive vertices and each
///   corner agrees with its position in the face ring;
/// - the faces recorded by each edge are exactly the faces that use it;
/// - every corner belongs to its face and every radial ring is closed, agrees
///   in both directions, and has one corner per face recorded by its edge.
///
/// # Errors
///
/// Returns an error describing the first violation found.
pub fn validate(core: &Core) -> Result<(), GraphError> {
    let vertices = core.as_storage_of::<Vertex>();
    let edges = core.as_storage_of::<Edge>();
    let loops = core.as_storage_of::<Loop>();
    let faces = core.as_storage_of::<Face>();

    let mut spans = AHashSet::with_capacity(edges.len());
    for (key, edge) in edges.iter() {
        let (a, b) = edge.vertices;
        if a == b {
            return Err(GraphError::DegenerateEdge);
        }
        for vertex in [a, b] {
            let entity = vertices.get(&vertex).ok_or(GraphError::InvalidIndex)?;
            if !entity.edges.contains(&key) {
                return Err(GraphError::TopologyMalformed);
            }
        }
        if !spans.insert(canonical_span(a, b)) {
            return Err(GraphError::DuplicateEdge);
        }
        if core.edge_by_span(a, b) != Some(key) {
            return Err(GraphError::TopologyMalformed);
        }
    }
    for (key, vertex) in vertices.iter() {
        for edge in vertex.edges.iter() {
            let entity = edges.get(edge).ok_or(GraphError::InvalidIndex)?;
            if !entity.has_vertex(key) {
                return Err(GraphError::TopologyMalformed);
            }
        }
    }

    let mut incidence: AHashMap<EdgeKey, SmallVec<[FaceKey; 2]>> = AHashMap::new();
    for (key, face) in faces.iter() {
        let arity = face.arity();
        if arity < 3 {
            return Err(GraphError::DegenerateFace { arity });
        }
        if face.edges.len() != arity || face.loops.len() != arity {
            return Err(GraphError::TopologyMalformed);
        }
        for (i, (a, b)) in face.vertices.iter().copied().perimeter().enumerate() {
            if !vertices.contains_key(&a) {
                return Err(GraphError::InvalidIndex);
            }
            let edge = face.edges[i];
            if !edges.get(&edge).ok_or(GraphError::InvalidIndex)?.connects(a, b) {
                return Err(GraphError::TopologyMalformed);
            }
            incidence.entry(edge).or_default().push(key);
            let corner = loops.get(&face.loops[i]).ok_or(GraphError::InvalidIndex)?;
            if corner.vertex != a || corner.edge != edge || corner.face != key {
                return Err(GraphError::TopologyMalformed);
            }
            if corner.next != face.loops[(i + 1) % arity]
                || corner.prev != face.loops[(i + arity - 1) % arity]
            {
                return Err(GraphError::TopologyMalformed);
            }
        }
    }
    for (key, edge) in edges.iter() {
        let mut expected = incidence.remove(&key).unwrap_or_default();
        let mut actual = edge.faces.clone();
        expected.sort_unstable();
        actual.sort_unstable();
        if expected != actual {
            return Err(GraphError::TopologyMalformed);
        }
    }

    let mut visited = AHashSet::with_capacity(loops.len());
    for (key, corner) in loops.iter() {
        let face = faces.get(&corner.face).ok_or(GraphError::InvalidIndex)?;
        if !face.loops.contains(&key) {
            return Err(GraphError::TopologyMalformed);
        }
        if visited.contains(&key) {
            continue;
        }
        let edge = edges.get(&corner.edge).ok_or(GraphError::InvalidIndex)?;
        let mut trace = TraceAny::default();
        let mut current = key;
        let mut count = 0usize;
        while trace.insert(current) {
            let entity = loops.get(&current).ok_or(GraphError::InvalidIndex)?;
            if entity.edge != corner.edge {
                return Err(GraphError::TopologyMalformed);
            }
            let next = loops
                .get(&entity.radial_next)
                .ok_or(GraphError::InvalidIndex)?;
            if next.radial_prev != current {
                return Err(GraphError::TopologyMalformed);
            }
            visited.insert(current);
            count += 1;
            current = entity.radial_next;
        }
        if current != key || count != edge.faces.len() {
            return Err(GraphError::TopologyMalformed);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::entity::storage::{AsStorageOf, Enumerate, Get, Key};
    use crate::graph::core::Core;
    use crate::graph::corner::{Loop, LoopKey};
    use crate::graph::data::Attributes;
    use crate::graph::topology;
    use crate::graph::{GraphError, MeshGraph, Mutation};

    fn fan() -> Core {
        // Three triangles sharing the edge (0, 1).
        let mut mutation = Mutation::default();
        let vertices = (0..5)
            .map(|_| mutation.add_vertex([0.0; 3], Attributes::new()).unwrap())
            .collect::<Vec<_>>();
        for apex in 2..5 {
            mutation
                .add_face(
                    vec![vertices[0], vertices[1], vertices[apex]],
                    Attributes::new(),
                )
                .unwrap();
        }
        let mut core = mutation.core;
        topology::connect(&mut core).unwrap();
        core
    }

    #[test]
    fn face_ring_closure() {
        let core = fan();
        let loops = core.as_storage_of::<Loop>();
        for key in loops.keys() {
            let mut current = key;
            for _ in 0..3 {
                current = loops.get(&current).unwrap().next;
            }
            assert_eq!(key, current);
            for _ in 0..3 {
                current = loops.get(&current).unwrap().prev;
            }
            assert_eq!(key, current);
        }
    }

    #[test]
    fn radial_ring_closure() {
        let core = fan();
        let loops = core.as_storage_of::<Loop>();
        // The first corner of each face leaves along the shared edge.
        let shared = [0, 3, 6].map(LoopKey::from_index);
        for key in shared {
            let mut current = key;
            for _ in 0..3 {
                current = loops.get(&current).unwrap().radial_next;
                assert!(shared.contains(&current));
            }
            assert_eq!(key, current);
        }
        assert_eq!(
            LoopKey::from_index(3),
            loops.get(&LoopKey::from_index(0)).unwrap().radial_next
        );
        // Boundary corners form rings of one.
        let key = LoopKey::from_index(1);
        assert_eq!(key, loops.get(&key).unwrap().radial_next);
        assert_eq!(key, loops.get(&key).unwrap().radial_prev);
        topology::validate(&core).unwrap();
    }

    #[test]
    fn validate_detects_broken_radial_ring() {
        let mut core = fan();
        core.as_storage_mut_of::<Loop>()
            .get_mut(&LoopKey::from_index(0))
            .unwrap()
            .radial_next = LoopKey::from_index(0);

        assert_eq!(Err(GraphError::TopologyMalformed), topology::validate(&core));
        assert!(MeshGraph::from_core(core).is_err());
    }

    #[test]
    fn validate_detects_broken_face_ring() {
        let mut core = fan();
        core.as_storage_mut_of::<Loop>()
            .get_mut(&LoopKey::from_index(0))
            .unwrap()
            .next = LoopKey::from_index(2);

        assert_eq!(Err(GraphError::TopologyMalformed), topology::validate(&core));
    }
}
