//! Binary buffer encoding.
//!
//! This encoding serializes every entity of a graph into little-endian
//! sub-buffers of a single byte buffer. Each sub-buffer is located by a field
//! name in a [`BufferLayout`], which is typically stored in the metadata of an
//! asset container. Unlike the triangle fan encoding, this encoding is lossless:
//! decoding an encoded graph yields a graph that is structurally identical,
//! including the radial rings of non-manifold edges.
//!
//! Keys are written as their rank in key order and decoded graphs allocate keys
//! densely from zero.
//!
//! | Field                    | Contents                                       |
//! |--------------------------|------------------------------------------------|
//! | `vertices`               | `count`, then `count` positions                |
//! | `edges`                  | `count`, then `count` vertex pairs             |
//! | `loops`                  | `count`, then `count` corners and their rings  |
//! | `faces`                  | `count`, then `count + 1` corner offsets       |
//! | `faces.vertices`         | vertices of each face                          |
//! | `faces.edges`            | edges of each face                             |
//! | `faces.loops`            | loops of each face                             |
//! | `faces.normals`          | `count` normals                                |
//! | `faces.normals.sparse`   | `count`, then `count` face and normal pairs    |
//! | `<kind>.attributes.<NAME>` | `count`, `arity`, then `count` records       |
//!
//! The face sequences are sliced by consecutive entries of the offset table.
//! Normals are written densely if every face has a normal and sparsely if only
//! some faces do. Attribute records are an element index followed by `arity`
//! components. All fields other than the first four are optional, except that
//! the face sequences are required if any face has corners.
//!
//! # Examples
//!
//! ```rust
//! use tessera::encoding::binary::{FromBuffer, ToBuffer};
//! use tessera::graph::MeshGraph;
//! use tessera::prelude::*;
//!
//! let graph = MeshGraph::from_raw_buffers(
//!     vec![vec![0u32, 1, 2, 3]],
//!     vec![
//!         [0.0, 0.0, 0.0],
//!         [1.0, 0.0, 0.0],
//!         [1.0, 1.0, 0.0],
//!         [0.0, 1.0, 0.0],
//!     ],
//! )
//! .unwrap();
//! let encoded = graph.to_buffer().unwrap();
//! let decoded = MeshGraph::from_buffer(encoded.as_bytes(), encoded.layout()).unwrap();
//!
//! assert_eq!(graph, decoded);
//! ```

mod layout;

use ahash::AHashMap;
use log::debug;
use smallvec::SmallVec;
use std::collections::BTreeMap;

use crate::encoding::binary::layout::{truncated, Reader, Writer};
use crate::encoding::EncodingError;
use crate::entity::storage::{
    AsStorageMut, AsStorageOf, Enumerate, Get, InsertWithKey, Key, OrderedStorage,
};
use crate::entity::Entity;
use crate::graph::data::{Attribute, Attributes};
use crate::graph::{
    Core, Edge, EdgeKey, Face, FaceKey, GraphError, Loop, LoopKey, MeshGraph, Vertex, VertexKey,
};

pub use crate::encoding::binary::layout::{BufferLayout, BufferView};

/// Field names of an encoded mesh.
pub mod field {
    pub const VERTICES: &str = "vertices";
    pub const EDGES: &str = "edges";
    pub const LOOPS: &str = "loops";
    pub const FACES: &str = "faces";
    pub const FACE_VERTICES: &str = "faces.vertices";
    pub const FACE_EDGES: &str = "faces.edges";
    pub const FACE_LOOPS: &str = "faces.loops";
    pub const FACE_NORMALS: &str = "faces.normals";
    pub const FACE_NORMALS_SPARSE: &str = "faces.normals.sparse";

    /// Gets the field name of an attribute of the given entity kind (such as
    /// `VERTICES`).
    pub fn attribute(kind: &str, name: &str) -> String {
        format!("{}.attributes.{}", kind, name)
    }
}

const POSITION_WIDTH: usize = 12;
const EDGE_WIDTH: usize = 8;
const LOOP_WIDTH: usize = 28;
const INDEX_WIDTH: usize = 4;

/// Byte buffer and layout of an encoded graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EncodedMesh {
    data: Vec<u8>,
    layout: BufferLayout,
}

impl EncodedMesh {
    pub fn new(data: Vec<u8>, layout: BufferLayout) -> Self {
        EncodedMesh { data, layout }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn layout(&self) -> &BufferLayout {
        &self.layout
    }

    pub fn into_parts(self) -> (Vec<u8>, BufferLayout) {
        let EncodedMesh { data, layout } = self;
        (data, layout)
    }

    pub fn decode(&self) -> Result<MeshGraph, EncodingError> {
        decode_buffer(&self.data, &self.layout)
    }
}

pub trait ToBuffer {
    fn to_buffer(&self) -> Result<EncodedMesh, EncodingError>;
}

pub trait FromBuffer: Sized {
    fn from_buffer(data: &[u8], layout: &BufferLayout) -> Result<Self, EncodingError>;
}

impl ToBuffer for MeshGraph {
    fn to_buffer(&self) -> Result<EncodedMesh, EncodingError> {
        encode_buffer(self)
    }
}

impl FromBuffer for MeshGraph {
    fn from_buffer(data: &[u8], layout: &BufferLayout) -> Result<Self, EncodingError> {
        decode_buffer(data, layout)
    }
}

/// Dense ranks of the keys of an entity.
struct Ranks<K>
where
    K: Key,
{
    inner: AHashMap<K, u32>,
}

impl<K> Ranks<K>
where
    K: Key,
{
    fn from_storage<E>(storage: &OrderedStorage<E>) -> Result<Self, EncodingError>
    where
        E: Entity<Key = K>,
    {
        let inner = storage
            .keys()
            .enumerate()
            .map(|(rank, key)| count(rank).map(|rank| (key, rank)))
            .collect::<Result<AHashMap<_, _>, _>>()?;
        Ok(Ranks { inner })
    }

    fn get(&self, key: K) -> u32 {
        *self
            .inner
            .get(&key)
            .expect("internal error: graph consistency violated")
    }
}

fn count(n: usize) -> Result<u32, EncodingError> {
    u32::try_from(n).map_err(|_| GraphError::IndexOverflow.into())
}

/// Encodes a graph into a byte buffer and layout.
///
/// # Errors
///
/// Returns an error if attributes with the same name have different arities
/// within the same kind of entity.
pub fn encode_buffer(graph: &MeshGraph) -> Result<EncodedMesh, EncodingError> {
    let vertices = graph.as_storage_of::<Vertex>();
    let edges = graph.as_storage_of::<Edge>();
    let loops = graph.as_storage_of::<Loop>();
    let faces = graph.as_storage_of::<Face>();
    let vertex_ranks = Ranks::from_storage(vertices)?;
    let edge_ranks = Ranks::from_storage(edges)?;
    let loop_ranks = Ranks::from_storage(loops)?;
    let face_ranks = Ranks::from_storage(faces)?;

    let mut writer = Writer::default();
    writer.write_u32(count(vertices.len())?);
    for vertex in vertices.values() {
        writer.write_f32s(&vertex.position);
    }
    writer.finish_field(field::VERTICES);

    writer.write_u32(count(edges.len())?);
    for edge in edges.values() {
        let (a, b) = edge.vertices;
        writer.write_u32(vertex_ranks.get(a));
        writer.write_u32(vertex_ranks.get(b));
    }
    writer.finish_field(field::EDGES);

    writer.write_u32(count(loops.len())?);
    for corner in loops.values() {
        writer.write_u32(vertex_ranks.get(corner.vertex));
        writer.write_u32(edge_ranks.get(corner.edge));
        writer.write_u32(face_ranks.get(corner.face));
        for key in [corner.next, corner.prev, corner.radial_next, corner.radial_prev] {
            writer.write_u32(loop_ranks.get(key));
        }
    }
    writer.finish_field(field::LOOPS);

    writer.write_u32(count(faces.len())?);
    let mut offset = 0usize;
    writer.write_u32(0);
    for face in faces.values() {
        offset += face.arity();
        writer.write_u32(count(offset)?);
    }
    writer.finish_field(field::FACES);
    if offset > 0 {
        for face in faces.values() {
            for key in face.vertices.iter() {
                writer.write_u32(vertex_ranks.get(*key));
            }
        }
        writer.finish_field(field::FACE_VERTICES);
        for face in faces.values() {
            for key in face.edges.iter() {
                writer.write_u32(edge_ranks.get(*key));
            }
        }
        writer.finish_field(field::FACE_EDGES);
        for face in faces.values() {
            for key in face.loops.iter() {
                writer.write_u32(loop_ranks.get(*key));
            }
        }
        writer.finish_field(field::FACE_LOOPS);
    }

    let normals = faces
        .iter()
        .filter_map(|(key, face)| face.normal.map(|normal| (face_ranks.get(key), normal)))
        .collect::<Vec<_>>();
    if !normals.is_empty() {
        if normals.len() == faces.len() {
            for (_, normal) in normals.iter() {
                writer.write_f32s(normal);
            }
            writer.finish_field(field::FACE_NORMALS);
        }
        else {
            writer.write_u32(count(normals.len())?);
            for (rank, normal) in normals.iter() {
                writer.write_u32(*rank);
                writer.write_f32s(normal);
            }
            writer.finish_field(field::FACE_NORMALS_SPARSE);
        }
    }

    write_attributes(
        &mut writer,
        field::VERTICES,
        vertices
            .iter()
            .map(|(key, vertex)| (vertex_ranks.get(key), &vertex.attributes)),
    )?;
    write_attributes(
        &mut writer,
        field::EDGES,
        edges
            .iter()
            .map(|(key, edge)| (edge_ranks.get(key), &edge.attributes)),
    )?;
    write_attributes(
        &mut writer,
        field::LOOPS,
        loops
            .iter()
            .map(|(key, corner)| (loop_ranks.get(key), &corner.attributes)),
    )?;
    write_attributes(
        &mut writer,
        field::FACES,
        faces
            .iter()
            .map(|(key, face)| (face_ranks.get(key), &face.attributes)),
    )?;

    let (data, layout) = writer.into_parts();
    debug!(
        "encoded {} vertices, {} edges, {} loops, and {} faces into {} bytes",
        vertices.len(),
        edges.len(),
        loops.len(),
        faces.len(),
        data.len(),
    );
    Ok(EncodedMesh { data, layout })
}

fn write_attributes<'a, I>(writer: &mut Writer, kind: &str, elements: I) -> Result<(), EncodingError>
where
    I: IntoIterator<Item = (u32, &'a Attributes)>,
{
    let mut columns: BTreeMap<&'a str, Vec<(u32, &'a Attribute)>> = BTreeMap::new();
    for (rank, attributes) in elements {
        for (name, attribute) in attributes.iter() {
            columns
                .entry(name.as_str())
                .or_default()
                .push((rank, attribute));
        }
    }
    for (name, records) in columns {
        let field = field::attribute(kind, name);
        let arity = records
            .first()
            .map(|(_, attribute)| attribute.arity())
            .unwrap_or(0);
        if records
            .iter()
            .any(|(_, attribute)| attribute.arity() != arity)
        {
            return Err(EncodingError::AttributeConflict { field });
        }
        writer.write_u32(count(records.len())?);
        writer.write_u32(count(arity)?);
        for (rank, attribute) in records {
            writer.write_u32(rank);
            writer.write_f32s(attribute.as_slice());
        }
        writer.finish_field(field);
    }
    Ok(())
}

/// Decodes a graph from a byte buffer and layout.
///
/// # Errors
///
/// Returns an error if a field is missing or truncated, a face has fewer than
/// three corners, a key is out of bounds, or the decoded topology is
/// inconsistent (for example, if a radial ring is not closed).
pub fn decode_buffer(data: &[u8], layout: &BufferLayout) -> Result<MeshGraph, EncodingError> {
    let mut vertex_reader = Reader::new(field::VERTICES, layout.require(data, field::VERTICES)?);
    let mut edge_reader = Reader::new(field::EDGES, layout.require(data, field::EDGES)?);
    let mut loop_reader = Reader::new(field::LOOPS, layout.require(data, field::LOOPS)?);
    let mut face_reader = Reader::new(field::FACES, layout.require(data, field::FACES)?);
    let vertex_count = vertex_reader.read_count(POSITION_WIDTH)?;
    let edge_count = edge_reader.read_count(EDGE_WIDTH)?;
    let loop_count = loop_reader.read_count(LOOP_WIDTH)?;
    let face_count = face_reader.read_count(INDEX_WIDTH)?;

    let mut core = Core::default();
    for index in 0..vertex_count {
        let position = vertex_reader.read_xyz()?;
        insert(
            &mut core,
            VertexKey::from_index(index as u32),
            Vertex::new(position, Attributes::new()),
        )?;
    }
    for index in 0..edge_count {
        let key = EdgeKey::from_index(index as u32);
        let a = read_key::<VertexKey>(&mut edge_reader, vertex_count)?;
        let b = read_key::<VertexKey>(&mut edge_reader, vertex_count)?;
        insert(&mut core, key, Edge::new((a, b), Attributes::new()))?;
        for vertex in [a, b] {
            core.as_storage_mut_of::<Vertex>()
                .get_mut(&vertex)
                .ok_or(EncodingError::InvalidIndex)?
                .edges
                .insert(key);
        }
    }
    for index in 0..loop_count {
        let key = LoopKey::from_index(index as u32);
        let vertex = read_key(&mut loop_reader, vertex_count)?;
        let edge = read_key(&mut loop_reader, edge_count)?;
        let face = read_key(&mut loop_reader, face_count)?;
        let mut corner = Loop::detached(key, vertex, edge, face, Attributes::new());
        corner.next = read_key(&mut loop_reader, loop_count)?;
        corner.prev = read_key(&mut loop_reader, loop_count)?;
        corner.radial_next = read_key(&mut loop_reader, loop_count)?;
        corner.radial_prev = read_key(&mut loop_reader, loop_count)?;
        insert(&mut core, key, corner)?;
    }

    let mut offsets = Vec::with_capacity(face_count + 1);
    for _ in 0..=face_count {
        offsets.push(face_reader.read_u32()? as usize);
    }
    if offsets.first() != Some(&0) {
        return Err(GraphError::TopologyMalformed.into());
    }
    for window in offsets.windows(2) {
        let arity = window[1]
            .checked_sub(window[0])
            .ok_or(GraphError::TopologyMalformed)?;
        if arity < 3 {
            return Err(GraphError::DegenerateFace { arity }.into());
        }
    }
    let total = offsets.last().copied().unwrap_or(0);
    let face_vertices = read_sequence::<VertexKey>(data, layout, field::FACE_VERTICES, total, vertex_count)?;
    let face_edges = read_sequence::<EdgeKey>(data, layout, field::FACE_EDGES, total, edge_count)?;
    let face_loops = read_sequence::<LoopKey>(data, layout, field::FACE_LOOPS, total, loop_count)?;
    for (index, window) in offsets.windows(2).enumerate() {
        let key = FaceKey::from_index(index as u32);
        let range = window[0]..window[1];
        let mut face = Face::new(
            SmallVec::from_slice(&face_vertices[range.clone()]),
            SmallVec::from_slice(&face_edges[range.clone()]),
            Attributes::new(),
        );
        face.loops = SmallVec::from_slice(&face_loops[range.clone()]);
        for edge in face_edges[range].iter() {
            core.as_storage_mut_of::<Edge>()
                .get_mut(edge)
                .ok_or(EncodingError::InvalidIndex)?
                .faces
                .push(key);
        }
        insert(&mut core, key, face)?;
    }

    read_normals(&mut core, data, layout, face_count)?;
    read_attributes(data, layout, field::VERTICES, |index, name, attribute| {
        attributes_mut::<Vertex>(&mut core, index).map(|attributes| {
            attributes.insert(name, attribute);
        })
    })?;
    read_attributes(data, layout, field::EDGES, |index, name, attribute| {
        attributes_mut::<Edge>(&mut core, index).map(|attributes| {
            attributes.insert(name, attribute);
        })
    })?;
    read_attributes(data, layout, field::LOOPS, |index, name, attribute| {
        attributes_mut::<Loop>(&mut core, index).map(|attributes| {
            attributes.insert(name, attribute);
        })
    })?;
    read_attributes(data, layout, field::FACES, |index, name, attribute| {
        attributes_mut::<Face>(&mut core, index).map(|attributes| {
            attributes.insert(name, attribute);
        })
    })?;

    let graph = MeshGraph::from_core(core)?;
    debug!(
        "decoded {} vertices, {} edges, {} loops, and {} faces from {} bytes",
        graph.vertex_count(),
        graph.edge_count(),
        graph.loop_count(),
        graph.face_count(),
        data.len(),
    );
    Ok(graph)
}

fn insert<E>(core: &mut Core, key: E::Key, entity: E) -> Result<(), EncodingError>
where
    E: Entity,
    Core: AsStorageMut<E>,
{
    core.as_storage_mut_of::<E>()
        .insert_with_key(&key, entity)
        .map_err(GraphError::from)?;
    Ok(())
}

fn read_key<K>(reader: &mut Reader<'_>, count: usize) -> Result<K, EncodingError>
where
    K: Key,
{
    let index = reader.read_u32()?;
    if (index as usize) < count {
        Ok(K::from_index(index))
    }
    else {
        Err(EncodingError::InvalidIndex)
    }
}

fn read_sequence<K>(
    data: &[u8],
    layout: &BufferLayout,
    name: &str,
    total: usize,
    count: usize,
) -> Result<Vec<K>, EncodingError>
where
    K: Key,
{
    let bytes = if total > 0 {
        layout.require(data, name)?
    }
    else {
        layout.slice(data, name)?.unwrap_or(&[])
    };
    let mut reader = Reader::new(name, bytes);
    reader.require(total.checked_mul(INDEX_WIDTH).unwrap_or(usize::MAX))?;
    (0..total).map(|_| read_key(&mut reader, count)).collect()
}

fn read_normals(
    core: &mut Core,
    data: &[u8],
    layout: &BufferLayout,
    face_count: usize,
) -> Result<(), EncodingError> {
    if let Some(bytes) = layout.slice(data, field::FACE_NORMALS)? {
        let length = face_count.checked_mul(POSITION_WIDTH).unwrap_or(usize::MAX);
        if bytes.len() < length {
            return Err(truncated(field::FACE_NORMALS, length, bytes.len()));
        }
        let mut reader = Reader::new(field::FACE_NORMALS, bytes);
        for face in core.as_storage_mut_of::<Face>().values_mut() {
            face.normal = Some(reader.read_xyz()?);
        }
    }
    if let Some(bytes) = layout.slice(data, field::FACE_NORMALS_SPARSE)? {
        let mut reader = Reader::new(field::FACE_NORMALS_SPARSE, bytes);
        let n = reader.read_count(INDEX_WIDTH + POSITION_WIDTH)?;
        for _ in 0..n {
            let key = read_key::<FaceKey>(&mut reader, face_count)?;
            let normal = reader.read_xyz()?;
            core.as_storage_mut_of::<Face>()
                .get_mut(&key)
                .ok_or(EncodingError::InvalidIndex)?
                .normal = Some(normal);
        }
    }
    Ok(())
}

fn read_attributes<F>(
    data: &[u8],
    layout: &BufferLayout,
    kind: &str,
    mut f: F,
) -> Result<(), EncodingError>
where
    F: FnMut(u32, String, Attribute) -> Result<(), EncodingError>,
{
    let prefix = field::attribute(kind, "");
    for (field, _) in layout.fields_with_prefix(&prefix) {
        let name = &field[prefix.len()..];
        let bytes = layout.slice(data, field)?.unwrap_or(&[]);
        let mut reader = Reader::new(field, bytes);
        let n = reader.read_u32()? as usize;
        let arity = reader.read_u32()? as usize;
        if !(1..=4).contains(&arity) {
            return Err(EncodingError::AttributeConflict {
                field: field.to_owned(),
            });
        }
        reader.require(
            n.checked_mul(INDEX_WIDTH * (1 + arity))
                .unwrap_or(usize::MAX),
        )?;
        for _ in 0..n {
            let index = reader.read_u32()?;
            let mut components = SmallVec::<[f32; 4]>::new();
            for _ in 0..arity {
                components.push(reader.read_f32()?);
            }
            let attribute = Attribute::from_slice(&components).ok_or_else(|| {
                EncodingError::AttributeConflict {
                    field: field.to_owned(),
                }
            })?;
            f(index, name.to_owned(), attribute)?;
        }
    }
    Ok(())
}

trait HasAttributes: Entity {
    fn attributes_mut(&mut self) -> &mut Attributes;
}

impl HasAttributes for Vertex {
    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

impl HasAttributes for Edge {
    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

impl HasAttributes for Loop {
    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

impl HasAttributes for Face {
    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

fn attributes_mut<E>(core: &mut Core, index: u32) -> Result<&mut Attributes, EncodingError>
where
    E: HasAttributes,
    Core: AsStorageMut<E>,
{
    core.as_storage_mut_of::<E>()
        .get_mut(&E::Key::from_index(index))
        .map(HasAttributes::attributes_mut)
        .ok_or(EncodingError::InvalidIndex)
}
