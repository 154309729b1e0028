//! Property tests of the triangle fan and binary buffer encodings.
//!
//! Run with: cargo test -p tessera --test codec

use proptest::prelude::*;
use tessera::encoding::binary::{self, BufferLayout, BufferView};
use tessera::encoding::fan::{AnchorPolicy, FanEncoder, FromTriangleFan, ToTriangleFan};
use tessera::entity::storage::Key;
use tessera::graph::MeshGraph;
use tessera::prelude::*;

/// Generates a polygon of arity three to six over `n` vertices.
///
/// Consecutive vertices (including the last and first) always differ, but a
/// polygon may visit the same vertex more than once.
fn arb_polygon(n: u32) -> impl Strategy<Value = Vec<u32>> {
    (3..=6usize)
        .prop_flat_map(move |arity| (0..n, prop::collection::vec(1..n, arity - 1)))
        .prop_map(move |(first, steps)| {
            let mut polygon = vec![first];
            for step in steps {
                let previous = *polygon.last().unwrap();
                polygon.push((previous + step) % n);
            }
            polygon
        })
        .prop_filter("polygon must not close on itself", |polygon| {
            polygon.first() != polygon.last()
        })
}

/// Generates a polygon soup of up to twelve polygons over three to twelve
/// vertices.
fn arb_soup() -> impl Strategy<Value = (Vec<Vec<u32>>, Vec<[f32; 3]>)> {
    (3..=12u32).prop_flat_map(|n| {
        (
            prop::collection::vec(arb_polygon(n), 1..=12),
            prop::collection::vec(prop::array::uniform3(any::<f32>()), n as usize),
        )
    })
}

/// Gets the lexicographically least rotation of a polygon.
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
    let mut faces = graph
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
        .collect::<Vec<_>>();
    faces.sort();
    faces
}

proptest! {
    /// Decoding a fan recovers every face of the encoded graph.
    #[test]
    fn fan_round_trip((polygons, positions) in arb_soup()) {
        let graph = MeshGraph::from_raw_buffers(polygons, positions);
        prop_assume!(graph.is_ok());
        let graph = graph.unwrap();
        let buffer = graph.to_triangle_fan().unwrap();
        let decoded = MeshGraph::from_triangle_fan(&buffer).unwrap();

        prop_assert_eq!(faces(&graph), faces(&decoded));
        prop_assert_eq!(graph.edge_count(), decoded.edge_count());
        prop_assert!(decoded.validate().is_ok());
        let reencoded = decoded
            .to_triangle_fan_with(FanEncoder::new(AnchorPolicy::Leading))
            .unwrap();
        prop_assert_eq!(buffer, reencoded);
    }
}

proptest! {
    /// Decoding a buffer yields a structurally identical graph.
    #[test]
    fn binary_round_trip((polygons, positions) in arb_soup()) {
        let graph = MeshGraph::from_raw_buffers(polygons, positions);
        prop_assume!(graph.is_ok());
        let graph = graph.unwrap();
        let encoded = binary::encode_buffer(&graph).unwrap();
        let (data, layout) = encoded.into_parts();

        prop_assert_eq!(graph, binary::decode_buffer(&data, &layout).unwrap());
    }
}

proptest! {
    /// Decoding arbitrarily corrupted buffers and layouts never panics, and
    /// any graph that is decoded anyway is consistent.
    #[test]
    fn binary_decode_never_panics(
        (polygons, positions) in arb_soup(),
        bytes in prop::collection::vec((any::<usize>(), any::<u8>()), 0..8),
        views in prop::collection::vec((any::<usize>(), any::<u16>(), any::<u16>()), 0..2),
    ) {
        let graph = MeshGraph::from_raw_buffers(polygons, positions);
        prop_assume!(graph.is_ok());
        let (mut data, layout) = binary::encode_buffer(&graph.unwrap())
            .unwrap()
            .into_parts();
        for (index, byte) in bytes {
            let n = data.len();
            data[index % n] = byte;
        }
        let mut fields = layout
            .iter()
            .map(|(field, view)| (field.clone(), *view))
            .collect::<Vec<_>>();
        for (index, offset, length) in views {
            let n = fields.len();
            fields[index % n].1 = BufferView::new(offset as usize, length as usize);
        }
        let mut layout = BufferLayout::new();
        for (field, view) in fields {
            layout.insert(field, view);
        }

        if let Ok(decoded) = binary::decode_buffer(&data, &layout) {
            prop_assert!(decoded.validate().is_ok());
        }
    }
}
