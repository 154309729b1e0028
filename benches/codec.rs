use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use tessera::buffer::MeshBuffer;
use tessera::encoding::binary::{self, EncodedMesh};
use tessera::encoding::fan;
use tessera::graph::MeshGraph;
use tessera::prelude::*;

const RESOLUTION: u32 = 64;

fn grid() -> MeshGraph {
    // Create a graph from a grid of quads in the XY plane.
    let width = RESOLUTION + 1;
    let indices = (0..RESOLUTION)
        .flat_map(|y| {
            (0..RESOLUTION).map(move |x| {
                let i = (y * width) + x;
                vec![i, i + 1, i + width + 1, i + width]
            })
        })
        .collect::<Vec<_>>();
    let positions = (0..(width * width))
        .map(|i| [(i % width) as f32, (i / width) as f32, 0.0])
        .collect::<Vec<_>>();
    MeshGraph::from_raw_buffers(indices, positions).unwrap()
}

fn fan_buffer() -> MeshBuffer {
    grid().to_triangle_fan().unwrap()
}

fn binary_buffer() -> EncodedMesh {
    grid().to_buffer().unwrap()
}

fn benchmark(criterion: &mut Criterion) {
    criterion.bench_function("fan-encode", move |bencher| {
        bencher.iter_batched(grid, |graph| fan::encode(&graph), BatchSize::LargeInput)
    });
    criterion.bench_function("fan-decode", move |bencher| {
        bencher.iter_batched(
            fan_buffer,
            |buffer| fan::decode(&buffer),
            BatchSize::LargeInput,
        )
    });
    criterion.bench_function("binary-encode", move |bencher| {
        bencher.iter_batched(
            grid,
            |graph| binary::encode_buffer(&graph),
            BatchSize::LargeInput,
        )
    });
    criterion.bench_function("binary-decode", move |bencher| {
        bencher.iter_batched(
            binary_buffer,
            |encoded| binary::decode_buffer(encoded.as_bytes(), encoded.layout()),
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
