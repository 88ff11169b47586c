use std::sync::Arc;
use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use lithos_runtime::{ColumnEvaluator, GenerateOptions, TerrainGenerator};
use lithos_world::voxel::generation::{
    ColumnContext, NoiseFieldSynthesizer, build_chunk_terrain_plan,
};
use lithos_world::{ChunkCoord, RegionNoiseMaps, World, WorldDims, WorldGenParams};

const SEED: i32 = 0xC0FFEE;

fn setup(height: usize) -> (Arc<World>, RegionNoiseMaps) {
    let params = WorldGenParams::default_for(WorldDims::new(256, height, 256, height * 3 / 8))
        .expect("default params");
    let maps = RegionNoiseMaps::from_noise(SEED, ChunkCoord::new(0, 0), 8, &params)
        .expect("region maps");
    (Arc::new(World::new(SEED, params).expect("world")), maps)
}

fn bench_generate_chunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_chunk");
    group.measurement_time(Duration::from_secs(8));
    let (world, maps) = setup(256);
    let generator = TerrainGenerator::new(Arc::clone(&world)).expect("generator");
    for (name, serial) in [("parallel_32x256x32", false), ("serial_32x256x32", true)] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let out = generator.generate_chunk(
                    ChunkCoord::new(3, 3),
                    &maps,
                    GenerateOptions {
                        smoothing: false,
                        serial,
                    },
                );
                black_box(out.max_y);
            })
        });
    }
    group.finish();
}

fn bench_tapered_chunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_chunk_tapered");
    let (world, maps) = setup(256);
    let generator = TerrainGenerator::new(Arc::clone(&world)).expect("generator");
    for (dx, dz) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
        generator.generate_chunk(ChunkCoord::new(4 + dx, 4 + dz), &maps, GenerateOptions::default());
    }
    group.bench_function("four_neighbors_32x256x32", |b| {
        b.iter(|| {
            let out = generator.generate_chunk(ChunkCoord::new(4, 4), &maps, GenerateOptions::default());
            black_box(out.max_y);
        })
    });
    group.finish();
}

fn bench_single_column(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_column");
    let (world, maps) = setup(512);
    let evaluator = ColumnEvaluator::with_workers(&world, 1).expect("evaluator");
    let plan = build_chunk_terrain_plan(&world, &maps, ChunkCoord::new(2, 5), None);
    let synth = NoiseFieldSynthesizer::new(&world, &maps, &plan);
    let mut out = ColumnContext::new(world.height());
    group.bench_function("column_512", |b| {
        b.iter(|| {
            let mut scratch = evaluator.scratch_pool().acquire();
            synth.evaluate_column(black_box(17), black_box(9), &mut scratch, &mut out);
            black_box(out.solid.top_solid());
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_generate_chunk,
    bench_tapered_chunk,
    bench_single_column
);
criterion_main!(benches);
