//! Chunk terrain generation driver: border taper, parallel column
//! evaluation, materialization and neighbor height bookkeeping.
#![forbid(unsafe_code)]

mod column_cache;
mod evaluator;
mod gen_ctx_pool;

use std::sync::Arc;
use std::time::Instant;

use lithos_chunk::{ChunkColumnData, ChunkMaterializer, HeightMaps};
use lithos_world::voxel::generation::{
    BorderTaper, ColumnContext, NoiseFieldSynthesizer, build_chunk_terrain_plan,
};
use lithos_world::{CHUNK_AREA, ChunkCoord, ChunkTerrainMetrics, RegionNoiseMaps, World};
use rayon::ThreadPoolBuildError;

pub use crate::column_cache::{TerrainHeightStore, TerrainHeightStoreStats};
pub use crate::evaluator::{ColumnEvaluator, worker_count};
pub use crate::gen_ctx_pool::{PooledScratch, ScratchPool};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Taper towards already generated neighbors.
    pub smoothing: bool,
    /// Evaluate columns on the calling thread.
    pub serial: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            smoothing: true,
            serial: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GeneratedChunk {
    pub coord: ChunkCoord,
    pub data: ChunkColumnData,
    pub heights: HeightMaps,
    pub max_y: usize,
    pub metrics: ChunkTerrainMetrics,
}

pub struct TerrainGenerator {
    world: Arc<World>,
    evaluator: ColumnEvaluator,
    materializer: ChunkMaterializer,
    heights: Arc<TerrainHeightStore>,
}

impl TerrainGenerator {
    pub fn new(world: Arc<World>) -> Result<Self, ThreadPoolBuildError> {
        let evaluator = ColumnEvaluator::new(&world)?;
        Ok(Self::with_evaluator(world, evaluator))
    }

    pub fn with_evaluator(world: Arc<World>, evaluator: ColumnEvaluator) -> Self {
        let materializer = ChunkMaterializer::new(&world.params);
        let heights = Arc::new(TerrainHeightStore::new(world.params.height_store_capacity));
        Self {
            world,
            evaluator,
            materializer,
            heights,
        }
    }

    #[inline]
    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    #[inline]
    pub fn evaluator(&self) -> &ColumnEvaluator {
        &self.evaluator
    }

    pub fn height_store(&self) -> Arc<TerrainHeightStore> {
        Arc::clone(&self.heights)
    }

    /// Taper, evaluate, materialize, then record the terrain heights so later
    /// neighbors can taper towards this chunk.
    pub fn generate_chunk(
        &self,
        coord: ChunkCoord,
        maps: &RegionNoiseMaps,
        options: GenerateOptions,
    ) -> GeneratedChunk {
        let world = &*self.world;
        let taper = if options.smoothing {
            let neighbors = self.heights.neighbors_of(coord);
            BorderTaper::compute(&neighbors, world.params.taper_width)
        } else {
            None
        };
        let tapered = taper.is_some();
        let plan = build_chunk_terrain_plan(world, maps, coord, taper);
        let synth = NoiseFieldSynthesizer::new(world, maps, &plan);

        let mut columns = vec![ColumnContext::new(world.height()); CHUNK_AREA];
        let t0 = Instant::now();
        let flags = if options.serial {
            self.evaluator.evaluate_serial(&synth, &mut columns)
        } else {
            self.evaluator.evaluate(&synth, &mut columns)
        };
        let evaluate_us = elapsed_us(t0);

        let t1 = Instant::now();
        let out = self.materializer.materialize(coord, &columns, &flags);
        let materialize_us = elapsed_us(t1);

        let mut metrics = ChunkTerrainMetrics {
            evaluate_us,
            materialize_us,
            ..ChunkTerrainMetrics::default()
        };
        for column in &columns {
            metrics.record_column(&column.stats);
        }
        self.heights
            .insert(coord, Arc::from(out.heights.terrain.as_slice()));

        log::debug!(
            "chunk ({}, {}): eval {}us, materialize {}us, {} samples, {:.0}% shortcut, {} early exits, max y {}{}",
            coord.cx,
            coord.cz,
            metrics.evaluate_us,
            metrics.materialize_us,
            metrics.noise_samples,
            metrics.shortcut_ratio() * 100.0,
            metrics.early_exits,
            out.max_y,
            if tapered { ", tapered" } else { "" }
        );

        GeneratedChunk {
            coord,
            data: out.data,
            heights: out.heights,
            max_y: out.max_y,
            metrics,
        }
    }
}

fn elapsed_us(start: Instant) -> u32 {
    start.elapsed().as_micros().min(u128::from(u32::MAX)) as u32
}
