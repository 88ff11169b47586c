use crate::landform::{LandformVariant, blend_octaves};
use crate::region::{ChunkFrame, MapFrame, RegionNoiseMaps};

use super::super::{CHUNK_SIZE, ChunkCoord, TerrainScratch, World};
use super::taper::BorderTaper;

/// Landform weights and blended octave tables at the four chunk corners.
/// Corner order: (0,0), (32,0), (0,32), (32,32); adjacent chunks share them.
#[derive(Clone, Debug)]
pub struct ChunkOctaveCorners {
    weights: [Vec<f32>; 4],
    amps: [Vec<f32>; 4],
    thrs: [Vec<f32>; 4],
}

const CORNERS: [(f32, f32); 4] = [
    (0.0, 0.0),
    (CHUNK_SIZE as f32, 0.0),
    (0.0, CHUNK_SIZE as f32),
    (CHUNK_SIZE as f32, CHUNK_SIZE as f32),
];

impl ChunkOctaveCorners {
    pub fn sample(
        maps: &RegionNoiseMaps,
        frame: &MapFrame,
        variants: &[LandformVariant],
        octaves: usize,
    ) -> Self {
        let mut weights: [Vec<f32>; 4] = Default::default();
        let mut amps: [Vec<f32>; 4] = Default::default();
        let mut thrs: [Vec<f32>; 4] = Default::default();
        for (i, &(lx, lz)) in CORNERS.iter().enumerate() {
            let mut w = vec![0.0; variants.len()];
            maps.landform_weights(frame, lx, lz, &mut w);
            let mut a = vec![0.0; octaves];
            let mut t = vec![0.0; octaves];
            blend_octaves(variants, &w, &mut a, &mut t);
            weights[i] = w;
            amps[i] = a;
            thrs[i] = t;
        }
        Self {
            weights,
            amps,
            thrs,
        }
    }

    #[inline]
    pub fn corner_weights(&self, corner: usize) -> &[f32] {
        &self.weights[corner]
    }

    /// Bilinear blend of the corner tables at local column `(lx, lz)`.
    pub fn column_octaves(&self, lx: usize, lz: usize, scratch: &mut TerrainScratch) {
        let tx = lx as f32 / CHUNK_SIZE as f32;
        let tz = lz as f32 / CHUNK_SIZE as f32;
        let cw = [
            (1.0 - tx) * (1.0 - tz),
            tx * (1.0 - tz),
            (1.0 - tx) * tz,
            tx * tz,
        ];
        bilerp_into(&self.weights, cw, &mut scratch.weights);
        bilerp_into(&self.amps, cw, &mut scratch.amps);
        bilerp_into(&self.thrs, cw, &mut scratch.thrs);
    }
}

fn bilerp_into(corners: &[Vec<f32>; 4], cw: [f32; 4], out: &mut [f32]) {
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = corners[0][i] * cw[0]
            + corners[1][i] * cw[1]
            + corners[2][i] * cw[2]
            + corners[3][i] * cw[3];
    }
}

/// Everything about a chunk that is shared by its 1024 columns.
#[derive(Clone, Debug)]
pub struct ChunkTerrainPlan {
    pub coord: ChunkCoord,
    pub base_x: i32,
    pub base_z: i32,
    pub frame: ChunkFrame,
    pub corners: ChunkOctaveCorners,
    pub taper: Option<BorderTaper>,
}

impl ChunkTerrainPlan {
    #[inline]
    pub fn world_column(&self, lx: usize, lz: usize) -> (f32, f32) {
        (
            (self.base_x + lx as i32) as f32,
            (self.base_z + lz as i32) as f32,
        )
    }
}

pub fn build_chunk_terrain_plan(
    world: &World,
    maps: &RegionNoiseMaps,
    coord: ChunkCoord,
    taper: Option<BorderTaper>,
) -> ChunkTerrainPlan {
    if !maps.contains(coord) {
        log::debug!(
            "chunk ({}, {}) lies outside region maps at ({}, {}); edge cells will repeat",
            coord.cx,
            coord.cz,
            maps.origin.cx,
            maps.origin.cz
        );
    }
    let params = &world.params;
    let frame = maps.chunk_frame(coord);
    let corners =
        ChunkOctaveCorners::sample(maps, &frame.landform, &params.landforms, params.octaves);
    let (base_x, base_z) = coord.base_block();
    ChunkTerrainPlan {
        coord,
        base_x,
        base_z,
        frame,
        corners,
        taper,
    }
}
