use std::sync::Arc;

use crate::error::WorldGenError;
use crate::worldgen::{WorldDims, WorldGenParams};

use super::generation::{DomainWarp, TerrainNoise};
use super::TerrainScratch;

/// Seeded, immutable terrain state shared by every worker.
pub struct World {
    pub seed: i32,
    pub params: Arc<WorldGenParams>,
    terrain: TerrainNoise,
    warp: DomainWarp,
}

impl World {
    pub fn new(seed: i32, params: WorldGenParams) -> Result<Self, WorldGenError> {
        params.dims.validate()?;
        if params.landforms.is_empty() {
            return Err(WorldGenError::EmptyLandforms);
        }
        let terrain = TerrainNoise::new(seed, &params);
        let warp = DomainWarp::new(seed, &params);
        log::info!(
            "world seed {}: {}x{}x{} blocks, sea level {}, {} landforms, {} octaves",
            seed,
            params.dims.size_x,
            params.dims.height,
            params.dims.size_z,
            params.dims.sea_level,
            params.landforms.len(),
            params.octaves
        );
        Ok(Self {
            seed,
            params: Arc::new(params),
            terrain,
            warp,
        })
    }

    #[inline]
    pub fn dims(&self) -> WorldDims {
        self.params.dims
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.params.dims.height
    }

    #[inline]
    pub fn sea_level(&self) -> usize {
        self.params.dims.sea_level
    }

    #[inline]
    pub fn terrain_noise(&self) -> &TerrainNoise {
        &self.terrain
    }

    #[inline]
    pub fn domain_warp(&self) -> &DomainWarp {
        &self.warp
    }

    pub fn make_scratch(&self) -> TerrainScratch {
        TerrainScratch::new(self.params.octaves, self.params.landforms.len())
    }
}
