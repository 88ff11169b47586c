//! Terrain density synthesis: landform blending, fractal noise, domain warp
//! and border tapering, plus the worldgen config they read.
#![forbid(unsafe_code)]

pub mod error;
pub mod landform;
pub mod region;
pub mod voxel;
pub mod worldgen;

pub use error::WorldGenError;
pub use landform::{LandformVariant, WeightedIndex};
pub use region::{IntDataMap2D, RegionNoiseMaps};
pub use voxel::{CHUNK_AREA, CHUNK_SIZE, ChunkCoord, ChunkTerrainMetrics, TerrainScratch, World};
pub use worldgen::{WorldDims, WorldGenParams};
