pub const CHUNK_SIZE: usize = 32;
pub const CHUNK_AREA: usize = CHUNK_SIZE * CHUNK_SIZE;

mod chunk_coord;
mod gen_ctx;
pub mod generation;
mod world;

pub use chunk_coord::ChunkCoord;
pub use gen_ctx::{ChunkTerrainMetrics, TerrainScratch};
pub use world::World;
