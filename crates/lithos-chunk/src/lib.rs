//! Chunk column storage and the single-threaded terrain materializer.
#![forbid(unsafe_code)]

mod materialize;

pub use materialize::{ChunkMaterializer, MaterializedChunk};

use lithos_world::{CHUNK_AREA, CHUNK_SIZE, ChunkCoord};

pub const AIR: u16 = 0;
pub const SUB_CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

/// One 32^3 cube of a column: solid blocks and the fluid layer side by side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubChunk {
    pub blocks: Vec<u16>,
    pub fluids: Vec<u16>,
}

impl SubChunk {
    pub fn empty() -> Self {
        Self {
            blocks: vec![AIR; SUB_CHUNK_VOLUME],
            fluids: vec![AIR; SUB_CHUNK_VOLUME],
        }
    }

    #[inline]
    pub fn is_all_air(&self) -> bool {
        self.blocks.iter().all(|b| *b == AIR) && self.fluids.iter().all(|f| *f == AIR)
    }
}

/// Full-height column of sub-chunks for one chunk coordinate.
#[derive(Clone, Debug)]
pub struct ChunkColumnData {
    pub coord: ChunkCoord,
    pub height: usize,
    pub sub_chunks: Vec<SubChunk>,
}

impl ChunkColumnData {
    pub fn new(coord: ChunkCoord, height: usize) -> Self {
        let count = height.div_ceil(CHUNK_SIZE);
        Self {
            coord,
            height,
            sub_chunks: (0..count).map(|_| SubChunk::empty()).collect(),
        }
    }

    /// Index inside a sub-chunk; `y` is the absolute block Y.
    #[inline]
    pub fn idx(x: usize, y: usize, z: usize) -> usize {
        ((y % CHUNK_SIZE) * CHUNK_SIZE + z) * CHUNK_SIZE + x
    }

    #[inline]
    pub fn block(&self, x: usize, y: usize, z: usize) -> u16 {
        self.sub_chunks[y / CHUNK_SIZE].blocks[Self::idx(x, y, z)]
    }

    #[inline]
    pub fn fluid(&self, x: usize, y: usize, z: usize) -> u16 {
        self.sub_chunks[y / CHUNK_SIZE].fluids[Self::idx(x, y, z)]
    }

    #[inline]
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, id: u16) {
        self.sub_chunks[y / CHUNK_SIZE].blocks[Self::idx(x, y, z)] = id;
    }

    #[inline]
    pub fn set_fluid(&mut self, x: usize, y: usize, z: usize, id: u16) {
        self.sub_chunks[y / CHUNK_SIZE].fluids[Self::idx(x, y, z)] = id;
    }

    /// Writes `id` to every block of layer `y`.
    pub fn fill_layer(&mut self, y: usize, id: u16) {
        let start = Self::idx(0, y, 0);
        self.sub_chunks[y / CHUNK_SIZE].blocks[start..start + CHUNK_AREA].fill(id);
    }

    #[inline]
    pub fn contains_world(&self, wx: i32, wy: i32, wz: i32) -> bool {
        let (base_x, base_z) = self.coord.base_block();
        wy >= 0
            && (wy as usize) < self.height
            && wx >= base_x
            && wx < base_x + CHUNK_SIZE as i32
            && wz >= base_z
            && wz < base_z + CHUNK_SIZE as i32
    }

    #[inline]
    pub fn block_world(&self, wx: i32, wy: i32, wz: i32) -> Option<u16> {
        if !self.contains_world(wx, wy, wz) {
            return None;
        }
        let (base_x, base_z) = self.coord.base_block();
        Some(self.block(
            (wx - base_x) as usize,
            wy as usize,
            (wz - base_z) as usize,
        ))
    }

    pub fn has_non_air(&self) -> bool {
        self.sub_chunks.iter().any(|s| !s.is_all_air())
    }
}

/// Per-column heights, indexed `lz * 32 + lx`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeightMaps {
    /// Highest solid block.
    pub terrain: Vec<u16>,
    /// Highest solid or fluid block.
    pub rain: Vec<u16>,
}

impl HeightMaps {
    pub fn new() -> Self {
        Self {
            terrain: vec![0; CHUNK_AREA],
            rain: vec![0; CHUNK_AREA],
        }
    }

    #[inline]
    pub fn terrain_at(&self, lx: usize, lz: usize) -> u16 {
        self.terrain[lz * CHUNK_SIZE + lx]
    }

    #[inline]
    pub fn rain_at(&self, lx: usize, lz: usize) -> u16 {
        self.rain[lz * CHUNK_SIZE + lx]
    }
}

impl Default for HeightMaps {
    fn default() -> Self {
        Self::new()
    }
}
