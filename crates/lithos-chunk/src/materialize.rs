use lithos_world::voxel::generation::{ColumnContext, LayerFlags, WaterKind};
use lithos_world::worldgen::Blocks;
use lithos_world::{CHUNK_AREA, CHUNK_SIZE, ChunkCoord, WorldGenParams};

use crate::{ChunkColumnData, HeightMaps};

#[derive(Clone, Debug)]
pub struct MaterializedChunk {
    pub data: ChunkColumnData,
    pub heights: HeightMaps,
    /// Highest Y holding a solid or fluid block anywhere in the chunk.
    pub max_y: usize,
}

/// Turns evaluated solidity columns into block and fluid arrays.
#[derive(Clone, Copy, Debug)]
pub struct ChunkMaterializer {
    blocks: Blocks,
    height: usize,
    sea_level: usize,
}

impl ChunkMaterializer {
    pub fn new(params: &WorldGenParams) -> Self {
        Self {
            blocks: params.blocks,
            height: params.dims.height,
            sea_level: params.dims.sea_level,
        }
    }

    /// `columns` is indexed `lz * 32 + lx` and must hold one entry per column.
    pub fn materialize(
        &self,
        coord: ChunkCoord,
        columns: &[ColumnContext],
        flags: &LayerFlags,
    ) -> MaterializedChunk {
        debug_assert_eq!(columns.len(), CHUNK_AREA);
        let mut data = ChunkColumnData::new(coord, self.height);
        let mut heights = HeightMaps::new();

        data.fill_layer(0, self.blocks.mantle);
        let solid_run = flags.solid_run_from(1).min(self.height.saturating_sub(2));
        for y in 1..=solid_run {
            data.fill_layer(y, self.blocks.rock);
        }
        let walk_from = solid_run + 1;
        log::trace!(
            "chunk ({}, {}): bulk-filled {} solid layers",
            coord.cx,
            coord.cz,
            solid_run
        );

        let sea = self.sea_level;
        let highest_solid = columns
            .iter()
            .filter_map(|c| c.solid.top_solid())
            .max()
            .unwrap_or(0);
        let top = highest_solid.max(sea - 1);

        let mut max_y = 0usize;
        for lz in 0..CHUNK_SIZE {
            for lx in 0..CHUNK_SIZE {
                let column = &columns[lz * CHUNK_SIZE + lx];
                let (fluid, ice) = self.water_ids(column.water);
                for y in walk_from..=top {
                    if y >= sea && flags.is_fully_empty(y) {
                        continue;
                    }
                    if column.solid.get(y) {
                        data.set_block(lx, y, lz, self.blocks.rock);
                    } else if y < sea {
                        match ice {
                            Some(ice) if y == sea - 1 => data.set_block(lx, y, lz, ice),
                            _ => data.set_fluid(lx, y, lz, fluid),
                        }
                    }
                }
                let top_solid = column.solid.top_solid().unwrap_or(0);
                let rain = top_solid.max(sea - 1);
                let i = lz * CHUNK_SIZE + lx;
                heights.terrain[i] = top_solid as u16;
                heights.rain[i] = rain as u16;
                max_y = max_y.max(rain);
            }
        }

        MaterializedChunk {
            data,
            heights,
            max_y,
        }
    }

    fn water_ids(&self, kind: WaterKind) -> (u16, Option<u16>) {
        let fluid = if kind.is_salt() {
            self.blocks.salt_water
        } else {
            self.blocks.water
        };
        let ice = matches!(kind, WaterKind::Ice { .. }).then_some(self.blocks.ice);
        (fluid, ice)
    }
}
