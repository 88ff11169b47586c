//! Coarse per-region maps (climate, ocean, upheaval, landform) and the
//! coordinate frames that map chunk columns onto them.

use std::sync::Arc;

use fastnoise_lite::FastNoiseLite;

use crate::error::WorldGenError;
use crate::voxel::generation::noise::{fractal2, simplex};
use crate::voxel::generation::WeightedLandformMap;
use crate::voxel::{CHUNK_SIZE, ChunkCoord};
use crate::worldgen::{Fractal, WorldGenParams};

pub const TEMPERATURE_SHIFT: u32 = 16;
pub const RAINFALL_SHIFT: u32 = 8;

/// Square `i32` grid with padding on both sides of the inner area.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntDataMap2D {
    data: Vec<i32>,
    inner_size: usize,
    top_left_padding: usize,
    bottom_right_padding: usize,
}

impl IntDataMap2D {
    pub fn new(
        inner_size: usize,
        top_left_padding: usize,
        bottom_right_padding: usize,
        data: Vec<i32>,
    ) -> Result<Self, WorldGenError> {
        let full = inner_size + top_left_padding + bottom_right_padding;
        if inner_size == 0 || data.len() != full * full {
            return Err(WorldGenError::InvalidParameter {
                name: "region map",
                reason: "data length must equal the padded size squared",
            });
        }
        Ok(Self {
            data,
            inner_size,
            top_left_padding,
            bottom_right_padding,
        })
    }

    pub fn from_fn(
        inner_size: usize,
        top_left_padding: usize,
        bottom_right_padding: usize,
        mut f: impl FnMut(usize, usize) -> i32,
    ) -> Self {
        let full = inner_size + top_left_padding + bottom_right_padding;
        let mut data = Vec::with_capacity(full * full);
        for z in 0..full {
            for x in 0..full {
                data.push(f(x, z));
            }
        }
        Self {
            data,
            inner_size,
            top_left_padding,
            bottom_right_padding,
        }
    }

    pub fn filled(inner_size: usize, padding: usize, value: i32) -> Self {
        Self::from_fn(inner_size, padding, padding, |_, _| value)
    }

    #[inline]
    pub fn inner_size(&self) -> usize {
        self.inner_size
    }

    #[inline]
    pub fn top_left_padding(&self) -> usize {
        self.top_left_padding
    }

    #[inline]
    pub fn bottom_right_padding(&self) -> usize {
        self.bottom_right_padding
    }

    #[inline]
    pub fn full_size(&self) -> usize {
        self.inner_size + self.top_left_padding + self.bottom_right_padding
    }

    /// Clamped cell lookup in padded coordinates.
    #[inline]
    pub fn get(&self, x: isize, z: isize) -> i32 {
        let last = self.full_size() as isize - 1;
        let x = x.clamp(0, last) as usize;
        let z = z.clamp(0, last) as usize;
        self.data[z * self.full_size() + x]
    }

    pub fn lerped_value(&self, x: f32, z: f32) -> f32 {
        self.bilerp(x, z, |v| v as f32)
    }

    /// Bilinear interpolation of one packed byte channel.
    pub fn lerped_channel(&self, x: f32, z: f32, shift: u32) -> f32 {
        self.bilerp(x, z, |v| ((v >> shift) & 0xFF) as f32)
    }

    fn bilerp(&self, x: f32, z: f32, channel: impl Fn(i32) -> f32) -> f32 {
        let fx = x - 0.5;
        let fz = z - 0.5;
        let x0 = fx.floor();
        let z0 = fz.floor();
        let tx = fx - x0;
        let tz = fz - z0;
        let (x0, z0) = (x0 as isize, z0 as isize);
        let a = channel(self.get(x0, z0));
        let b = channel(self.get(x0 + 1, z0));
        let c = channel(self.get(x0, z0 + 1));
        let d = channel(self.get(x0 + 1, z0 + 1));
        let top = a + (b - a) * tx;
        let bottom = c + (d - c) * tx;
        top + (bottom - top) * tz
    }
}

/// Affine map from a chunk-local column index to fractional map coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapFrame {
    pub origin_x: f32,
    pub origin_z: f32,
    pub step: f32,
}

impl MapFrame {
    #[inline]
    pub fn at(&self, lx: f32, lz: f32) -> (f32, f32) {
        (self.origin_x + lx * self.step, self.origin_z + lz * self.step)
    }
}

/// One [`MapFrame`] per region map, for a single chunk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkFrame {
    pub climate: MapFrame,
    pub ocean: MapFrame,
    pub upheaval: MapFrame,
    pub landform: MapFrame,
}

/// Coarse maps covering a square of `chunks_per_side` chunks starting at `origin`.
#[derive(Clone, Debug)]
pub struct RegionNoiseMaps {
    pub origin: ChunkCoord,
    pub chunks_per_side: usize,
    pub climate: IntDataMap2D,
    pub ocean: IntDataMap2D,
    pub upheaval: IntDataMap2D,
    pub landform: IntDataMap2D,
    pub landform_weights: Arc<WeightedLandformMap>,
    min_temperature: f32,
    max_temperature: f32,
}

impl RegionNoiseMaps {
    pub fn new(
        origin: ChunkCoord,
        chunks_per_side: usize,
        climate: IntDataMap2D,
        ocean: IntDataMap2D,
        upheaval: IntDataMap2D,
        landform: IntDataMap2D,
        params: &WorldGenParams,
    ) -> Result<Self, WorldGenError> {
        if chunks_per_side == 0 {
            return Err(WorldGenError::InvalidParameter {
                name: "region.chunks_per_side",
                reason: "must be at least 1",
            });
        }
        if params.landforms.is_empty() {
            return Err(WorldGenError::EmptyLandforms);
        }
        let landform_weights = Arc::new(WeightedLandformMap::new(
            &landform,
            params.landform_blur_radius,
            params.landforms.len(),
        ));
        Ok(Self {
            origin,
            chunks_per_side,
            climate,
            ocean,
            upheaval,
            landform,
            landform_weights,
            min_temperature: params.min_temperature,
            max_temperature: params.max_temperature,
        })
    }

    /// Fills every map from low-frequency simplex fields. Stand-in for a full
    /// region pipeline; enough to drive the terrain synthesizer.
    pub fn from_noise(
        seed: i32,
        origin: ChunkCoord,
        chunks_per_side: usize,
        params: &WorldGenParams,
    ) -> Result<Self, WorldGenError> {
        let coarse = chunks_per_side.max(1);
        let landform_inner = coarse * 2;
        let landform_pad = params.landform_blur_radius + 1;
        let field = Fractal {
            octaves: 3,
            persistence: 0.5,
            lacunarity: 2.0,
            scale: 6.0,
        };
        let block_x = origin.cx as f32 * CHUNK_SIZE as f32;
        let block_z = origin.cz as f32 * CHUNK_SIZE as f32;
        let temperature_n = simplex(seed ^ 0x0C11_4A7E, 1.0);
        let rainfall_n = simplex(seed ^ 0x0004_A1F0, 1.0);
        let ocean_n = simplex(seed ^ 0x0CEA_0001, 1.0);
        let upheaval_n = simplex(seed ^ 0x0B0A_57ED, 1.0);
        let landform_n = simplex(seed ^ 0x1A4D_F0E1, 1.0);
        // Samples in cell units so `field.scale` is measured in cells.
        let sample = |noise: &FastNoiseLite, cell_blocks: f32, pad: usize, x: usize, z: usize| {
            let wx = block_x / cell_blocks + x as f32 - pad as f32 + 0.5;
            let wz = block_z / cell_blocks + z as f32 - pad as f32 + 0.5;
            (fractal2(noise, wx, wz, &field) * 0.5 + 0.5).clamp(0.0, 1.0)
        };
        let chunk = CHUNK_SIZE as f32;
        let climate = IntDataMap2D::from_fn(coarse, 1, 1, |x, z| {
            let t = (sample(&temperature_n, chunk, 1, x, z) * 255.0) as i32;
            let r = (sample(&rainfall_n, chunk, 1, x, z) * 255.0) as i32;
            (t << TEMPERATURE_SHIFT) | (r << RAINFALL_SHIFT)
        });
        let ocean = IntDataMap2D::from_fn(coarse, 1, 1, |x, z| {
            let v = sample(&ocean_n, chunk, 1, x, z);
            (((v - 0.55) / 0.45).clamp(0.0, 1.0) * 255.0) as i32
        });
        let upheaval = IntDataMap2D::from_fn(coarse, 1, 1, |x, z| {
            (sample(&upheaval_n, chunk, 1, x, z) * 255.0) as i32
        });
        let variants = params.landforms.len().max(1);
        let landform = IntDataMap2D::from_fn(landform_inner, landform_pad, landform_pad, |x, z| {
            let v = sample(&landform_n, chunk * 0.5, landform_pad, x, z);
            ((v * variants as f32) as usize).min(variants - 1) as i32
        });
        Self::new(
            origin,
            chunks_per_side,
            climate,
            ocean,
            upheaval,
            landform,
            params,
        )
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        let dx = coord.cx - self.origin.cx;
        let dz = coord.cz - self.origin.cz;
        let n = self.chunks_per_side as i32;
        (0..n).contains(&dx) && (0..n).contains(&dz)
    }

    fn frame_for(&self, map: &IntDataMap2D, coord: ChunkCoord) -> MapFrame {
        let span = (self.chunks_per_side * CHUNK_SIZE) as f32;
        let step = map.inner_size() as f32 / span;
        let pad = map.top_left_padding() as f32;
        let bx = ((coord.cx - self.origin.cx) as f32) * CHUNK_SIZE as f32;
        let bz = ((coord.cz - self.origin.cz) as f32) * CHUNK_SIZE as f32;
        MapFrame {
            origin_x: pad + bx * step,
            origin_z: pad + bz * step,
            step,
        }
    }

    pub fn chunk_frame(&self, coord: ChunkCoord) -> ChunkFrame {
        ChunkFrame {
            climate: self.frame_for(&self.climate, coord),
            ocean: self.frame_for(&self.ocean, coord),
            upheaval: self.frame_for(&self.upheaval, coord),
            landform: self.frame_for(&self.landform, coord),
        }
    }

    /// 0 (land) ..= 1 (open ocean)
    pub fn oceanicity(&self, frame: &MapFrame, lx: f32, lz: f32) -> f32 {
        let (x, z) = frame.at(lx, lz);
        (self.ocean.lerped_value(x, z) / 255.0).clamp(0.0, 1.0)
    }

    pub fn upheaval(&self, frame: &MapFrame, lx: f32, lz: f32) -> f32 {
        let (x, z) = frame.at(lx, lz);
        (self.upheaval.lerped_value(x, z) / 255.0).clamp(0.0, 1.0)
    }

    pub fn temperature_celsius(&self, frame: &MapFrame, lx: f32, lz: f32) -> f32 {
        let (x, z) = frame.at(lx, lz);
        let t = self.climate.lerped_channel(x, z, TEMPERATURE_SHIFT) / 255.0;
        self.min_temperature + t * (self.max_temperature - self.min_temperature)
    }

    pub fn landform_weights(&self, frame: &MapFrame, lx: f32, lz: f32, out: &mut [f32]) {
        let (x, z) = frame.at(lx, lz);
        self.landform_weights.weights_at(x, z, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worldgen::WorldDims;

    #[test]
    fn bilerp_between_cell_centers() {
        let map = IntDataMap2D::from_fn(2, 0, 0, |x, _| if x == 0 { 0 } else { 100 });
        assert_eq!(map.lerped_value(0.5, 0.5), 0.0);
        assert_eq!(map.lerped_value(1.5, 0.5), 100.0);
        assert!((map.lerped_value(1.0, 1.0) - 50.0).abs() < 1e-4);
        // Outside the grid the edge cells repeat.
        assert_eq!(map.lerped_value(-10.0, 0.5), 0.0);
        assert_eq!(map.lerped_value(40.0, 0.5), 100.0);
    }

    #[test]
    fn packed_channels_are_independent() {
        let packed = (200 << TEMPERATURE_SHIFT) | (40 << RAINFALL_SHIFT);
        let map = IntDataMap2D::filled(4, 1, packed);
        assert_eq!(map.lerped_channel(2.0, 2.0, TEMPERATURE_SHIFT), 200.0);
        assert_eq!(map.lerped_channel(2.0, 2.0, RAINFALL_SHIFT), 40.0);
    }

    #[test]
    fn new_rejects_wrong_length() {
        assert!(IntDataMap2D::new(4, 1, 1, vec![0; 16]).is_err());
        assert!(IntDataMap2D::new(4, 1, 1, vec![0; 36]).is_ok());
    }

    #[test]
    fn frames_tile_across_chunks() {
        let params = WorldGenParams::default_for(WorldDims::new(128, 128, 128, 60)).unwrap();
        let maps = RegionNoiseMaps::from_noise(5, ChunkCoord::new(0, 0), 4, &params).unwrap();
        let a = maps.chunk_frame(ChunkCoord::new(1, 2));
        let b = maps.chunk_frame(ChunkCoord::new(2, 2));
        let end_of_a = a.landform.at(CHUNK_SIZE as f32, 0.0);
        let start_of_b = b.landform.at(0.0, 0.0);
        assert!((end_of_a.0 - start_of_b.0).abs() < 1e-4);
        assert_eq!(end_of_a.1, start_of_b.1);
        assert!(maps.contains(ChunkCoord::new(3, 3)));
        assert!(!maps.contains(ChunkCoord::new(4, 0)));
    }

    #[test]
    fn temperature_spans_configured_range() {
        let params = WorldGenParams::default_for(WorldDims::new(64, 128, 64, 60)).unwrap();
        let hot = IntDataMap2D::filled(2, 1, 255 << TEMPERATURE_SHIFT);
        let flat = IntDataMap2D::filled(2, 1, 0);
        let maps = RegionNoiseMaps::new(
            ChunkCoord::new(0, 0),
            2,
            hot,
            flat.clone(),
            flat.clone(),
            flat,
            &params,
        )
        .unwrap();
        let frame = maps.chunk_frame(ChunkCoord::new(0, 0));
        let t = maps.temperature_celsius(&frame.climate, 3.0, 3.0);
        assert!((t - params.max_temperature).abs() < 1e-4);
        assert_eq!(maps.oceanicity(&frame.ocean, 3.0, 3.0), 0.0);
    }
}
